//! Placement of new land claims.
//!
//! The first claim lands on the configured default location. Every later
//! claim is placed on the ring just outside the buffered region of the
//! least-connected existing claim (the reference claim). When that ring has
//! no legal tile, the buffer is widened by one and the next ring out is
//! tried, up to a configured number of expansions.

use plotcoin_types::{ClaimId, GridCoord};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::error::WorldError;
use crate::footprint::ClaimFootprint;
use crate::region::BoundingRegion;
use crate::spatial::SpatialIndex;

/// Where a new claim goes and which claim it borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Starting coordinate of the new claim.
    pub coord: GridCoord,
    /// The claim it was placed next to; `None` for the first claim.
    pub reference: Option<ClaimId>,
}

/// Chooses starting coordinates for new claims.
#[derive(Debug, Clone, Copy)]
pub struct PlotAllocator {
    default_location: GridCoord,
    proximity: u32,
    max_ring_expansions: u32,
}

impl PlotAllocator {
    /// Create an allocator.
    ///
    /// `proximity` is both the buffer kept around every claim and the
    /// distance of the first ring searched. `max_ring_expansions` caps how
    /// many times the ring is pushed outward before giving up.
    pub const fn new(default_location: GridCoord, proximity: u32, max_ring_expansions: u32) -> Self {
        Self {
            default_location,
            proximity,
            max_ring_expansions,
        }
    }

    /// The buffer distance given to new claims.
    pub const fn proximity(&self) -> u32 {
        self.proximity
    }

    /// The claim with the fewest known neighbours. Ties go to the claim
    /// that comes first, so callers must pass claims in creation order.
    pub fn select_reference<'a, I>(claims: I) -> Option<&'a ClaimFootprint>
    where
        I: IntoIterator<Item = &'a ClaimFootprint>,
    {
        claims
            .into_iter()
            .min_by_key(|claim| claim.adjacent_claim_count())
    }

    /// Pick the starting coordinate for a new claim.
    ///
    /// `claims` must be every existing claim in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoLegalPlacement`] when every ring up to the
    /// expansion cap is blocked.
    pub fn allocate<'a, I, R>(
        &self,
        claims: I,
        index: &SpatialIndex,
        rng: &mut R,
    ) -> Result<Placement, WorldError>
    where
        I: IntoIterator<Item = &'a ClaimFootprint>,
        R: Rng + ?Sized,
    {
        let Some(reference) = Self::select_reference(claims) else {
            debug!(coord = %self.default_location, "placing first claim at default location");
            return Ok(Placement {
                coord: self.default_location,
                reference: None,
            });
        };

        for expansion in 0..=self.max_ring_expansions {
            let buffer = self.proximity.saturating_add(expansion);
            let ring = reference.region().with_buffer(buffer).ring();
            let candidates: Vec<GridCoord> = ring
                .into_iter()
                .filter(|coord| self.is_open(*coord, index))
                .collect();

            if let Some(&coord) = candidates.choose(rng) {
                debug!(
                    %coord,
                    reference = %reference.id(),
                    buffer,
                    candidates = candidates.len(),
                    "claim placed on reference ring"
                );
                return Ok(Placement {
                    coord,
                    reference: Some(reference.id()),
                });
            }
            debug!(reference = %reference.id(), buffer, "ring exhausted, widening");
        }

        let attempts = self.max_ring_expansions.saturating_add(1);
        warn!(reference = %reference.id(), attempts, "no legal placement for new claim");
        Err(WorldError::NoLegalPlacement { attempts })
    }

    /// Whether a brand-new claim may start at `coord`.
    fn is_open(&self, coord: GridCoord, index: &SpatialIndex) -> bool {
        coord.is_valid()
            && !index.is_occupied(coord)
            && !index.is_in_buffer_zone_of_other_claim(coord, None)
            && !index.buffer_would_cover_other_claim(
                &BoundingRegion::around(coord).with_buffer(self.proximity),
                None,
            )
    }
}
