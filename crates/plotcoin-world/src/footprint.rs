//! The spatial side of a land claim.
//!
//! A [`ClaimFootprint`] records which tiles a claim holds, where it started,
//! which claim it was placed next to, and the bounding region (with the
//! proximity buffer) that keeps other claims away.

use plotcoin_types::{AgentId, ClaimId, DropReason, GridCoord};
use serde::{Deserialize, Serialize};

use crate::region::BoundingRegion;
use crate::spatial::SpatialIndex;

/// Tiles, origin, and adjacency bookkeeping for one claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimFootprint {
    id: ClaimId,
    owner: AgentId,
    /// Occupied tiles in growth order.
    tiles: Vec<GridCoord>,
    start: GridCoord,
    /// Set once at creation.
    reference: Option<ClaimId>,
    /// Only ever incremented; not recomputed.
    adjacent_claim_count: u32,
    /// Tight bounds over `start` and `tiles`, buffered by the proximity.
    region: BoundingRegion,
}

impl ClaimFootprint {
    /// Create a footprint at `start` with no tiles yet.
    ///
    /// The start tile is occupied once equipment is placed on it.
    pub fn new(
        id: ClaimId,
        owner: AgentId,
        start: GridCoord,
        reference: Option<ClaimId>,
        proximity: u32,
    ) -> Self {
        Self {
            id,
            owner,
            tiles: Vec::new(),
            start,
            reference,
            adjacent_claim_count: 0,
            region: BoundingRegion::around(start)
                .with_buffer(proximity)
                .with_owner(id),
        }
    }

    /// The claim's identifier.
    pub const fn id(&self) -> ClaimId {
        self.id
    }

    /// The owning agent.
    pub const fn owner(&self) -> AgentId {
        self.owner
    }

    /// Occupied tiles in growth order.
    pub fn tiles(&self) -> &[GridCoord] {
        &self.tiles
    }

    /// The coordinate the claim was placed at.
    pub const fn start(&self) -> GridCoord {
        self.start
    }

    /// The claim this one was placed next to.
    pub const fn reference(&self) -> Option<ClaimId> {
        self.reference
    }

    /// How many other claims are known to border this one.
    pub const fn adjacent_claim_count(&self) -> u32 {
        self.adjacent_claim_count
    }

    /// The claim's buffered bounding region.
    pub const fn region(&self) -> &BoundingRegion {
        &self.region
    }

    /// Record one more bordering claim.
    pub const fn increment_adjacency(&mut self) {
        self.adjacent_claim_count = self.adjacent_claim_count.saturating_add(1);
    }

    /// Whether the claim holds `coord`.
    pub fn contains_tile(&self, coord: GridCoord) -> bool {
        self.tiles.contains(&coord)
    }

    /// Append `coord` to the claim and grow its region.
    ///
    /// Returns `false` (and changes nothing) if the tile is already held.
    pub fn add_tile(&mut self, coord: GridCoord) -> bool {
        if self.contains_tile(coord) {
            return false;
        }
        self.tiles.push(coord);
        self.region.expand_to_include(coord);
        true
    }

    /// The region the claim would have after growing onto `coord`.
    pub fn grown_region(&self, coord: GridCoord) -> BoundingRegion {
        let mut region = self.region;
        region.expand_to_include(coord);
        region
    }

    /// Why placing a tile of this claim at `coord` is illegal, or `None` if
    /// it is legal.
    ///
    /// A tile must be a real coordinate, unoccupied, outside every other
    /// claim's buffer zone, and must not pull another claim's tile into this
    /// claim's buffer.
    pub fn placement_violation(&self, coord: GridCoord, index: &SpatialIndex) -> Option<DropReason> {
        if !coord.is_valid() {
            return Some(DropReason::InvalidLocation);
        }
        if index.is_occupied(coord) {
            return Some(DropReason::Occupied);
        }
        if index.is_in_buffer_zone_of_other_claim(coord, Some(self.id))
            || index.buffer_would_cover_other_claim(&self.grown_region(coord), Some(self.id))
        {
            return Some(DropReason::InBufferZone);
        }
        None
    }

    /// Legal tiles orthogonally adjacent to the claim, in discovery order
    /// and without duplicates.
    ///
    /// A claim with no tiles yet grows from its start coordinate.
    pub fn free_neighbors(&self, index: &SpatialIndex) -> Vec<GridCoord> {
        let seeds: &[GridCoord] = if self.tiles.is_empty() {
            core::slice::from_ref(&self.start)
        } else {
            &self.tiles
        };
        let mut free: Vec<GridCoord> = Vec::new();
        for neighbor in seeds.iter().flat_map(|tile| tile.neighbors4()) {
            if !free.contains(&neighbor) && self.placement_violation(neighbor, index).is_none() {
                free.push(neighbor);
            }
        }
        free
    }
}
