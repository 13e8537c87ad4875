//! The spatial index: who stands on which tile.
//!
//! [`SpatialIndex`] maps grid coordinates to claim tiles and weather tiles,
//! keeps the per-claim buffer zones that forbid foreign tiles, and tracks the
//! global region spanning every claim tile.

use std::collections::{BTreeMap, BTreeSet};

use plotcoin_types::{ClaimId, GridCoord};
use tracing::debug;

use crate::error::WorldError;
use crate::region::BoundingRegion;
use crate::weather::WeatherTile;

/// Occupancy, buffer zones, and weather for the whole grid.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    /// Claim tiles, keyed by coordinate.
    claim_tiles: BTreeMap<GridCoord, ClaimId>,
    /// Weather tiles, keyed by coordinate. They overlay claim tiles.
    weather_tiles: BTreeMap<GridCoord, WeatherTile>,
    /// Union of every buffered region a claim has had, per claim.
    buffer_zones: BTreeMap<ClaimId, BTreeSet<GridCoord>>,
    /// Tight bounds over every claim tile.
    global_region: Option<BoundingRegion>,
    /// Minimum reported width of the global region.
    min_width: u32,
    /// Minimum reported height of the global region.
    min_height: u32,
}

impl SpatialIndex {
    /// Create an empty index whose global region is reported at least
    /// `min_width` x `min_height`.
    pub const fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            claim_tiles: BTreeMap::new(),
            weather_tiles: BTreeMap::new(),
            buffer_zones: BTreeMap::new(),
            global_region: None,
            min_width,
            min_height,
        }
    }

    // -------------------------------------------------------------------
    // Claim tiles
    // -------------------------------------------------------------------

    /// Record that `claim` occupies `coord` and grow the global region.
    ///
    /// Registering the same tile for the same claim twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidLocation`] for the sentinel, or
    /// [`WorldError::TileOccupied`] if another claim already holds the tile.
    pub fn register_claim_tile(&mut self, coord: GridCoord, claim: ClaimId) -> Result<(), WorldError> {
        if !coord.is_valid() {
            return Err(WorldError::InvalidLocation);
        }
        match self.claim_tiles.get(&coord) {
            Some(&occupant) if occupant == claim => return Ok(()),
            Some(&occupant) => return Err(WorldError::TileOccupied { coord, occupant }),
            None => {}
        }
        self.claim_tiles.insert(coord, claim);
        self.expand_global_region(coord);
        debug!(%coord, %claim, "claim tile registered");
        Ok(())
    }

    /// Whether any claim tile stands at `coord`.
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.claim_tiles.contains_key(&coord)
    }

    /// The claim standing at `coord`, if any.
    pub fn claim_at(&self, coord: GridCoord) -> Option<ClaimId> {
        self.claim_tiles.get(&coord).copied()
    }

    /// Number of registered claim tiles.
    pub fn claim_tile_count(&self) -> usize {
        self.claim_tiles.len()
    }

    // -------------------------------------------------------------------
    // Buffer zones
    // -------------------------------------------------------------------

    /// Add the buffered bounds of `region` to `claim`'s buffer zone.
    pub fn add_buffer_zone(&mut self, claim: ClaimId, region: &BoundingRegion) {
        self.buffer_zones
            .entry(claim)
            .or_default()
            .extend(region.buffered().coords());
    }

    /// Whether `coord` lies in the buffer zone of any claim other than
    /// `exclude`. Pass `None` to test against every claim.
    pub fn is_in_buffer_zone_of_other_claim(&self, coord: GridCoord, exclude: Option<ClaimId>) -> bool {
        self.buffer_zones
            .iter()
            .any(|(claim, zone)| Some(*claim) != exclude && zone.contains(&coord))
    }

    /// Whether the buffered bounds of `region` would cover a tile belonging
    /// to a claim other than `exclude`.
    pub fn buffer_would_cover_other_claim(&self, region: &BoundingRegion, exclude: Option<ClaimId>) -> bool {
        let outer = region.buffered();
        self.claim_tiles
            .iter()
            .any(|(coord, occupant)| Some(*occupant) != exclude && outer.contains(*coord))
    }

    // -------------------------------------------------------------------
    // Global region
    // -------------------------------------------------------------------

    /// Grow the global region to include `coord`.
    pub fn expand_global_region(&mut self, coord: GridCoord) {
        match self.global_region.as_mut() {
            Some(region) => region.expand_to_include(coord),
            None => self.global_region = Some(BoundingRegion::around(coord)),
        }
    }

    /// The region spanning every claim tile, padded to the configured
    /// minimum size. `None` until the first tile is registered.
    pub fn global_region(&self) -> Option<BoundingRegion> {
        self.global_region
            .map(|region| region.padded_to(self.min_width, self.min_height))
    }

    // -------------------------------------------------------------------
    // Weather tiles
    // -------------------------------------------------------------------

    /// Place (or replace) the weather tile at `coord`.
    pub fn register_weather_tile(&mut self, coord: GridCoord, tile: WeatherTile) {
        self.weather_tiles.insert(coord, tile);
    }

    /// Remove the weather tile at `coord`, returning it if present.
    pub fn remove_weather_tile(&mut self, coord: GridCoord) -> Option<WeatherTile> {
        self.weather_tiles.remove(&coord)
    }

    /// The weather tile at `coord`, if any.
    pub fn weather_tile(&self, coord: GridCoord) -> Option<WeatherTile> {
        self.weather_tiles.get(&coord).copied()
    }

    /// Iterate over every weather tile.
    pub fn weather_tiles(&self) -> impl Iterator<Item = (&GridCoord, &WeatherTile)> {
        self.weather_tiles.iter()
    }
}
