//! Grid geometry, claim placement, and weather for the Plotcoin simulation.
//!
//! This crate owns everything spatial: which claim stands on which tile,
//! where a new claim may go, and how clouds drift across the map. It knows
//! nothing about money or equipment.
//!
//! # Modules
//!
//! - [`region`] -- [`BoundingRegion`], inclusive rectangles with a buffer,
//!   minimum-size padding, and the adjacency ring.
//! - [`spatial`] -- [`SpatialIndex`], occupancy, buffer zones, weather
//!   tiles, and the global region.
//! - [`footprint`] -- [`ClaimFootprint`], the tiles and adjacency
//!   bookkeeping of one claim.
//! - [`allocator`] -- [`PlotAllocator`], least-connected reference selection
//!   and ring search with widening.
//! - [`weather`] -- [`WeatherSystem`], clouds that wander and wrap.
//! - [`error`] -- Error types for spatial operations.

pub mod allocator;
pub mod error;
pub mod footprint;
pub mod region;
pub mod spatial;
pub mod weather;

// Re-export primary types at crate root.
pub use allocator::{Placement, PlotAllocator};
pub use error::WorldError;
pub use footprint::ClaimFootprint;
pub use region::BoundingRegion;
pub use spatial::SpatialIndex;
pub use weather::{Cloud, CloudMove, WeatherSystem, WeatherTile};
