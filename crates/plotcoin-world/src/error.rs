//! Error types for the `plotcoin-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias.

use plotcoin_types::{ClaimId, CloudId, GridCoord};

/// Errors that can occur during spatial operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The allocator exhausted its ring-expansion budget.
    #[error("no legal placement found after {attempts} ring expansions")]
    NoLegalPlacement {
        /// Number of rings searched before giving up.
        attempts: u32,
    },

    /// A claim tile was registered on an occupied coordinate.
    #[error("tile {coord} is already occupied by claim {occupant}")]
    TileOccupied {
        /// The contested coordinate.
        coord: GridCoord,
        /// The claim already standing there.
        occupant: ClaimId,
    },

    /// The sentinel coordinate was passed where a real one is required.
    #[error("the invalid-location sentinel cannot be registered")]
    InvalidLocation,

    /// A cloud was not found in the weather system.
    #[error("cloud not found: {0}")]
    CloudNotFound(CloudId),

    /// Weather needs a global region, but no claim tile exists yet.
    #[error("global region is empty; no claim tiles registered")]
    EmptyGlobalRegion,
}
