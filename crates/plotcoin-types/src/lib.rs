//! Shared type definitions for the Plotcoin simulation.
//!
//! This crate is the single source of truth for the identifiers, grid
//! coordinates, and outbound messages used across the workspace. Types
//! defined here flow to the tile renderer via `ts-rs` bindings.
//!
//! # Modules
//!
//! - [`ids`] -- Typed UUID handles for agents, claims, equipment, and timers
//! - [`coord`] -- [`GridCoord`] and its "no valid location" sentinel
//! - [`enums`] -- Equipment kinds, bot actions, weather severities
//! - [`events`] -- Presentation commands and session events

pub mod coord;
pub mod enums;
pub mod events;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use coord::GridCoord;
pub use enums::{BotAction, DropReason, EquipmentKind, WeatherKind};
pub use events::{EventDetail, PresentationCommand, SessionEvent};
pub use ids::{AgentId, ClaimId, CloudId, ContractId, EquipmentId, TaskId};
