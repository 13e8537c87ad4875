//! Simulation clock, timers, configuration, and the session context for
//! the Plotcoin simulation.
//!
//! This crate wires the world, economy, and agent crates into one
//! single-threaded timeline driven by repeating timers.
//!
//! # Modules
//!
//! - [`clock`] -- Simulated time in seconds with checked advancement.
//! - [`config`] -- Configuration loading from `plotcoin-config.yaml` into
//!   strongly-typed structs.
//! - [`timers`] -- [`TimerRegistry`] of repeating tasks ordered by due time.
//! - [`session`] -- [`Session`], the context object owning all shared state.
//!
//! [`TimerRegistry`]: timers::TimerRegistry
//! [`Session`]: session::Session

pub mod clock;
pub mod config;
pub mod session;
pub mod timers;

pub use clock::{ClockError, SimClock};
pub use config::{ConfigError, SimulationConfig};
pub use session::{PurchaseOutcome, Session, SessionError, SessionSummary};
pub use timers::{Firing, ScheduledTask, TaskKind, TimerError, TimerRegistry};
