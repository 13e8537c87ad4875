//! Human and bot agents for the Plotcoin simulation.
//!
//! This crate decides what agents do; it never touches the map or the
//! timers. The session in `plotcoin-core` asks a bot to analyse a claim,
//! then carries out the returned action.
//!
//! # Modules
//!
//! - [`agent`] -- [`Agent`] (human or bot), [`BotState`], and the
//!   [`AgentRoster`].
//! - [`profile`] -- [`BotProfile`] and the bounds profiles are drawn from.
//! - [`decision`] -- The invest / export / save rule and the action history.
//! - [`negotiation`] -- Drafting contract terms and judging offers.
//! - [`error`] -- Error types for agent operations ([`AgentError`]).

pub mod agent;
pub mod decision;
pub mod error;
pub mod negotiation;
pub mod profile;

// Re-export primary types at crate root for convenience.
pub use agent::{Agent, AgentKind, AgentRoster, Analysis, BotState};
pub use decision::{ActionHistory, DefaultPrices, decide};
pub use error::AgentError;
pub use negotiation::{draft_terms, evaluate_offer};
pub use profile::{BotProfile, InvestmentPolicy, ProfileBounds};
