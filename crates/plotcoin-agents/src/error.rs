//! Error types for the `plotcoin-agents` crate.

use plotcoin_economy::EconomyError;
use plotcoin_types::AgentId;

/// Errors that can occur during agent operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The agent is not in the roster.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// A bot-only operation was called on a human.
    #[error("agent {0} is not a bot")]
    NotABot(AgentId),

    /// A bookkeeping error from the economy layer.
    #[error(transparent)]
    Economy(#[from] EconomyError),
}
