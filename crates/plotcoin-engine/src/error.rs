//! Error types for the engine binary.

/// Top-level error for the engine binary.
///
/// Each variant wraps a subsystem error so `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: plotcoin_core::ConfigError,
    },

    /// Session construction or the timeline failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: plotcoin_core::SessionError,
    },
}
