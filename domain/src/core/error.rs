//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No provider is available and healthy")]
    AllProvidersUnavailable,

    #[error("All agents failed to respond")]
    AllAgentsFailed,

    #[error("Could not parse a strategy from the Brain reply: {0}")]
    StrategyParseFailure(String),

    #[error("Invalid strategy: {0}")]
    InvalidStrategy(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
