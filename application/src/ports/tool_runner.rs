//! Tool execution port.
//!
//! The tool subsystem is an opaque side-effecting collaborator; the
//! engine hands it calls extracted from agent replies and appends the
//! results. Failures are surfaced inline, never fatal.

use async_trait::async_trait;
use ensemble_domain::ToolCall;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not available: {0}")]
    NotAvailable(String),

    #[error("Tool execution failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, call: &ToolCall) -> Result<String, ToolError>;
}
