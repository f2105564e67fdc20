//! Provider gateway port.
//!
//! Defines the capability contract every LLM backend must implement.
//! Chunk normalization is an adapter concern: `stream_chat` yields plain
//! text deltas, so the engine never sees provider-native chunk shapes.

use async_trait::async_trait;
use ensemble_domain::{Message, ProviderProfile};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during provider gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Provider not available: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Transport closed")]
    TransportClosed,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GatewayError::Cancelled)
    }
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn with_system(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(system_prompt.into()),
            ..Default::default()
        }
    }
}

/// Token accounting reported by the backend
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// A complete (non-streaming) reply
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub provider: String,
    pub usage: Option<TokenUsage>,
}

/// Handle for receiving normalized text deltas from a streaming call.
///
/// The underlying sequence is finite and not restartable; dropping the
/// handle aborts the transport-side stream.
pub struct ChunkStream {
    receiver: mpsc::Receiver<Result<String, GatewayError>>,
}

impl ChunkStream {
    pub fn new(receiver: mpsc::Receiver<Result<String, GatewayError>>) -> Self {
        Self { receiver }
    }

    /// Next text delta, or `None` when the stream ends.
    pub async fn recv(&mut self) -> Option<Result<String, GatewayError>> {
        self.receiver.recv().await
    }

    /// Consume the stream and collect all deltas into one string.
    pub async fn collect_text(mut self) -> Result<String, GatewayError> {
        let mut full_text = String::new();
        while let Some(delta) = self.receiver.recv().await {
            full_text.push_str(&delta?);
        }
        Ok(full_text)
    }
}

/// One pluggable LLM backend.
///
/// `is_available` is a cheap configuration check; `check_health` may do
/// network I/O. Both are queried live per selection, never cached on the
/// profile.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Immutable identity and capability tags
    fn profile(&self) -> &ProviderProfile;

    /// Provider name (shorthand for `profile().name`)
    fn name(&self) -> &str {
        &self.profile().name
    }

    /// Whether this provider is configured and enabled
    fn is_available(&self) -> bool;

    /// Live health probe (may suspend on network I/O)
    async fn check_health(&self) -> bool;

    /// Send messages and get a complete reply
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse, GatewayError>;

    /// Send messages and get a stream of normalized text deltas.
    ///
    /// Default implementation calls `chat()` and yields the result as a
    /// single delta, so non-streaming backends work without changes.
    async fn stream_chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream, GatewayError> {
        let response = self.chat(messages, options).await?;
        let (tx, rx) = mpsc::channel(1);
        // If the receiver is already gone, that's fine
        let _ = tx.send(Ok(response.content)).await;
        Ok(ChunkStream::new(rx))
    }
}
