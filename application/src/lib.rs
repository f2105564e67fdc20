//! Application layer for ensemble
//!
//! Use cases and ports for the collaboration orchestration engine:
//!
//! - [`ProviderRegistry`] — the configured providers in priority order
//! - [`BrainSelector`] — picks the coordinating provider for a turn
//! - [`StrategyAnalyzer`] — asks the Brain for a routing [`Strategy`]
//! - [`CollaborationExecutor`] — runs the five collaboration algorithms
//! - [`Orchestrator`] — one user turn end to end, buffered or streaming
//!
//! Ports (traits) are defined here and implemented by infrastructure
//! adapters.
//!
//! [`Strategy`]: ensemble_domain::Strategy

pub mod analyzer;
pub mod brain;
pub mod executor;
pub mod orchestrator;
pub mod ports;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use analyzer::{AnalyzeError, AnalyzerConfig, StrategyAnalyzer};
pub use brain::BrainSelector;
pub use executor::{
    CollaborationExecutor, ExecutionOptions, ExecutionRequest, ExecutorError,
};
pub use orchestrator::{Orchestrator, TurnError, TurnRequest};
pub use ports::{
    decision_store::{DecisionStore, StoreError},
    memory_store::MemoryStore,
    provider_gateway::{
        ChatOptions, ChatResponse, ChunkStream, GatewayError, ProviderGateway, TokenUsage,
    },
    tool_runner::{ToolError, ToolRunner},
};
pub use registry::ProviderRegistry;
