//! Infrastructure layer for ensemble
//!
//! Adapters implementing the application-layer ports:
//!
//! - [`providers`] — HTTP gateways to LLM backends, with per-provider
//!   chunk normalization
//! - [`store`] — JSONL and in-memory decision/memory stores
//! - [`tools`] — tool runner adapters
//! - [`config`] — configuration file loading and merging

pub mod config;
pub mod providers;
pub mod store;
pub mod tools;

pub use config::{ConfigLoader, FileConfig, ProviderConfig};
pub use providers::{HttpProviderGateway, build_gateways};
pub use store::{InMemoryDecisionStore, InMemoryMemoryStore, JsonlDecisionStore};
pub use tools::NoopToolRunner;
