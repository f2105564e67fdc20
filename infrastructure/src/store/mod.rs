//! Persistence adapters

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlDecisionStore;
pub use memory::{InMemoryDecisionStore, InMemoryMemoryStore};
