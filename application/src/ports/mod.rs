//! Ports: interfaces to the outside world.
//!
//! Implementations (adapters) live in the infrastructure layer.

pub mod decision_store;
pub mod memory_store;
pub mod provider_gateway;
pub mod tool_runner;
