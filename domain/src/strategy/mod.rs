//! Routing strategy: classification enums, the strategy entity,
//! reply parsing, and agent-selection optimization.

pub mod entities;
pub mod optimize;
pub mod parser;
