//! Domain layer for ensemble
//!
//! This crate contains the core routing logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Strategy
//!
//! Every user turn is routed by a [`Strategy`]: a classification of the
//! request (complexity, category) plus a decision about *how* to answer it
//! (a [`CollaborationMode`] and an ordered list of agents).
//!
//! ## Collaboration modes
//!
//! - **Single**: one agent answers, with failover through the list
//! - **Parallel**: fan out, then the Brain synthesizes one answer
//! - **Sequential**: a staged pipeline, each agent refining the last
//! - **Debate**: two rounds of opinions, then a Brain ruling
//! - **Voting**: explicit choices tallied by the Brain

pub mod collaboration;
pub mod conversation;
pub mod core;
pub mod decision;
pub mod prompt;
pub mod provider;
pub mod strategy;

// Re-export commonly used types
pub use collaboration::{
    result::{AgentReply, CollaborationMetadata, CollaborationResult, DebateRecord, VoteRecord},
    stream::StreamEvent,
    tool_call::{ToolCall, parse_tool_calls, render_tool_failure, render_tool_result},
};
pub use conversation::{ContextWindow, Message, Role};
pub use core::{
    cache::{Cached, Clock, SystemClock},
    error::DomainError,
};
pub use decision::{
    entities::DecisionLogEntry,
    patterns::{ModePattern, mode_patterns},
    similarity::{rank_similar, token_overlap},
};
pub use prompt::PromptTemplate;
pub use provider::{ProviderProfile, Strength};
pub use strategy::{
    entities::{Category, CollaborationMode, Complexity, Strategy},
    optimize::optimize_agents,
    parser::{extract_fenced_json, extract_first_object, extract_section, parse_strategy},
};
