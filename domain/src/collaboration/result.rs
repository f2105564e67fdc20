//! Buffered collaboration results

use crate::strategy::entities::CollaborationMode;
use serde::{Deserialize, Serialize};

/// One agent's contribution within a multi-agent mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub agent: String,
    pub content: String,
}

impl AgentReply {
    pub fn new(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            content: content.into(),
        }
    }
}

/// One debate round: every participating agent's opinion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRecord {
    pub round: usize,
    pub opinions: Vec<AgentReply>,
}

/// One agent's vote: the free-form opinion plus the discrete choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub agent: String,
    pub choice: String,
    pub opinion: String,
}

/// Mode-specific detail attached to a result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollaborationMetadata {
    Single {
        /// Agents tried before one succeeded
        attempts: Vec<String>,
    },
    Parallel {
        responses: Vec<AgentReply>,
    },
    Sequential {
        stages: Vec<AgentReply>,
    },
    Debate {
        rounds: Vec<DebateRecord>,
    },
    Voting {
        votes: Vec<VoteRecord>,
    },
}

/// The assembled answer for one turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborationResult {
    pub content: String,
    pub agents_used: Vec<String>,
    pub mode: CollaborationMode,
    pub metadata: CollaborationMetadata,
}

impl CollaborationResult {
    pub fn new(
        content: impl Into<String>,
        agents_used: Vec<String>,
        mode: CollaborationMode,
        metadata: CollaborationMetadata,
    ) -> Self {
        Self {
            content: content.into(),
            agents_used,
            mode,
            metadata,
        }
    }
}
