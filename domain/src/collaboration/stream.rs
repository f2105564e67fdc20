//! Streaming wire events.
//!
//! Each event is one self-describing JSON record, delivered one per line
//! by the transport. A stream always terminates with exactly one `done`
//! or `error`.

use crate::strategy::entities::CollaborationMode;
use serde::{Deserialize, Serialize};

/// One event in a streaming collaboration turn.
///
/// The `type` tag and field names are the wire contract; delivery
/// channels forward these records verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// First event of every stream: what is about to happen
    #[serde(rename_all = "camelCase")]
    Metadata {
        mode: CollaborationMode,
        agents_used: Vec<String>,
        search_results_present: bool,
    },
    /// A text delta of the answer
    Chunk { content: String },
    /// A completed fan-out agent's full reply (parallel mode)
    AgentResponse { agent: String, content: String },
    /// A pipeline stage is starting (sequential mode)
    StepStart {
        step: usize,
        total: usize,
        agent: String,
    },
    /// A debate round is starting
    DebateRound { round: usize },
    /// An agent is about to give its opinion (debate mode)
    DebateOpinionStart { agent: String },
    /// The Brain is about to tally votes (voting mode)
    VotingTallyStart {},
    /// The Brain is about to synthesize (parallel mode)
    SynthesisStart {},
    /// Terminal: the turn completed
    Done {},
    /// Terminal: the turn failed
    Error { message: String },
}

impl StreamEvent {
    /// Returns true if this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done {} | StreamEvent::Error { .. })
    }

    /// The text delta, if this is a chunk.
    pub fn chunk_text(&self) -> Option<&str> {
        match self {
            StreamEvent::Chunk { content } => Some(content),
            _ => None,
        }
    }
}
