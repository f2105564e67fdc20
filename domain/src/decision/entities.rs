//! Persisted routing decisions

use serde::{Deserialize, Serialize};

/// One append-only record of a routing decision.
///
/// Written once per `analyze()` call and never mutated; the `process`
/// value carries the full trace (parsed strategy, Brain narrative,
/// similarity and pattern summaries, Brain identity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub user_id: String,
    pub session_id: String,
    pub decision_type: String,
    pub input: String,
    pub process: serde_json::Value,
    pub output: String,
    pub providers_used: Vec<String>,
    /// RFC3339 timestamp
    pub timestamp: String,
}

impl DecisionLogEntry {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        decision_type: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            decision_type: decision_type.into(),
            input: input.into(),
            process: serde_json::Value::Null,
            output: String::new(),
            providers_used: Vec::new(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }

    pub fn with_process(mut self, process: serde_json::Value) -> Self {
        self.process = process;
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_providers(mut self, providers: Vec<String>) -> Self {
        self.providers_used = providers;
        self
    }

    /// The collaboration mode recorded in the trace, if any
    pub fn mode(&self) -> Option<&str> {
        self.process
            .get("strategy")
            .and_then(|s| s.get("collaboration_mode"))
            .and_then(|m| m.as_str())
    }
}
