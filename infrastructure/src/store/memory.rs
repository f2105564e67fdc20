//! In-memory store adapters, for tests and ephemeral sessions.

use async_trait::async_trait;
use ensemble_application::ports::decision_store::{DecisionStore, StoreError};
use ensemble_application::ports::memory_store::MemoryStore;
use ensemble_domain::{DecisionLogEntry, Message, Role, token_overlap};
use std::sync::Mutex;

/// Decision type whose entries reconstruct the conversation window
const TURN_DECISION: &str = "turn";

/// Append-only decision log held in memory
#[derive(Default)]
pub struct InMemoryDecisionStore {
    entries: Mutex<Vec<DecisionLogEntry>>,
}

impl InMemoryDecisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DecisionStore for InMemoryDecisionStore {
    async fn log(&self, entry: DecisionLogEntry) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Io("decision store poisoned".to_string()))?
            .push(entry);
        Ok(())
    }

    async fn context_window(
        &self,
        user_id: &str,
        session_id: &str,
        n: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("decision store poisoned".to_string()))?;

        let mut messages = Vec::new();
        for entry in entries.iter() {
            if entry.decision_type != TURN_DECISION
                || entry.user_id != user_id
                || entry.session_id != session_id
            {
                continue;
            }
            messages.push(Message::user(entry.input.clone()));
            if !entry.output.is_empty() {
                messages.push(Message::assistant(entry.output.clone()));
            }
        }

        let start = messages.len().saturating_sub(n);
        Ok(messages.split_off(start))
    }

    async fn recent_decisions(
        &self,
        decision_type: &str,
        limit: usize,
    ) -> Result<Vec<DecisionLogEntry>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Io("decision store poisoned".to_string()))?;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.decision_type == decision_type)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Long-term memory held in memory, searched by token overlap
#[derive(Default)]
pub struct InMemoryMemoryStore {
    rows: Mutex<Vec<MemoryRow>>,
}

struct MemoryRow {
    user_id: String,
    content: String,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    async fn remember(
        &self,
        user_id: &str,
        _session_id: &str,
        _role: Role,
        content: &str,
    ) -> Result<(), StoreError> {
        self.rows
            .lock()
            .map_err(|_| StoreError::Io("memory store poisoned".to_string()))?
            .push(MemoryRow {
                user_id: user_id.to_string(),
                content: content.to_string(),
            });
        Ok(())
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Io("memory store poisoned".to_string()))?;

        let mut scored: Vec<(f64, &String)> = rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| (token_overlap(query, &row.content), &row.content))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(_, content)| content.clone())
            .collect())
    }
}
