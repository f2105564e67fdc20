//! Decision persistence port.
//!
//! The engine appends one entry per routing decision and mines past
//! entries for context windows, similar decisions, and mode patterns.
//! The similarity ranking itself is domain logic; `similar` is a provided
//! method so every store gets it for free.

use async_trait::async_trait;
use ensemble_domain::{DecisionLogEntry, Message, rank_similar};
use thiserror::Error;

/// Errors from the persistence collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Append-only log of routing decisions plus the read queries the
/// analyzer needs.
#[async_trait]
pub trait DecisionStore: Send + Sync {
    /// Append one decision. Entries are never mutated or deleted.
    async fn log(&self, entry: DecisionLogEntry) -> Result<(), StoreError>;

    /// The most recent `n` role/content pairs for a session, oldest first.
    async fn context_window(
        &self,
        user_id: &str,
        session_id: &str,
        n: usize,
    ) -> Result<Vec<Message>, StoreError>;

    /// The most recent `limit` entries of a decision type, newest first.
    async fn recent_decisions(
        &self,
        decision_type: &str,
        limit: usize,
    ) -> Result<Vec<DecisionLogEntry>, StoreError>;

    /// Up to `k` past entries ranked by input-token overlap with `query`,
    /// excluding entries below `min_overlap`.
    async fn similar(
        &self,
        decision_type: &str,
        query: &str,
        k: usize,
        min_overlap: f64,
    ) -> Result<Vec<(DecisionLogEntry, f64)>, StoreError> {
        // Scan bound keeps the overlap pass cheap on large logs
        let recent = self.recent_decisions(decision_type, 200).await?;
        Ok(rank_similar(query, &recent, k, min_overlap)
            .into_iter()
            .map(|(entry, score)| (entry.clone(), score))
            .collect())
    }
}
