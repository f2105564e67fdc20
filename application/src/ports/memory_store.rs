//! Short/long-term memory port.
//!
//! Short-term writes fold each completed turn back into session memory;
//! long-term search feeds relevant past facts into the routing prompt.

use super::decision_store::StoreError;
use async_trait::async_trait;
use ensemble_domain::Role;

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Record one turn fragment in short-term session memory
    async fn remember(
        &self,
        user_id: &str,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), StoreError>;

    /// Long-term matches for a query, most relevant first
    async fn search(
        &self,
        user_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError>;
}
