//! Per-mode usage statistics mined from past decisions

use crate::decision::entities::DecisionLogEntry;
use crate::strategy::entities::CollaborationMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Historical usage of one collaboration mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModePattern {
    pub mode: CollaborationMode,
    /// How many past decisions used this mode
    pub count: usize,
    /// Most frequently used agents under this mode, most frequent first
    pub top_agents: Vec<String>,
}

impl ModePattern {
    /// One-line summary for prompt embedding
    pub fn summary(&self) -> String {
        if self.count == 0 {
            format!("{}: never used", self.mode)
        } else {
            format!(
                "{}: used {} times, usually with [{}]",
                self.mode,
                self.count,
                self.top_agents.join(", ")
            )
        }
    }
}

/// Aggregate usage count and most-frequent agents for each of the five
/// modes across past entries. Modes never seen still appear with a zero
/// count so the routing prompt shows the full picture.
pub fn mode_patterns(entries: &[DecisionLogEntry]) -> Vec<ModePattern> {
    let mut counts: HashMap<CollaborationMode, usize> = HashMap::new();
    let mut agent_counts: HashMap<CollaborationMode, HashMap<String, usize>> = HashMap::new();

    for entry in entries {
        let Some(mode) = entry.mode().and_then(|m| m.parse::<CollaborationMode>().ok()) else {
            continue;
        };
        *counts.entry(mode).or_default() += 1;
        let per_agent = agent_counts.entry(mode).or_default();
        for agent in &entry.providers_used {
            *per_agent.entry(agent.clone()).or_default() += 1;
        }
    }

    CollaborationMode::all()
        .iter()
        .map(|mode| {
            let mut agents: Vec<(String, usize)> = agent_counts
                .get(mode)
                .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
                .unwrap_or_default();
            // Count descending, name ascending for a stable order
            agents.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

            ModePattern {
                mode: *mode,
                count: counts.get(mode).copied().unwrap_or(0),
                top_agents: agents.into_iter().take(3).map(|(name, _)| name).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mode: &str, agents: &[&str]) -> DecisionLogEntry {
        DecisionLogEntry::new("u", "s", "routing", "q")
            .with_process(serde_json::json!({
                "strategy": {"collaboration_mode": mode}
            }))
            .with_providers(agents.iter().map(|a| a.to_string()).collect())
    }

    #[test]
    fn counts_per_mode() {
        let entries = vec![
            entry("single", &["claude"]),
            entry("single", &["gpt"]),
            entry("debate", &["claude", "gpt", "gemini"]),
        ];
        let patterns = mode_patterns(&entries);

        let single = patterns
            .iter()
            .find(|p| p.mode == CollaborationMode::Single)
            .unwrap();
        assert_eq!(single.count, 2);

        let debate = patterns
            .iter()
            .find(|p| p.mode == CollaborationMode::Debate)
            .unwrap();
        assert_eq!(debate.count, 1);
    }

    #[test]
    fn all_five_modes_present() {
        let patterns = mode_patterns(&[]);
        assert_eq!(patterns.len(), 5);
        assert!(patterns.iter().all(|p| p.count == 0));
    }

    #[test]
    fn top_agents_ranked_by_frequency() {
        let entries = vec![
            entry("single", &["claude"]),
            entry("single", &["claude"]),
            entry("single", &["gpt"]),
        ];
        let patterns = mode_patterns(&entries);
        let single = patterns
            .iter()
            .find(|p| p.mode == CollaborationMode::Single)
            .unwrap();
        assert_eq!(single.top_agents, vec!["claude", "gpt"]);
    }

    #[test]
    fn malformed_traces_are_skipped() {
        let entries = vec![DecisionLogEntry::new("u", "s", "routing", "q")];
        let patterns = mode_patterns(&entries);
        assert!(patterns.iter().all(|p| p.count == 0));
    }

    #[test]
    fn summary_mentions_usage() {
        let pattern = ModePattern {
            mode: CollaborationMode::Voting,
            count: 3,
            top_agents: vec!["claude".to_string()],
        };
        assert!(pattern.summary().contains("3 times"));
        assert!(pattern.summary().contains("claude"));
    }
}
