//! Strategy entity and classification value objects

use serde::{Deserialize, Serialize};

/// How demanding the request is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
    VeryComplex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
            Complexity::VeryComplex => "very_complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of request this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Conversation,
    Technical,
    Creative,
    Research,
    Decision,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Conversation => "conversation",
            Category::Technical => "technical",
            Category::Creative => "creative",
            Category::Research => "research",
            Category::Decision => "decision",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the turn is distributed across providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationMode {
    #[default]
    Single,
    Parallel,
    Sequential,
    Debate,
    Voting,
}

impl CollaborationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationMode::Single => "single",
            CollaborationMode::Parallel => "parallel",
            CollaborationMode::Sequential => "sequential",
            CollaborationMode::Debate => "debate",
            CollaborationMode::Voting => "voting",
        }
    }

    /// All modes, in a stable order (used for pattern statistics)
    pub fn all() -> &'static [CollaborationMode] {
        &[
            CollaborationMode::Single,
            CollaborationMode::Parallel,
            CollaborationMode::Sequential,
            CollaborationMode::Debate,
            CollaborationMode::Voting,
        ]
    }

    /// Modes that want maximum perspective diversity
    pub fn wants_diversity(&self) -> bool {
        matches!(self, CollaborationMode::Debate | CollaborationMode::Voting)
    }
}

impl std::fmt::Display for CollaborationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CollaborationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(CollaborationMode::Single),
            "parallel" => Ok(CollaborationMode::Parallel),
            "sequential" => Ok(CollaborationMode::Sequential),
            "debate" => Ok(CollaborationMode::Debate),
            "voting" => Ok(CollaborationMode::Voting),
            other => Err(format!("Unknown collaboration mode: {other}")),
        }
    }
}

/// One routing decision for one user turn.
///
/// Created by the analyzer, consumed once by the executor, then discarded;
/// its trace survives only inside the decision log entry.
///
/// Field aliases accept both the camelCase keys the Brain emits and
/// snake_case keys from persisted traces.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Strategy {
    pub complexity: Complexity,
    pub category: Category,
    #[serde(alias = "needsWebSearch")]
    pub needs_web_search: bool,
    #[serde(alias = "collaborationMode")]
    pub collaboration_mode: CollaborationMode,
    #[serde(alias = "recommendedAgents")]
    pub recommended_agents: Vec<String>,
    pub reasoning: String,
    #[serde(alias = "brainThought")]
    pub brain_thought: String,
    #[serde(alias = "brainDecision")]
    pub brain_decision: String,
    #[serde(alias = "agentInstructions")]
    pub agent_instructions: String,
}

impl Strategy {
    /// The default strategy used when the Brain reply yields no
    /// parseable structure: moderate / conversation / single, answered
    /// by the given (highest-priority available) provider.
    pub fn fallback(agent: impl Into<String>) -> Self {
        Self {
            complexity: Complexity::Moderate,
            category: Category::Conversation,
            needs_web_search: false,
            collaboration_mode: CollaborationMode::Single,
            recommended_agents: vec![agent.into()],
            reasoning: "Fallback strategy: the routing reply contained no parseable decision"
                .to_string(),
            ..Default::default()
        }
    }

    /// Enforce the structural invariants: agents unique, 1..=4 entries.
    ///
    /// Availability filtering happens at the application layer where the
    /// live provider set is known; this only dedups and caps.
    pub fn normalize_agents(&mut self) {
        let mut seen = Vec::new();
        self.recommended_agents.retain(|name| {
            if seen.contains(name) {
                false
            } else {
                seen.push(name.clone());
                true
            }
        });
        self.recommended_agents.truncate(4);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_roundtrip() {
        for mode in CollaborationMode::all() {
            let parsed: CollaborationMode = mode.as_str().parse().unwrap();
            assert_eq!(*mode, parsed);
        }
    }

    #[test]
    fn test_complexity_wire_format() {
        let parsed: Complexity = serde_json::from_str("\"very_complex\"").unwrap();
        assert_eq!(parsed, Complexity::VeryComplex);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"very_complex\"");
    }

    #[test]
    fn test_strategy_parses_camel_case_keys() {
        let json = r#"{
            "complexity": "complex",
            "category": "technical",
            "needsWebSearch": true,
            "collaborationMode": "parallel",
            "recommendedAgents": ["claude", "gpt"],
            "reasoning": "multi-angle problem"
        }"#;
        let strategy: Strategy = serde_json::from_str(json).unwrap();
        assert_eq!(strategy.collaboration_mode, CollaborationMode::Parallel);
        assert!(strategy.needs_web_search);
        assert_eq!(strategy.recommended_agents, vec!["claude", "gpt"]);
        // Omitted fields default
        assert!(strategy.brain_thought.is_empty());
    }

    #[test]
    fn test_fallback_strategy_shape() {
        let strategy = Strategy::fallback("claude");
        assert_eq!(strategy.complexity, Complexity::Moderate);
        assert_eq!(strategy.category, Category::Conversation);
        assert_eq!(strategy.collaboration_mode, CollaborationMode::Single);
        assert_eq!(strategy.recommended_agents, vec!["claude"]);
    }

    #[test]
    fn test_normalize_agents_dedups_and_caps() {
        let mut strategy = Strategy {
            recommended_agents: vec![
                "a".into(),
                "b".into(),
                "a".into(),
                "c".into(),
                "d".into(),
                "e".into(),
            ],
            ..Default::default()
        };
        strategy.normalize_agents();
        assert_eq!(strategy.recommended_agents, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_wants_diversity() {
        assert!(CollaborationMode::Debate.wants_diversity());
        assert!(CollaborationMode::Voting.wants_diversity());
        assert!(!CollaborationMode::Parallel.wants_diversity());
    }
}
