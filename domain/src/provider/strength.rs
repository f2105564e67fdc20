//! Capability tags for providers (Value Object)

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// What a provider is good at.
///
/// These tags drive agent selection: the analyzer re-ranks the Brain's
/// recommended agents so that, for example, a technical request leads with
/// the technically-strongest provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strength {
    Technical,
    Conversation,
    Creative,
    Research,
    DeepReasoning,
    Search,
}

impl Strength {
    /// Get the string identifier for this strength
    pub fn as_str(&self) -> &'static str {
        match self {
            Strength::Technical => "technical",
            Strength::Conversation => "conversation",
            Strength::Creative => "creative",
            Strength::Research => "research",
            Strength::DeepReasoning => "deep-reasoning",
            Strength::Search => "search",
        }
    }

    /// All known strengths, for capability-table rendering
    pub fn all() -> &'static [Strength] {
        &[
            Strength::Technical,
            Strength::Conversation,
            Strength::Creative,
            Strength::Research,
            Strength::DeepReasoning,
            Strength::Search,
        ]
    }
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Strength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical" => Ok(Strength::Technical),
            "conversation" => Ok(Strength::Conversation),
            "creative" => Ok(Strength::Creative),
            "research" => Ok(Strength::Research),
            "deep-reasoning" | "deep_reasoning" => Ok(Strength::DeepReasoning),
            "search" => Ok(Strength::Search),
            other => Err(format!("Unknown strength: {other}")),
        }
    }
}

impl Serialize for Strength {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Strength {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
