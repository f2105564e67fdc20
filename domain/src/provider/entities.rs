//! Provider profile entity

use super::Strength;
use serde::{Deserialize, Serialize};

/// Immutable identity and capability description of one LLM backend.
///
/// Availability and health are live properties of the transport and are
/// queried through the gateway port, never cached on the profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Unique provider name (e.g., "claude", "gpt", "gemini")
    pub name: String,
    /// Capability tags used for agent selection and role hints
    pub strengths: Vec<Strength>,
    /// Free-form specialties shown in the capability table
    #[serde(default)]
    pub specialties: Vec<String>,
    /// Position in the fixed priority order (0 = highest)
    #[serde(default)]
    pub priority: usize,
}

impl ProviderProfile {
    pub fn new(name: impl Into<String>, strengths: Vec<Strength>) -> Self {
        Self {
            name: name.into(),
            strengths,
            specialties: Vec::new(),
            priority: 0,
        }
    }

    pub fn with_specialties(mut self, specialties: Vec<String>) -> Self {
        self.specialties = specialties;
        self
    }

    pub fn with_priority(mut self, priority: usize) -> Self {
        self.priority = priority;
        self
    }

    /// Whether this provider carries the given capability tag
    pub fn has_strength(&self, strength: Strength) -> bool {
        self.strengths.contains(&strength)
    }

    /// A short role hint derived from the provider's own strengths,
    /// used in parallel mode so each agent plays to its tags.
    pub fn role_hint(&self) -> String {
        if self.strengths.is_empty() {
            return "general assistant".to_string();
        }
        let tags: Vec<&str> = self.strengths.iter().map(|s| s.as_str()).collect();
        format!("specialist in {}", tags.join(", "))
    }
}

impl std::fmt::Display for ProviderProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_strength() {
        let profile = ProviderProfile::new("claude", vec![Strength::Technical, Strength::Creative]);
        assert!(profile.has_strength(Strength::Technical));
        assert!(!profile.has_strength(Strength::Search));
    }

    #[test]
    fn test_role_hint_lists_tags() {
        let profile = ProviderProfile::new("gpt", vec![Strength::Research, Strength::Search]);
        let hint = profile.role_hint();
        assert!(hint.contains("research"));
        assert!(hint.contains("search"));
    }

    #[test]
    fn test_role_hint_fallback_without_tags() {
        let profile = ProviderProfile::new("bare", vec![]);
        assert_eq!(profile.role_hint(), "general assistant");
    }
}
