//! Provider registry: the configured backends in fixed priority order.

use crate::ports::provider_gateway::ProviderGateway;
use ensemble_domain::{ProviderProfile, Strength};
use std::sync::Arc;

/// Holds every configured provider, ordered by priority (index 0 is the
/// most preferred). The order is fixed at construction; availability and
/// health are queried live on the gateways.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ProviderGateway>>,
}

impl ProviderRegistry {
    /// Build a registry, sorting by each profile's `priority` field.
    pub fn new(mut providers: Vec<Arc<dyn ProviderGateway>>) -> Self {
        providers.sort_by_key(|p| p.profile().priority);
        Self { providers }
    }

    /// All providers in priority order
    pub fn all(&self) -> &[Arc<dyn ProviderGateway>] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProviderGateway>> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .cloned()
    }

    /// Currently available providers, in priority order
    pub fn available(&self) -> Vec<Arc<dyn ProviderGateway>> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .cloned()
            .collect()
    }

    /// Profiles of currently available providers, in priority order.
    /// This is the list agent optimization runs against.
    pub fn available_profiles(&self) -> Vec<ProviderProfile> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.profile().clone())
            .collect()
    }

    /// The highest-priority available provider
    pub fn first_available(&self) -> Option<Arc<dyn ProviderGateway>> {
        self.providers.iter().find(|p| p.is_available()).cloned()
    }

    /// First available provider carrying a strength tag
    pub fn strongest(&self, strength: Strength) -> Option<Arc<dyn ProviderGateway>> {
        self.providers
            .iter()
            .find(|p| p.is_available() && p.profile().has_strength(strength))
            .cloned()
    }

    /// Render the capability table for the routing prompt
    pub fn capability_table(&self) -> String {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| {
                let profile = p.profile();
                let strengths: Vec<&str> =
                    profile.strengths.iter().map(|s| s.as_str()).collect();
                if profile.specialties.is_empty() {
                    format!("- {}: {}", profile.name, strengths.join(", "))
                } else {
                    format!(
                        "- {}: {} (specialties: {})",
                        profile.name,
                        strengths.join(", "),
                        profile.specialties.join(", ")
                    )
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGateway;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(vec![
            ScriptedGateway::new("claude", vec![Strength::Technical]).into_arc(),
            ScriptedGateway::new("gpt", vec![Strength::Creative])
                .unavailable()
                .into_arc(),
            ScriptedGateway::new("gemini", vec![Strength::Research]).into_arc(),
        ])
    }

    #[test]
    fn get_by_name() {
        let registry = registry();
        assert!(registry.get("claude").is_some());
        assert!(registry.get("ghost").is_none());
    }

    #[test]
    fn available_filters_and_preserves_order() {
        let registry = registry();
        let names: Vec<String> = registry
            .available()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, vec!["claude", "gemini"]);
    }

    #[test]
    fn first_available_skips_unavailable() {
        let registry = ProviderRegistry::new(vec![
            ScriptedGateway::new("gpt", vec![]).unavailable().into_arc(),
            ScriptedGateway::new("gemini", vec![]).into_arc(),
        ]);
        assert_eq!(registry.first_available().unwrap().name(), "gemini");
    }

    #[test]
    fn strongest_respects_availability() {
        let registry = registry();
        // gpt has Creative but is unavailable
        assert!(registry.strongest(Strength::Creative).is_none());
        assert_eq!(
            registry.strongest(Strength::Research).unwrap().name(),
            "gemini"
        );
    }

    #[test]
    fn capability_table_lists_available_only() {
        let table = registry().capability_table();
        assert!(table.contains("claude: technical"));
        assert!(table.contains("gemini: research"));
        assert!(!table.contains("gpt"));
    }
}
