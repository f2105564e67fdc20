//! Configuration file schema.
//!
//! Deserialized from `ensemble.toml` (and the global config) via figment;
//! every field has a serde default so partial files merge cleanly.

use ensemble_domain::{ProviderProfile, Strength};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub providers: Vec<ProviderConfig>,
    pub engine: EngineConfig,
    pub storage: StorageConfig,
}

/// One configured LLM backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Capability tags (see [`Strength`] wire names)
    pub strengths: Vec<String>,
    pub specialties: Vec<String>,
    /// Position in the priority order (0 = highest)
    pub priority: usize,
    /// Chunk normalizer name for streamed replies
    pub chunk_format: String,
    pub enabled: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_url: String::new(),
            model: String::new(),
            api_key_env: String::new(),
            strengths: Vec::new(),
            specialties: Vec::new(),
            priority: 0,
            chunk_format: "openai_delta".to_string(),
            enabled: true,
        }
    }
}

impl ProviderConfig {
    /// Build the domain profile, dropping unknown strength tags with a
    /// warning rather than failing the whole config.
    pub fn profile(&self) -> ProviderProfile {
        let strengths: Vec<Strength> = self
            .strengths
            .iter()
            .filter_map(|tag| match tag.parse() {
                Ok(strength) => Some(strength),
                Err(_) => {
                    warn!("Provider {}: unknown strength tag '{}'", self.name, tag);
                    None
                }
            })
            .collect();
        ProviderProfile::new(&self.name, strengths)
            .with_specialties(self.specialties.clone())
            .with_priority(self.priority)
    }
}

/// Engine tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Health probe cache TTL, in seconds
    pub health_ttl_secs: u64,
    /// Per-provider-call budget, in seconds; 0 disables the budget
    pub call_timeout_secs: u64,
    /// Persona line for the system prompt
    pub persona: Option<String>,
    /// Conversation turns fed into the routing prompt
    pub context_window: usize,
    /// Similar past decisions fed into the routing prompt
    pub similar_limit: usize,
    /// Minimum token-overlap for a past decision to count as similar
    pub min_overlap: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            health_ttl_secs: 60,
            call_timeout_secs: 120,
            persona: None,
            context_window: 5,
            similar_limit: 5,
            min_overlap: 0.2,
        }
    }
}

/// Persistence locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Decision log path; `None` keeps decisions in memory only
    pub decision_log: Option<PathBuf>,
}
