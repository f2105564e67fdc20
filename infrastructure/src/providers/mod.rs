//! Provider gateway adapters

pub mod http;
pub mod normalizer;

use crate::config::FileConfig;
use ensemble_application::ports::provider_gateway::ProviderGateway;
use std::sync::Arc;
use tracing::warn;

pub use http::HttpProviderGateway;

/// Build one gateway per configured provider.
///
/// API keys come from each provider's named environment variable; a
/// missing key leaves the gateway constructed but unavailable, so it
/// still shows up in diagnostics.
pub fn build_gateways(config: &FileConfig) -> Vec<Arc<dyn ProviderGateway>> {
    config
        .providers
        .iter()
        .map(|provider| {
            let api_key = match std::env::var(&provider.api_key_env) {
                Ok(key) if !key.is_empty() => Some(key),
                _ => {
                    warn!(
                        "Provider {}: no API key in ${}, marking unavailable",
                        provider.name, provider.api_key_env
                    );
                    None
                }
            };
            let normalize = normalizer::by_name(&provider.chunk_format).unwrap_or_else(|| {
                warn!(
                    "Provider {}: unknown chunk format '{}', using openai_delta",
                    provider.name, provider.chunk_format
                );
                normalizer::openai_delta
            });
            Arc::new(HttpProviderGateway::new(
                provider.profile(),
                &provider.base_url,
                &provider.model,
                api_key,
                normalize,
                provider.enabled,
            )) as Arc<dyn ProviderGateway>
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;

    #[test]
    fn builds_one_gateway_per_provider() {
        let config = FileConfig {
            providers: vec![
                ProviderConfig {
                    name: "claude".to_string(),
                    base_url: "https://api.example.com/v1".to_string(),
                    model: "claude-sonnet".to_string(),
                    api_key_env: "ENSEMBLE_TEST_MISSING_KEY".to_string(),
                    ..Default::default()
                },
                ProviderConfig {
                    name: "gpt".to_string(),
                    base_url: "https://api.example.com/v1".to_string(),
                    model: "gpt-4o".to_string(),
                    api_key_env: "ENSEMBLE_TEST_MISSING_KEY".to_string(),
                    enabled: false,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let gateways = build_gateways(&config);
        assert_eq!(gateways.len(), 2);
        assert_eq!(gateways[0].name(), "claude");
        // No key in the environment, so neither is available
        assert!(!gateways[0].is_available());
        assert!(!gateways[1].is_available());
    }
}
