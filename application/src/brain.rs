//! Brain selection: picking the coordinating provider for a turn.

use crate::ports::provider_gateway::ProviderGateway;
use crate::registry::ProviderRegistry;
use ensemble_domain::{Cached, Clock, DomainError, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Walks the priority order and returns the first provider that is both
/// available and healthy.
///
/// Health probes can involve network I/O, so results are cached per
/// provider with a TTL; expiry is computed against the injected clock.
/// A single `select()` call makes no retries — transient recovery is the
/// caller re-invoking selection on the next request.
pub struct BrainSelector {
    registry: Arc<ProviderRegistry>,
    clock: Arc<dyn Clock>,
    health_ttl: Duration,
    health: Mutex<HashMap<String, Cached<bool>>>,
}

impl BrainSelector {
    pub fn new(registry: Arc<ProviderRegistry>, health_ttl: Duration) -> Self {
        Self::with_clock(registry, health_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        registry: Arc<ProviderRegistry>,
        health_ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            clock,
            health_ttl,
            health: Mutex::new(HashMap::new()),
        }
    }

    /// Select the current Brain.
    ///
    /// Errors with `AllProvidersUnavailable` only when every provider in
    /// the full priority order fails availability or health.
    pub async fn select(&self) -> Result<Arc<dyn ProviderGateway>, DomainError> {
        for provider in self.registry.all() {
            if !provider.is_available() {
                debug!("Brain candidate {} not available, skipping", provider.name());
                continue;
            }

            if self.probe_health(provider).await {
                debug!("Selected Brain: {}", provider.name());
                return Ok(Arc::clone(provider));
            }

            warn!("Brain candidate {} failed health check", provider.name());
        }

        Err(DomainError::AllProvidersUnavailable)
    }

    async fn probe_health(&self, provider: &Arc<dyn ProviderGateway>) -> bool {
        let name = provider.name().to_string();

        if let Ok(cache) = self.health.lock()
            && let Some(cached) = cache.get(&name)
            && let Some(&healthy) = cached.get(self.clock.as_ref())
        {
            return healthy;
        }

        let healthy = provider.check_health().await;

        if let Ok(mut cache) = self.health.lock() {
            cache.insert(
                name,
                Cached::with_ttl(healthy, self.health_ttl, self.clock.as_ref()),
            );
        }

        healthy
    }
}
