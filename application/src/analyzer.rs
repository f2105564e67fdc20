//! Strategy analysis: one Brain call that turns a user message into a
//! routing [`Strategy`], informed by history, and one decision log write.

use crate::brain::BrainSelector;
use crate::ports::decision_store::{DecisionStore, StoreError};
use crate::ports::memory_store::MemoryStore;
use crate::ports::provider_gateway::{ChatOptions, GatewayError};
use crate::registry::ProviderRegistry;
use ensemble_domain::{
    DecisionLogEntry, DomainError, Message, PromptTemplate, Strategy, mode_patterns,
    optimize_agents, parse_strategy,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Decision type under which routing decisions are logged
const ROUTING_DECISION: &str = "routing";

/// Errors that can occur during strategy analysis
#[derive(Error, Debug)]
pub enum AnalyzeError {
    #[error("No provider is available and healthy")]
    AllProvidersUnavailable,

    #[error("Brain call failed: {0}")]
    BrainCall(#[from] GatewayError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Tunables for the analysis pass
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Conversation turns included in the routing prompt
    pub context_window: usize,
    /// Long-term memory matches included
    pub memory_limit: usize,
    /// Similar past decisions included
    pub similar_limit: usize,
    /// Minimum token-overlap for a past decision to count as similar
    pub min_overlap: f64,
    /// How many recent decisions to scan for mode patterns
    pub pattern_scan: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            context_window: 5,
            memory_limit: 3,
            similar_limit: 5,
            min_overlap: 0.2,
            pattern_scan: 50,
        }
    }
}

/// Builds the routing prompt, asks the Brain, parses the reply, and
/// re-optimizes the agent list.
///
/// Every `analyze` call appends exactly one decision log entry. A parse
/// failure is recovered locally with the fallback strategy; a failed
/// Brain call propagates, since no strategy can exist without a Brain.
pub struct StrategyAnalyzer {
    registry: Arc<ProviderRegistry>,
    brain: Arc<BrainSelector>,
    decisions: Arc<dyn DecisionStore>,
    memory: Arc<dyn MemoryStore>,
    config: AnalyzerConfig,
}

impl StrategyAnalyzer {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        brain: Arc<BrainSelector>,
        decisions: Arc<dyn DecisionStore>,
        memory: Arc<dyn MemoryStore>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            registry,
            brain,
            decisions,
            memory,
            config,
        }
    }

    pub async fn analyze(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<Strategy, AnalyzeError> {
        let brain = self.brain.select().await.map_err(|e| match e {
            DomainError::AllProvidersUnavailable => AnalyzeError::AllProvidersUnavailable,
            other => AnalyzeError::BrainCall(GatewayError::Other(other.to_string())),
        })?;
        info!("Analyzing request with Brain {}", brain.name());

        // Gather routing context
        let context = self
            .decisions
            .context_window(user_id, session_id, self.config.context_window)
            .await?;
        let transcript = context
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let memory_matches = self
            .memory
            .search(user_id, message, self.config.memory_limit)
            .await?;

        let similar = self
            .decisions
            .similar(
                ROUTING_DECISION,
                message,
                self.config.similar_limit,
                self.config.min_overlap,
            )
            .await?;
        let similar_examples: Vec<(String, f64)> = similar
            .iter()
            .map(|(entry, score)| (entry.input.clone(), *score))
            .collect();

        let recent = self
            .decisions
            .recent_decisions(ROUTING_DECISION, self.config.pattern_scan)
            .await?;
        let patterns = mode_patterns(&recent);

        // One non-streaming Brain call
        let prompt = PromptTemplate::routing_prompt(
            message,
            &transcript,
            &self.registry.capability_table(),
            &patterns,
            &similar_examples,
            &memory_matches,
        );
        let options = ChatOptions::with_system(PromptTemplate::routing_system());
        let reply = brain.chat(&[Message::user(prompt)], &options).await?;

        // Parse, falling back to the default strategy on failure
        let mut strategy = match parse_strategy(&reply.content) {
            Ok(strategy) => strategy,
            Err(e) => {
                warn!("Strategy parse failed ({}), using fallback", e);
                let default_agent = self
                    .registry
                    .first_available()
                    .map(|p| p.name().to_string())
                    .ok_or(AnalyzeError::AllProvidersUnavailable)?;
                Strategy::fallback(default_agent)
            }
        };

        // Re-rank against the live provider set
        let available = self.registry.available_profiles();
        strategy.recommended_agents = optimize_agents(
            &strategy.recommended_agents,
            strategy.category,
            strategy.complexity,
            strategy.collaboration_mode,
            &available,
        );
        if strategy.recommended_agents.is_empty() {
            return Err(AnalyzeError::AllProvidersUnavailable);
        }
        debug!(
            "Strategy: {} / {} / {} -> [{}]",
            strategy.complexity,
            strategy.category,
            strategy.collaboration_mode,
            strategy.recommended_agents.join(", ")
        );

        // Persist the full trace
        let entry = DecisionLogEntry::new(user_id, session_id, ROUTING_DECISION, message)
            .with_process(serde_json::json!({
                "strategy": strategy,
                "brain": brain.name(),
                "brain_thought": strategy.brain_thought,
                "brain_decision": strategy.brain_decision,
                "similar_inputs": similar_examples,
                "mode_patterns": patterns,
            }))
            .with_output(strategy.reasoning.clone())
            .with_providers(strategy.recommended_agents.clone());
        self.decisions.log(entry).await?;

        Ok(strategy)
    }
}
