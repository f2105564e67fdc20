//! Collaboration execution: the five algorithms, buffered and streaming.
//!
//! Each algorithm is implemented once, against an [`EventSink`] seam. The
//! buffered entry point runs with a sink that discards progress events;
//! the streaming entry point runs the same code with a channel-backed
//! sink. Only the output channel differs.

mod debate;
mod parallel;
mod sequential;
mod single;
mod voting;

use crate::brain::BrainSelector;
use crate::ports::provider_gateway::{ChatOptions, GatewayError, ProviderGateway};
use crate::ports::tool_runner::ToolRunner;
use crate::registry::ProviderRegistry;
use ensemble_domain::{
    CollaborationMode, CollaborationResult, Message, PromptTemplate, Strategy, StreamEvent,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const DEFAULT_PERSONA: &str = "You are a helpful, knowledgeable assistant.";

/// Errors that can occur during collaboration execution
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("No recommended agent is currently available")]
    NoAgents,

    #[error("All agents failed to respond")]
    AllAgentsFailed,

    #[error("No provider is available and healthy")]
    AllProvidersUnavailable,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Gateway error: {0}")]
    Gateway(GatewayError),
}

impl From<GatewayError> for ExecutorError {
    fn from(e: GatewayError) -> Self {
        if e.is_cancelled() {
            ExecutorError::Cancelled
        } else {
            ExecutorError::Gateway(e)
        }
    }
}

/// One execution of a strategy against the providers
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub strategy: Strategy,
    pub message: String,
    pub persona: String,
    pub project_context: Option<String>,
    pub search_context: Option<String>,
}

impl ExecutionRequest {
    pub fn new(strategy: Strategy, message: impl Into<String>) -> Self {
        Self {
            strategy,
            message: message.into(),
            persona: DEFAULT_PERSONA.to_string(),
            project_context: None,
            search_context: None,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_project_context(mut self, context: impl Into<String>) -> Self {
        self.project_context = Some(context.into());
        self
    }

    pub fn with_search_context(mut self, context: impl Into<String>) -> Self {
        self.search_context = Some(context.into());
        self
    }

    /// The assembled system prompt shared by every mode
    pub(crate) fn base_system(&self) -> String {
        PromptTemplate::system_prompt(
            &self.persona,
            self.project_context.as_deref(),
            self.search_context.as_deref(),
        )
    }

    /// The user prompt for one agent: the message plus any coordinator
    /// guidance the strategy carries
    pub(crate) fn agent_prompt(&self) -> String {
        if self.strategy.agent_instructions.is_empty() {
            self.message.clone()
        } else {
            format!(
                "{}\n\nGuidance from the coordinator: {}",
                self.message, self.strategy.agent_instructions
            )
        }
    }
}

/// Caller-supplied execution budget and cancellation signal
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Per-provider-call budget; exceeding it fails that agent
    pub timeout: Option<Duration>,
    pub cancellation: CancellationToken,
}

/// Where progress events go.
///
/// `wants_chunks` gates text-delta streaming: the buffered path skips
/// `stream_chat` entirely and uses plain `chat`.
pub(crate) trait EventSink: Send + Sync {
    fn emit(&self, event: StreamEvent);

    fn wants_chunks(&self) -> bool {
        true
    }
}

/// Sink for the buffered path: progress events are discarded
pub(crate) struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: StreamEvent) {}

    fn wants_chunks(&self) -> bool {
        false
    }
}

/// Sink for the streaming path.
///
/// When the consumer drops the receiver, the next emit cancels the
/// token, so no provider call beyond the one in flight is issued.
pub(crate) struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamEvent>,
    cancellation: CancellationToken,
}

impl ChannelSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<StreamEvent>, cancellation: CancellationToken) -> Self {
        Self { tx, cancellation }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: StreamEvent) {
        if self.tx.send(event).is_err() {
            self.cancellation.cancel();
        }
    }
}

/// Runs one [`Strategy`] against the providers.
#[derive(Clone)]
pub struct CollaborationExecutor {
    registry: Arc<ProviderRegistry>,
    brain: Arc<BrainSelector>,
    tools: Arc<dyn ToolRunner>,
}

impl CollaborationExecutor {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        brain: Arc<BrainSelector>,
        tools: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            registry,
            brain,
            tools,
        }
    }

    /// Buffered execution: returns the assembled result.
    pub async fn run(
        &self,
        request: &ExecutionRequest,
        options: &ExecutionOptions,
    ) -> Result<CollaborationResult, ExecutorError> {
        self.dispatch(request, options, &NullSink).await
    }

    /// Streaming execution: yields events, terminating with exactly one
    /// `done` or `error`.
    pub fn stream(
        &self,
        request: ExecutionRequest,
        options: ExecutionOptions,
    ) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let executor = self.clone();

        tokio::spawn(async move {
            let sink = ChannelSink::new(tx, options.cancellation.clone());
            sink.emit(StreamEvent::Metadata {
                mode: request.strategy.collaboration_mode,
                agents_used: request.strategy.recommended_agents.clone(),
                search_results_present: request.search_context.is_some(),
            });

            match executor.dispatch(&request, &options, &sink).await {
                Ok(_) => sink.emit(StreamEvent::Done {}),
                Err(e) => sink.emit(StreamEvent::Error {
                    message: e.to_string(),
                }),
            }
        });

        rx
    }

    /// Every mode value dispatches to exactly one algorithm.
    pub(crate) async fn dispatch(
        &self,
        request: &ExecutionRequest,
        options: &ExecutionOptions,
        sink: &dyn EventSink,
    ) -> Result<CollaborationResult, ExecutorError> {
        match request.strategy.collaboration_mode {
            CollaborationMode::Single => single::run(self, request, options, sink).await,
            CollaborationMode::Parallel => parallel::run(self, request, options, sink).await,
            CollaborationMode::Sequential => sequential::run(self, request, options, sink).await,
            CollaborationMode::Debate => debate::run(self, request, options, sink).await,
            CollaborationMode::Voting => voting::run(self, request, options, sink).await,
        }
    }

    /// Resolve recommended agent names to available gateways, keeping
    /// order and capping at `cap`.
    pub(crate) fn resolve_agents(
        &self,
        names: &[String],
        cap: usize,
    ) -> Vec<Arc<dyn ProviderGateway>> {
        let mut agents: Vec<Arc<dyn ProviderGateway>> = names
            .iter()
            .filter_map(|name| self.registry.get(name))
            .filter(|p| p.is_available())
            .collect();
        agents.truncate(cap);
        agents
    }

    pub(crate) fn brain(&self) -> &Arc<BrainSelector> {
        &self.brain
    }

    pub(crate) fn tools(&self) -> &Arc<dyn ToolRunner> {
        &self.tools
    }
}

/// Race a gateway call against the cancellation token and the per-call
/// budget. A timeout is equivalent to that agent failing.
pub(crate) async fn guarded<T, F>(fut: F, options: &ExecutionOptions) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    if options.cancellation.is_cancelled() {
        return Err(GatewayError::Cancelled);
    }

    let bounded = async {
        match options.timeout {
            Some(budget) => tokio::time::timeout(budget, fut)
                .await
                .map_err(|_| GatewayError::Timeout)?,
            None => fut.await,
        }
    };

    tokio::select! {
        _ = options.cancellation.cancelled() => Err(GatewayError::Cancelled),
        result = bounded => result,
    }
}

/// One buffered agent call returning the reply text
pub(crate) async fn chat_text(
    agent: &Arc<dyn ProviderGateway>,
    prompt: &str,
    system: &str,
    options: &ExecutionOptions,
) -> Result<String, GatewayError> {
    let chat_options = ChatOptions::with_system(system);
    let messages = [Message::user(prompt)];
    guarded(agent.chat(&messages, &chat_options), options)
        .await
        .map(|response| response.content)
}

/// One agent call that streams text deltas into the sink when the sink
/// wants them, falling back to a buffered call otherwise. Returns the
/// full reply text either way.
pub(crate) async fn answer_to_sink(
    agent: &Arc<dyn ProviderGateway>,
    prompt: &str,
    system: &str,
    options: &ExecutionOptions,
    sink: &dyn EventSink,
) -> Result<String, GatewayError> {
    if !sink.wants_chunks() {
        return chat_text(agent, prompt, system, options).await;
    }

    let chat_options = ChatOptions::with_system(system);
    let messages = [Message::user(prompt)];

    let consume = async {
        let mut stream = agent.stream_chat(&messages, &chat_options).await?;
        let mut full = String::new();
        while let Some(delta) = stream.recv().await {
            let delta = delta?;
            sink.emit(StreamEvent::Chunk {
                content: delta.clone(),
            });
            full.push_str(&delta);
        }
        Ok(full)
    };

    guarded(consume, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EchoTools, ScriptedGateway};
    use ensemble_domain::Strength;
    use std::time::Duration;

    fn executor_with(gateways: Vec<ScriptedGateway>) -> CollaborationExecutor {
        let registry = Arc::new(ProviderRegistry::new(
            gateways.into_iter().map(|g| g.into_arc()).collect(),
        ));
        let brain = Arc::new(BrainSelector::new(
            Arc::clone(&registry),
            Duration::from_secs(60),
        ));
        CollaborationExecutor::new(registry, brain, Arc::new(EchoTools))
    }

    fn strategy(mode: CollaborationMode, agents: &[&str]) -> Strategy {
        Strategy {
            collaboration_mode: mode,
            recommended_agents: agents.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn dispatch_reaches_every_mode() {
        // Each mode runs end to end against a three-provider fleet
        for mode in CollaborationMode::all() {
            let executor = executor_with(vec![
                ScriptedGateway::new("claude", vec![Strength::Technical]),
                ScriptedGateway::new("gpt", vec![Strength::Creative]),
                ScriptedGateway::new("gemini", vec![Strength::Research]),
            ]);
            let request = ExecutionRequest::new(
                strategy(*mode, &["claude", "gpt", "gemini"]),
                "question",
            );
            let result = executor
                .run(&request, &ExecutionOptions::default())
                .await
                .unwrap();
            assert_eq!(result.mode, *mode);
        }
    }

    #[tokio::test]
    async fn stream_terminates_with_done() {
        let executor = executor_with(vec![ScriptedGateway::new("claude", vec![])]);
        let request = ExecutionRequest::new(
            strategy(CollaborationMode::Single, &["claude"]),
            "question",
        );

        let mut rx = executor.stream(request, ExecutionOptions::default());
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        assert!(matches!(events.first(), Some(StreamEvent::Metadata { .. })));
        assert!(matches!(events.last(), Some(StreamEvent::Done {})));
        let terminals = events.iter().filter(|e| e.is_terminal()).count();
        assert_eq!(terminals, 1);
    }

    #[tokio::test]
    async fn stream_terminates_with_error_on_failure() {
        let executor = executor_with(vec![ScriptedGateway::always_failing("claude")]);
        let request = ExecutionRequest::new(
            strategy(CollaborationMode::Single, &["claude"]),
            "question",
        );

        let mut rx = executor.stream(request, ExecutionOptions::default());
        let mut last = None;
        while let Some(event) = rx.recv().await {
            last = Some(event);
        }
        assert!(matches!(last, Some(StreamEvent::Error { .. })));
    }

    #[tokio::test]
    async fn dropped_consumer_cancels_execution() {
        // A slow gateway keeps the call in flight while the consumer
        // walks away; the next emit after the drop cancels the token.
        let gateway = Arc::new(
            ScriptedGateway::new("claude", vec![]).with_delay(Duration::from_millis(200)),
        );
        let registry = Arc::new(ProviderRegistry::new(vec![
            Arc::clone(&gateway) as Arc<dyn ProviderGateway>
        ]));
        let brain = Arc::new(BrainSelector::new(
            Arc::clone(&registry),
            Duration::from_secs(60),
        ));
        let executor = CollaborationExecutor::new(registry, brain, Arc::new(EchoTools));

        let request = ExecutionRequest::new(
            strategy(CollaborationMode::Single, &["claude"]),
            "question",
        );
        let options = ExecutionOptions::default();
        let token = options.cancellation.clone();

        let mut rx = executor.stream(request, options);
        // Consume only the metadata event, then walk away
        let first = rx.recv().await;
        assert!(matches!(first, Some(StreamEvent::Metadata { .. })));
        drop(rx);

        tokio::time::timeout(Duration::from_secs(2), token.cancelled())
            .await
            .expect("token should be cancelled after consumer drop");
    }

    #[tokio::test]
    async fn guarded_times_out() {
        let options = ExecutionOptions {
            timeout: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, GatewayError>("never".to_string())
        };
        let result = guarded(slow, &options).await;
        assert!(matches!(result, Err(GatewayError::Timeout)));
    }

    #[tokio::test]
    async fn guarded_respects_pre_cancelled_token() {
        let options = ExecutionOptions::default();
        options.cancellation.cancel();
        let result = guarded(
            async { Ok::<_, GatewayError>("value".to_string()) },
            &options,
        )
        .await;
        assert!(matches!(result, Err(GatewayError::Cancelled)));
    }
}
