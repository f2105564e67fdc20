//! One user turn end to end: analyze, execute, persist.

use crate::analyzer::{AnalyzeError, StrategyAnalyzer};
use crate::executor::{
    CollaborationExecutor, ExecutionOptions, ExecutionRequest, ExecutorError,
};
use crate::ports::decision_store::{DecisionStore, StoreError};
use crate::ports::memory_store::MemoryStore;
use ensemble_domain::{CollaborationResult, DecisionLogEntry, Role, Strategy, StreamEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::warn;

/// Decision type under which completed turns are logged
const TURN_DECISION: &str = "turn";

/// Errors that can occur while running a turn
#[derive(Error, Debug)]
pub enum TurnError {
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),

    #[error(transparent)]
    Execute(#[from] ExecutorError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// One incoming user turn
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
    pub persona: Option<String>,
    pub project_context: Option<String>,
    pub search_context: Option<String>,
}

impl TurnRequest {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            message: message.into(),
            persona: None,
            project_context: None,
            search_context: None,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
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

    fn to_execution(&self, strategy: Strategy) -> ExecutionRequest {
        let mut request = ExecutionRequest::new(strategy, self.message.clone());
        if let Some(persona) = &self.persona {
            request = request.with_persona(persona.clone());
        }
        if let Some(project) = &self.project_context {
            request = request.with_project_context(project.clone());
        }
        if let Some(search) = &self.search_context {
            request = request.with_search_context(search.clone());
        }
        request
    }
}

/// Drives one turn: routing analysis, collaboration execution, then the
/// conversation and memory writes.
///
/// Persistence failures after a successful answer are logged and
/// swallowed; the user still gets the answer.
#[derive(Clone)]
pub struct Orchestrator {
    analyzer: Arc<StrategyAnalyzer>,
    executor: CollaborationExecutor,
    decisions: Arc<dyn DecisionStore>,
    memory: Arc<dyn MemoryStore>,
}

impl Orchestrator {
    pub fn new(
        analyzer: Arc<StrategyAnalyzer>,
        executor: CollaborationExecutor,
        decisions: Arc<dyn DecisionStore>,
        memory: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            analyzer,
            executor,
            decisions,
            memory,
        }
    }

    /// Buffered turn: returns the assembled result.
    pub async fn run_turn(
        &self,
        request: &TurnRequest,
        options: &ExecutionOptions,
    ) -> Result<CollaborationResult, TurnError> {
        let strategy = self
            .analyzer
            .analyze(&request.user_id, &request.session_id, &request.message)
            .await?;

        let execution = request.to_execution(strategy);
        let result = self.executor.run(&execution, options).await?;

        self.finish_turn(request, &execution.strategy, &result.content, &result.agents_used)
            .await;
        Ok(result)
    }

    /// Streaming turn: yields events, terminating with exactly one `done`
    /// or `error`. An analysis failure surfaces as the single `error`
    /// event.
    pub fn stream_turn(
        &self,
        request: TurnRequest,
        options: ExecutionOptions,
    ) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let orchestrator = self.clone();

        tokio::spawn(async move {
            let strategy = match orchestrator
                .analyzer
                .analyze(&request.user_id, &request.session_id, &request.message)
                .await
            {
                Ok(strategy) => strategy,
                Err(e) => {
                    let _ = tx.send(StreamEvent::Error {
                        message: e.to_string(),
                    });
                    return;
                }
            };

            let execution = request.to_execution(strategy);
            let agents = execution.strategy.recommended_agents.clone();
            let strategy = execution.strategy.clone();
            let mut inner = orchestrator.executor.stream(execution, options);

            let mut content = String::new();
            let mut completed = false;
            while let Some(event) = inner.recv().await {
                if let StreamEvent::Chunk { content: delta } = &event {
                    content.push_str(delta);
                }
                if matches!(event, StreamEvent::Done {}) {
                    completed = true;
                }
                if tx.send(event).is_err() {
                    // Consumer left; the executor's own sink handles
                    // cancellation, nothing to persist
                    return;
                }
            }

            if completed {
                orchestrator
                    .finish_turn(&request, &strategy, &content, &agents)
                    .await;
            }
        });

        rx
    }

    /// Persist a completed turn: conversation log entry plus long-term
    /// memory for both sides of the exchange.
    async fn finish_turn(
        &self,
        request: &TurnRequest,
        strategy: &Strategy,
        content: &str,
        agents_used: &[String],
    ) {
        let entry = DecisionLogEntry::new(
            &request.user_id,
            &request.session_id,
            TURN_DECISION,
            &request.message,
        )
        .with_process(serde_json::json!({ "strategy": strategy }))
        .with_output(content)
        .with_providers(agents_used.to_vec());
        if let Err(e) = self.decisions.log(entry).await {
            warn!("Failed to log turn: {}", e);
        }

        if let Err(e) = self
            .memory
            .remember(&request.user_id, &request.session_id, Role::User, &request.message)
            .await
        {
            warn!("Failed to remember user message: {}", e);
        }
        if let Err(e) = self
            .memory
            .remember(&request.user_id, &request.session_id, Role::Assistant, content)
            .await
        {
            warn!("Failed to remember assistant reply: {}", e);
        }
    }
}
