//! Sequential mode: a strict pipeline, each stage refining the last.

use super::{
    CollaborationExecutor, EventSink, ExecutionOptions, ExecutionRequest, ExecutorError,
    answer_to_sink, chat_text,
};
use ensemble_domain::{
    AgentReply, CollaborationMetadata, CollaborationMode, CollaborationResult, PromptTemplate,
    StreamEvent,
};
use tracing::info;

pub(super) async fn run(
    executor: &CollaborationExecutor,
    request: &ExecutionRequest,
    options: &ExecutionOptions,
    sink: &dyn EventSink,
) -> Result<CollaborationResult, ExecutorError> {
    let agents = executor.resolve_agents(&request.strategy.recommended_agents, usize::MAX);
    if agents.is_empty() {
        return Err(ExecutorError::NoAgents);
    }

    let total = agents.len();
    let system = request.base_system();
    let mut stages: Vec<AgentReply> = Vec::with_capacity(total);
    let mut prior: Option<String> = None;

    // Strict chaining: each stage sees the previous stage's complete
    // output, and any stage failure fails the pipeline.
    for (index, agent) in agents.iter().enumerate() {
        info!(
            "Sequential stage {}/{} handled by {}",
            index + 1,
            total,
            agent.name()
        );
        sink.emit(StreamEvent::StepStart {
            step: index + 1,
            total,
            agent: agent.name().to_string(),
        });

        let prompt =
            PromptTemplate::sequential_stage_prompt(&request.message, prior.as_deref(), index, total);

        // Only the final stage's output is user-facing text.
        let is_last = index + 1 == total;
        let content = if is_last {
            answer_to_sink(agent, &prompt, &system, options, sink).await?
        } else {
            chat_text(agent, &prompt, &system, options).await?
        };

        stages.push(AgentReply::new(agent.name(), content.clone()));
        prior = Some(content);
    }

    let content = prior.unwrap_or_default();
    let agents_used = stages.iter().map(|s| s.agent.clone()).collect();
    Ok(CollaborationResult::new(
        content,
        agents_used,
        CollaborationMode::Sequential,
        CollaborationMetadata::Sequential { stages },
    ))
}
