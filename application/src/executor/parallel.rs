//! Parallel mode: concurrent fan-out, then one Brain synthesis.

use super::{
    CollaborationExecutor, EventSink, ExecutionOptions, ExecutionRequest, ExecutorError,
    answer_to_sink, chat_text,
};
use ensemble_domain::{
    AgentReply, CollaborationMetadata, CollaborationMode, CollaborationResult, PromptTemplate,
    StreamEvent,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Fan-out width cap. Synthesis quality degrades past this.
const FAN_OUT_CAP: usize = 3;

pub(super) async fn run(
    executor: &CollaborationExecutor,
    request: &ExecutionRequest,
    options: &ExecutionOptions,
    sink: &dyn EventSink,
) -> Result<CollaborationResult, ExecutorError> {
    let agents = executor.resolve_agents(&request.strategy.recommended_agents, FAN_OUT_CAP);
    if agents.is_empty() {
        return Err(ExecutorError::NoAgents);
    }
    info!("Parallel fan-out across {} agents", agents.len());

    let base_system = request.base_system();
    let prompt = request.agent_prompt();

    let mut join_set = JoinSet::new();
    for agent in &agents {
        let agent = Arc::clone(agent);
        let system = PromptTemplate::parallel_role_system(&base_system, &agent.profile().role_hint());
        let prompt = prompt.clone();
        let options = options.clone();
        join_set.spawn(async move {
            let reply = chat_text(&agent, &prompt, &system, &options).await;
            (agent.name().to_string(), reply)
        });
    }

    // All-settled join: one slow or failing agent never blocks the rest.
    let mut responses = Vec::new();
    let mut cancelled = false;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((agent, Ok(content))) => {
                sink.emit(StreamEvent::AgentResponse {
                    agent: agent.clone(),
                    content: content.clone(),
                });
                responses.push(AgentReply::new(agent, content));
            }
            Ok((agent, Err(e))) => {
                if e.is_cancelled() {
                    cancelled = true;
                }
                warn!("Agent {} failed in parallel mode: {}", agent, e);
            }
            Err(e) => warn!("Fan-out task panicked: {}", e),
        }
    }

    // The consumer may have dropped mid-collection; stop before the Brain
    // issues any further call.
    if cancelled || options.cancellation.is_cancelled() {
        return Err(ExecutorError::Cancelled);
    }
    if responses.is_empty() {
        return Err(ExecutorError::AllAgentsFailed);
    }

    // Synthesis by the current Brain, streamed to the consumer.
    let brain = executor
        .brain()
        .select()
        .await
        .map_err(|_| ExecutorError::AllProvidersUnavailable)?;
    sink.emit(StreamEvent::SynthesisStart {});

    let pairs: Vec<(String, String)> = responses
        .iter()
        .map(|r| (r.agent.clone(), r.content.clone()))
        .collect();
    let synthesis_prompt = PromptTemplate::synthesis_prompt(&request.message, &pairs);
    let content = answer_to_sink(
        &brain,
        &synthesis_prompt,
        PromptTemplate::synthesis_system(),
        options,
        sink,
    )
    .await?;

    let agents_used: Vec<String> = responses.iter().map(|r| r.agent.clone()).collect();
    Ok(CollaborationResult::new(
        content,
        agents_used,
        CollaborationMode::Parallel,
        CollaborationMetadata::Parallel { responses },
    ))
}
