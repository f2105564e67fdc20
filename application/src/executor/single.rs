//! Single mode: one agent answers, with bounded failover.

use super::{
    CollaborationExecutor, EventSink, ExecutionOptions, ExecutionRequest, ExecutorError,
    answer_to_sink,
};
use ensemble_domain::{
    CollaborationMetadata, CollaborationMode, CollaborationResult, StreamEvent, parse_tool_calls,
    render_tool_failure, render_tool_result,
};
use tracing::{info, warn};

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

    let system = request.base_system();
    let prompt = request.agent_prompt();
    let mut attempts = Vec::new();

    // Walk the recommended list in order; the first success wins.
    for agent in &agents {
        attempts.push(agent.name().to_string());

        match answer_to_sink(agent, &prompt, &system, options, sink).await {
            Ok(mut content) => {
                info!("Single mode answered by {}", agent.name());

                // Tool pass runs after generation completes; results are
                // appended to the reply, and failures are never fatal.
                for call in parse_tool_calls(&content) {
                    let appended = match executor.tools().run(&call).await {
                        Ok(output) => render_tool_result(&call, &output),
                        Err(e) => {
                            warn!("Tool {} failed: {}", call.name, e);
                            render_tool_failure(&call, &e.to_string())
                        }
                    };
                    if sink.wants_chunks() {
                        sink.emit(StreamEvent::Chunk {
                            content: appended.clone(),
                        });
                    }
                    content.push_str(&appended);
                }

                return Ok(CollaborationResult::new(
                    content,
                    vec![agent.name().to_string()],
                    CollaborationMode::Single,
                    CollaborationMetadata::Single { attempts },
                ));
            }
            Err(e) if e.is_cancelled() => return Err(ExecutorError::Cancelled),
            Err(e) => {
                warn!("Agent {} failed in single mode: {}", agent.name(), e);
            }
        }
    }

    Err(ExecutorError::AllAgentsFailed)
}
