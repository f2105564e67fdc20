//! Debate mode: independent opinions, one revision round, a Brain ruling.

use super::{
    CollaborationExecutor, EventSink, ExecutionOptions, ExecutionRequest, ExecutorError,
    answer_to_sink, chat_text,
};
use ensemble_domain::{
    AgentReply, CollaborationMetadata, CollaborationMode, CollaborationResult, DebateRecord,
    PromptTemplate, StreamEvent,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Debate panel size cap
const PANEL_CAP: usize = 3;

pub(super) async fn run(
    executor: &CollaborationExecutor,
    request: &ExecutionRequest,
    options: &ExecutionOptions,
    sink: &dyn EventSink,
) -> Result<CollaborationResult, ExecutorError> {
    let agents = executor.resolve_agents(&request.strategy.recommended_agents, PANEL_CAP);
    if agents.is_empty() {
        return Err(ExecutorError::NoAgents);
    }
    info!("Debate among {} agents", agents.len());

    let system = request.base_system();

    // Round 0: independent opinions, concurrently.
    sink.emit(StreamEvent::DebateRound { round: 0 });
    let mut join_set = JoinSet::new();
    for agent in &agents {
        sink.emit(StreamEvent::DebateOpinionStart {
            agent: agent.name().to_string(),
        });
        let agent = Arc::clone(agent);
        let prompt = PromptTemplate::debate_opinion_prompt(&request.message);
        let system = system.clone();
        let options = options.clone();
        join_set.spawn(async move {
            let reply = chat_text(&agent, &prompt, &system, &options).await;
            (agent.name().to_string(), reply)
        });
    }

    let mut cancelled = false;
    let mut collected: Vec<AgentReply> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((agent, Ok(content))) => collected.push(AgentReply::new(agent, content)),
            Ok((agent, Err(e))) => {
                if e.is_cancelled() {
                    cancelled = true;
                }
                warn!("Agent {} failed in debate round 0: {}", agent, e);
            }
            Err(e) => warn!("Debate task panicked: {}", e),
        }
    }
    if cancelled || options.cancellation.is_cancelled() {
        return Err(ExecutorError::Cancelled);
    }
    if collected.is_empty() {
        return Err(ExecutorError::AllAgentsFailed);
    }

    // Restore panel order; round-0 survivors are the participants from
    // here on.
    let mut round0: Vec<AgentReply> = Vec::with_capacity(collected.len());
    for agent in &agents {
        if let Some(pos) = collected.iter().position(|r| r.agent == agent.name()) {
            round0.push(collected.swap_remove(pos));
        }
    }

    // Round 1: each participant revises after seeing everyone else.
    sink.emit(StreamEvent::DebateRound { round: 1 });
    let mut join_set = JoinSet::new();
    for reply in &round0 {
        sink.emit(StreamEvent::DebateOpinionStart {
            agent: reply.agent.clone(),
        });
        let Some(agent) = executor.resolve_agents(&[reply.agent.clone()], 1).pop() else {
            continue;
        };
        let peers: Vec<(String, String)> = round0
            .iter()
            .filter(|r| r.agent != reply.agent)
            .map(|r| (r.agent.clone(), r.content.clone()))
            .collect();
        let prompt = PromptTemplate::debate_revision_prompt(&request.message, &peers);
        let system = system.clone();
        let options = options.clone();
        join_set.spawn(async move {
            let reply = chat_text(&agent, &prompt, &system, &options).await;
            (agent.name().to_string(), reply)
        });
    }

    let mut revised: Vec<(String, String)> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((agent, Ok(content))) => revised.push((agent, content)),
            Ok((agent, Err(e))) => {
                if e.is_cancelled() {
                    cancelled = true;
                }
                warn!("Agent {} failed in debate round 1: {}", agent, e);
            }
            Err(e) => warn!("Debate task panicked: {}", e),
        }
    }
    // The consumer may have dropped mid-collection; stop before the Brain
    // issues any further call.
    if cancelled || options.cancellation.is_cancelled() {
        return Err(ExecutorError::Cancelled);
    }

    // A participant whose revision failed keeps its round-0 opinion, so
    // both rounds cover the same panel.
    let round1: Vec<AgentReply> = round0
        .iter()
        .map(|original| {
            let content = revised
                .iter()
                .find(|(agent, _)| *agent == original.agent)
                .map(|(_, content)| content.clone())
                .unwrap_or_else(|| original.content.clone());
            AgentReply::new(original.agent.clone(), content)
        })
        .collect();

    let rounds = vec![
        DebateRecord {
            round: 0,
            opinions: round0,
        },
        DebateRecord {
            round: 1,
            opinions: round1,
        },
    ];

    // Final ruling by the current Brain.
    let brain = executor
        .brain()
        .select()
        .await
        .map_err(|_| ExecutorError::AllProvidersUnavailable)?;
    sink.emit(StreamEvent::SynthesisStart {});

    let round_pairs: Vec<Vec<(String, String)>> = rounds
        .iter()
        .map(|record| {
            record
                .opinions
                .iter()
                .map(|o| (o.agent.clone(), o.content.clone()))
                .collect()
        })
        .collect();
    let ruling_prompt = PromptTemplate::debate_ruling_prompt(&request.message, &round_pairs);
    let content = answer_to_sink(
        &brain,
        &ruling_prompt,
        PromptTemplate::debate_ruling_system(),
        options,
        sink,
    )
    .await?;

    let agents_used: Vec<String> = rounds[0].opinions.iter().map(|o| o.agent.clone()).collect();
    Ok(CollaborationResult::new(
        content,
        agents_used,
        CollaborationMode::Debate,
        CollaborationMetadata::Debate { rounds },
    ))
}
