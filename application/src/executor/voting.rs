//! Voting mode: every agent votes, the Brain tallies and rules.

use super::{
    CollaborationExecutor, EventSink, ExecutionOptions, ExecutionRequest, ExecutorError,
    answer_to_sink, chat_text,
};
use ensemble_domain::{
    CollaborationMetadata, CollaborationMode, CollaborationResult, PromptTemplate, StreamEvent,
    VoteRecord,
};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Panel size cap for a vote
const PANEL_CAP: usize = 4;

/// A ballot that names no choice counts as an abstention.
const ABSTAIN: &str = "abstain";

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
    info!("Voting across {} agents", agents.len());

    let system = request.base_system();

    let mut join_set = JoinSet::new();
    for agent in &agents {
        let agent = Arc::clone(agent);
        let prompt = PromptTemplate::voting_opinion_prompt(&request.message);
        let system = system.clone();
        let options = options.clone();
        join_set.spawn(async move {
            let reply = chat_text(&agent, &prompt, &system, &options).await;
            (agent.name().to_string(), reply)
        });
    }

    let mut cancelled = false;
    let mut collected: Vec<VoteRecord> = Vec::new();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((agent, Ok(content))) => {
                let choice = parse_choice(&content);
                sink.emit(StreamEvent::AgentResponse {
                    agent: agent.clone(),
                    content: content.clone(),
                });
                collected.push(VoteRecord {
                    agent,
                    choice,
                    opinion: content,
                });
            }
            Ok((agent, Err(e))) => {
                if e.is_cancelled() {
                    cancelled = true;
                }
                warn!("Agent {} failed to vote: {}", agent, e);
            }
            Err(e) => warn!("Voting task panicked: {}", e),
        }
    }
    // The consumer may have dropped mid-collection; stop before the Brain
    // issues any further call.
    if cancelled || options.cancellation.is_cancelled() {
        return Err(ExecutorError::Cancelled);
    }
    if collected.is_empty() {
        return Err(ExecutorError::AllAgentsFailed);
    }

    // Keep panel order for the tally
    let mut votes: Vec<VoteRecord> = Vec::with_capacity(collected.len());
    for agent in &agents {
        if let Some(pos) = collected.iter().position(|v| v.agent == agent.name()) {
            votes.push(collected.swap_remove(pos));
        }
    }

    // The Brain tallies; it may override a numeric majority.
    let brain = executor
        .brain()
        .select()
        .await
        .map_err(|_| ExecutorError::AllProvidersUnavailable)?;
    sink.emit(StreamEvent::VotingTallyStart {});

    let ballots: Vec<(String, String, String)> = votes
        .iter()
        .map(|v| (v.agent.clone(), v.choice.clone(), v.opinion.clone()))
        .collect();
    let tally_prompt = PromptTemplate::voting_tally_prompt(&request.message, &ballots);
    let content = answer_to_sink(
        &brain,
        &tally_prompt,
        PromptTemplate::voting_tally_system(),
        options,
        sink,
    )
    .await?;

    let agents_used: Vec<String> = votes.iter().map(|v| v.agent.clone()).collect();
    Ok(CollaborationResult::new(
        content,
        agents_used,
        CollaborationMode::Voting,
        CollaborationMetadata::Voting { votes },
    ))
}

/// Extract the discrete choice from a ballot: the last `CHOICE:` line,
/// case-insensitive. A missing or empty choice is an abstention.
fn parse_choice(ballot: &str) -> String {
    ballot
        .lines()
        .rev()
        .find_map(|line| {
            let trimmed = line.trim();
            if let Some(head) = trimmed.get(..7)
                && head.eq_ignore_ascii_case("choice:")
            {
                Some(trimmed[7..].trim().to_string())
            } else {
                None
            }
        })
        .filter(|choice| !choice.is_empty())
        .unwrap_or_else(|| ABSTAIN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::BrainSelector;
    use crate::ports::provider_gateway::ProviderGateway;
    use crate::registry::ProviderRegistry;
    use crate::test_support::{CancelOnEvent, EchoTools, ScriptedGateway};
    use ensemble_domain::Strategy;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn executor_over(gateways: Vec<Arc<ScriptedGateway>>) -> CollaborationExecutor {
        let registry = Arc::new(ProviderRegistry::new(
            gateways
                .into_iter()
                .map(|g| g as Arc<dyn ProviderGateway>)
                .collect(),
        ));
        let brain = Arc::new(BrainSelector::new(
            Arc::clone(&registry),
            Duration::from_secs(60),
        ));
        CollaborationExecutor::new(registry, brain, Arc::new(EchoTools))
    }

    fn request(agents: &[&str]) -> ExecutionRequest {
        let strategy = Strategy {
            collaboration_mode: CollaborationMode::Voting,
            recommended_agents: agents.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        };
        ExecutionRequest::new(strategy, "tabs or spaces?")
    }

    #[test]
    fn choice_line_is_parsed() {
        assert_eq!(parse_choice("I lean tabs.\nCHOICE: tabs"), "tabs");
        assert_eq!(parse_choice("choice: spaces"), "spaces");
        // The last choice line wins
        assert_eq!(parse_choice("CHOICE: tabs\nCHOICE: spaces"), "spaces");
    }

    #[test]
    fn missing_choice_is_abstention() {
        assert_eq!(parse_choice("I refuse to answer."), "abstain");
        assert_eq!(parse_choice("CHOICE:"), "abstain");
        assert_eq!(parse_choice(""), "abstain");
    }

    #[tokio::test]
    async fn votes_are_tallied_by_the_brain() {
        let claude = Arc::new(ScriptedGateway::new("claude", vec![]).with_replies(vec![
            Ok("Tabs align.\nCHOICE: tabs".into()),
            Ok("the verdict: tabs".into()),
        ]));
        let gpt = Arc::new(
            ScriptedGateway::new("gpt", vec![])
                .with_replies(vec![Ok("Spaces render everywhere.\nCHOICE: spaces".into())]),
        );
        let executor = executor_over(vec![Arc::clone(&claude), gpt]);

        let result = executor
            .run(&request(&["claude", "gpt"]), &ExecutionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.content, "the verdict: tabs");
        assert_eq!(result.agents_used, vec!["claude", "gpt"]);
        match result.metadata {
            CollaborationMetadata::Voting { votes } => {
                assert_eq!(votes.len(), 2);
                assert_eq!(votes[0].choice, "tabs");
                assert_eq!(votes[1].choice, "spaces");
            }
            other => panic!("unexpected metadata: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ballot_without_choice_becomes_abstention() {
        let claude = Arc::new(ScriptedGateway::new("claude", vec![]).with_replies(vec![
            Ok("I see merit in both.".into()),
            Ok("verdict".into()),
        ]));
        let executor = executor_over(vec![claude]);

        let result = executor
            .run(&request(&["claude"]), &ExecutionOptions::default())
            .await
            .unwrap();
        match result.metadata {
            CollaborationMetadata::Voting { votes } => {
                assert_eq!(votes[0].choice, "abstain");
            }
            other => panic!("unexpected metadata: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_voters_are_dropped_from_the_tally() {
        let claude = Arc::new(ScriptedGateway::new("claude", vec![]).with_replies(vec![
            Ok("CHOICE: tabs".into()),
            Ok("verdict".into()),
        ]));
        let gpt = Arc::new(ScriptedGateway::always_failing("gpt"));
        let executor = executor_over(vec![claude, gpt]);

        let result = executor
            .run(&request(&["claude", "gpt"]), &ExecutionOptions::default())
            .await
            .unwrap();
        match result.metadata {
            CollaborationMetadata::Voting { votes } => {
                assert_eq!(votes.len(), 1);
                assert_eq!(votes[0].agent, "claude");
            }
            other => panic!("unexpected metadata: {other:?}"),
        }
    }

    #[tokio::test]
    async fn all_voters_failing_is_an_error() {
        let executor = executor_over(vec![
            Arc::new(ScriptedGateway::always_failing("claude")),
            Arc::new(ScriptedGateway::always_failing("gpt")),
        ]);

        let result = executor
            .run(&request(&["claude", "gpt"]), &ExecutionOptions::default())
            .await;
        assert!(matches!(result, Err(ExecutorError::AllAgentsFailed)));
    }

    #[tokio::test]
    async fn consumer_drop_before_tally_skips_the_brain() {
        let claude = Arc::new(
            ScriptedGateway::new("claude", vec![]).with_replies(vec![Ok("CHOICE: tabs".into())]),
        );
        let executor = executor_over(vec![Arc::clone(&claude)]);
        let options = ExecutionOptions::default();
        let sink = CancelOnEvent {
            token: options.cancellation.clone(),
            matches: |e| matches!(e, StreamEvent::AgentResponse { .. }),
        };

        let result = run(&executor, &request(&["claude"]), &options, &sink).await;

        assert!(matches!(result, Err(ExecutorError::Cancelled)));
        // The ballot call only: no tally call, no Brain health probe.
        assert_eq!(claude.call_count(), 1);
        assert_eq!(claude.health_checks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn streaming_announces_the_tally() {
        let claude = Arc::new(ScriptedGateway::new("claude", vec![]).with_replies(vec![
            Ok("CHOICE: tabs".into()),
            Ok("verdict".into()),
        ]));
        let executor = executor_over(vec![claude]);

        let mut rx = executor.stream(request(&["claude"]), ExecutionOptions::default());
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }

        let tally_at = events
            .iter()
            .position(|e| matches!(e, StreamEvent::VotingTallyStart {}))
            .unwrap();
        let chunk_at = events
            .iter()
            .position(|e| matches!(e, StreamEvent::Chunk { .. }))
            .unwrap();
        assert!(tally_at < chunk_at);
        assert!(matches!(events.last(), Some(StreamEvent::Done {})));
    }
}
