//! Prompt templates for the routing and collaboration flow.
//!
//! Exact wording is a policy detail, not a contract; what matters is the
//! structure each template guarantees (the THINKING/DECISION markers and
//! JSON shape for routing, the CHOICE line for voting).

use crate::decision::patterns::ModePattern;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Assemble the system prompt: persona first, then project context,
    /// then web-search context, each only when present.
    pub fn system_prompt(
        persona: &str,
        project_context: Option<&str>,
        search_context: Option<&str>,
    ) -> String {
        let mut parts = vec![persona.to_string()];
        if let Some(project) = project_context {
            parts.push(format!("Project context:\n{}", project));
        }
        if let Some(search) = search_context {
            parts.push(format!("Web search results:\n{}", search));
        }
        parts.join("\n\n")
    }

    /// System prompt for the routing call
    pub fn routing_system() -> &'static str {
        r#"You are the coordinator of a team of AI providers.
Your task is to classify the user's request and decide how to distribute it
across the team. First narrate your reasoning, then your decision, then emit
the decision as JSON. Be decisive; pick the simplest mode that fits."#
    }

    /// User prompt for the routing call.
    ///
    /// The Brain is instructed to emit `THINKING:` and `DECISION:` narrative
    /// sections followed by one JSON object with the strategy fields.
    pub fn routing_prompt(
        message: &str,
        transcript: &str,
        capability_table: &str,
        patterns: &[ModePattern],
        similar_examples: &[(String, f64)],
        memory_matches: &[String],
    ) -> String {
        let mut prompt = format!(
            r#"User request:
{}

Available providers and their capabilities:
{}
"#,
            message, capability_table
        );

        if !transcript.is_empty() {
            prompt.push_str(&format!("\nRecent conversation:\n{}\n", transcript));
        }

        if !memory_matches.is_empty() {
            prompt.push_str("\nRelevant long-term memory:\n");
            for m in memory_matches {
                prompt.push_str(&format!("- {}\n", m));
            }
        }

        if !patterns.is_empty() {
            prompt.push_str("\nHistorical mode usage:\n");
            for p in patterns {
                prompt.push_str(&format!("- {}\n", p.summary()));
            }
        }

        if !similar_examples.is_empty() {
            prompt.push_str("\nSimilar past requests (overlap score):\n");
            for (input, score) in similar_examples {
                prompt.push_str(&format!("- ({:.2}) {}\n", score, input));
            }
        }

        prompt.push_str(
            r#"
Respond in exactly this layout:

THINKING: <your reasoning about the request>
DECISION: <the routing decision and why>

{"complexity": "simple|moderate|complex|very_complex",
 "category": "conversation|technical|creative|research|decision",
 "needsWebSearch": true or false,
 "collaborationMode": "single|parallel|sequential|debate|voting",
 "recommendedAgents": ["provider", "..."],
 "reasoning": "<one sentence>",
 "agentInstructions": "<guidance for the agents, optional>"}"#,
        );

        prompt
    }

    /// System prompt for one fan-out agent in parallel mode
    pub fn parallel_role_system(base_system: &str, role_hint: &str) -> String {
        format!(
            "{}\n\nYou are answering as a {}. Focus on the aspects your role covers best.",
            base_system, role_hint
        )
    }

    /// System prompt for the synthesis call (parallel mode)
    pub fn synthesis_system() -> &'static str {
        r#"You are synthesizing several expert answers into one.
Do not merely concatenate them: where the answers disagree, adjudicate —
decide which position is better supported and say so. Produce a single
coherent answer the user can act on."#
    }

    /// User prompt for the synthesis call
    pub fn synthesis_prompt(message: &str, responses: &[(String, String)]) -> String {
        let mut prompt = format!("Original request: {}\n\nAgent answers:\n", message);
        for (agent, content) in responses {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", agent, content));
        }
        prompt.push_str("\nSynthesize one final answer.");
        prompt
    }

    /// User prompt for stage `step` of a sequential pipeline.
    ///
    /// Each stage after the first receives the full prior output verbatim.
    pub fn sequential_stage_prompt(
        message: &str,
        prior_output: Option<&str>,
        step: usize,
        total: usize,
    ) -> String {
        match prior_output {
            None => format!(
                "Original request: {}\n\nYou are stage 1 of {}. Produce the best draft you can.",
                message, total
            ),
            Some(prior) => format!(
                "Original request: {}\n\nYou are stage {} of {}. Improve and extend the work so far:\n\n{}",
                message,
                step + 1,
                total,
                prior
            ),
        }
    }

    /// User prompt for an independent round-0 debate opinion
    pub fn debate_opinion_prompt(topic: &str) -> String {
        format!(
            "Topic under debate: {}\n\nGive your independent opinion with your strongest arguments. Do not hedge.",
            topic
        )
    }

    /// User prompt for the round-1 revision after seeing all opinions
    pub fn debate_revision_prompt(topic: &str, opinions: &[(String, String)]) -> String {
        let mut prompt = format!(
            "Topic under debate: {}\n\nThe other participants argued:\n",
            topic
        );
        for (agent, opinion) in opinions {
            prompt.push_str(&format!("\n--- {} ---\n{}\n", agent, opinion));
        }
        prompt.push_str(
            "\nRevise your opinion in light of the above. You may hold your position or change it; either way, engage with the strongest opposing argument.",
        );
        prompt
    }

    /// System prompt for the Brain's final debate ruling
    pub fn debate_ruling_system() -> &'static str {
        r#"You are the judge of a structured debate.
Issue a final ruling. You may side with a minority opinion if its argument
is stronger — do not average the views. Justify your choice explicitly."#
    }

    /// User prompt for the final debate ruling
    pub fn debate_ruling_prompt(topic: &str, rounds: &[Vec<(String, String)>]) -> String {
        let mut prompt = format!("Topic: {}\n", topic);
        for (i, round) in rounds.iter().enumerate() {
            prompt.push_str(&format!("\nRound {} opinions:\n", i));
            for (agent, opinion) in round {
                prompt.push_str(&format!("\n--- {} ---\n{}\n", agent, opinion));
            }
        }
        prompt.push_str("\nIssue your ruling.");
        prompt
    }

    /// User prompt for a voting-mode opinion.
    ///
    /// The trailing CHOICE line is the discrete vote the tally parses.
    pub fn voting_opinion_prompt(topic: &str) -> String {
        format!(
            r#"Question to vote on: {}

Give your opinion, then end your reply with exactly one line of the form:
CHOICE: <your choice in a few words>"#,
            topic
        )
    }

    /// System prompt for the Brain's vote tally
    pub fn voting_tally_system() -> &'static str {
        r#"You are tallying the votes of a provider panel.
Count the choices and issue a final verdict. You may override a numeric
majority if you judge the minority argument stronger, but you must state
your reasoning either way."#
    }

    /// User prompt for the vote tally
    pub fn voting_tally_prompt(topic: &str, votes: &[(String, String, String)]) -> String {
        let mut prompt = format!("Question: {}\n\nVotes:\n", topic);
        for (agent, choice, opinion) in votes {
            prompt.push_str(&format!(
                "\n--- {} voted: {} ---\n{}\n",
                agent, choice, opinion
            ));
        }
        prompt.push_str("\nTally the votes and issue the final verdict.");
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::entities::CollaborationMode;

    #[test]
    fn system_prompt_orders_sections() {
        let prompt = PromptTemplate::system_prompt(
            "You are helpful.",
            Some("a Rust workspace"),
            Some("three results"),
        );
        let persona = prompt.find("You are helpful.").unwrap();
        let project = prompt.find("Project context:").unwrap();
        let search = prompt.find("Web search results:").unwrap();
        assert!(persona < project && project < search);
    }

    #[test]
    fn system_prompt_skips_absent_sections() {
        let prompt = PromptTemplate::system_prompt("Persona.", None, None);
        assert_eq!(prompt, "Persona.");
    }

    #[test]
    fn routing_prompt_embeds_context() {
        let patterns = vec![ModePattern {
            mode: CollaborationMode::Single,
            count: 4,
            top_agents: vec!["claude".to_string()],
        }];
        let similar = vec![("how do I fix the build".to_string(), 0.67)];
        let prompt = PromptTemplate::routing_prompt(
            "why does my build fail?",
            "user: hi\nassistant: hello",
            "claude: technical",
            &patterns,
            &similar,
            &["user prefers concise answers".to_string()],
        );
        assert!(prompt.contains("why does my build fail?"));
        assert!(prompt.contains("claude: technical"));
        assert!(prompt.contains("used 4 times"));
        assert!(prompt.contains("0.67"));
        assert!(prompt.contains("THINKING:"));
        assert!(prompt.contains("collaborationMode"));
    }

    #[test]
    fn voting_prompt_demands_choice_line() {
        let prompt = PromptTemplate::voting_opinion_prompt("tabs or spaces?");
        assert!(prompt.contains("CHOICE:"));
    }

    #[test]
    fn debate_revision_includes_peers() {
        let opinions = vec![("gpt".to_string(), "tabs are faster".to_string())];
        let prompt = PromptTemplate::debate_revision_prompt("tabs or spaces?", &opinions);
        assert!(prompt.contains("gpt"));
        assert!(prompt.contains("tabs are faster"));
    }

    #[test]
    fn synthesis_system_forbids_concatenation() {
        assert!(PromptTemplate::synthesis_system().contains("concatenate"));
    }
}
