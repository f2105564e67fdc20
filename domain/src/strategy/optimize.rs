//! Deterministic agent-selection re-ranking.
//!
//! The Brain's recommended agent list is a suggestion; this pass enforces
//! the house routing policy against the live provider set before
//! execution. Pure function — the caller supplies the currently available
//! profiles in priority order.

use crate::provider::{ProviderProfile, Strength};
use crate::strategy::entities::{Category, CollaborationMode, Complexity};

const MAX_AGENTS: usize = 4;

/// Re-rank and repair `recommended` for the given classification.
///
/// Guarantees: every returned name references an entry in `available`,
/// the list is unique, has at most four entries, and is non-empty
/// whenever `available` is non-empty.
pub fn optimize_agents(
    recommended: &[String],
    category: Category,
    complexity: Complexity,
    mode: CollaborationMode,
    available: &[ProviderProfile],
) -> Vec<String> {
    // Debate and voting want the widest spread of perspectives, so the
    // parsed list is discarded in favor of everything available.
    if mode.wants_diversity() {
        return available
            .iter()
            .take(MAX_AGENTS)
            .map(|p| p.name.clone())
            .collect();
    }

    let mut agents: Vec<String> = recommended
        .iter()
        .filter(|name| available.iter().any(|p| &p.name == *name))
        .cloned()
        .collect();
    dedup_in_place(&mut agents);

    match category {
        Category::Technical | Category::Conversation => {
            if let Some(lead) = first_with(available, Strength::Technical) {
                promote_to_front(&mut agents, &lead.name);
            }
        }
        Category::Research | Category::Creative => {
            let wanted = if category == Category::Research {
                Strength::Research
            } else {
                Strength::Creative
            };
            if !agents
                .iter()
                .any(|name| has_strength(available, name, wanted))
                && let Some(p) = first_with(available, wanted)
                && !agents.contains(&p.name)
            {
                agents.push(p.name.clone());
            }
        }
        Category::Decision => {}
    }

    if complexity == Complexity::VeryComplex
        && mode != CollaborationMode::Single
        && agents.len() < MAX_AGENTS
        && let Some(p) = first_with(available, Strength::DeepReasoning)
        && !agents.contains(&p.name)
    {
        agents.push(p.name.clone());
    }

    agents.truncate(MAX_AGENTS);

    if agents.is_empty()
        && let Some(first) = available.first()
    {
        agents.push(first.name.clone());
    }

    agents
}

fn first_with(available: &[ProviderProfile], strength: Strength) -> Option<&ProviderProfile> {
    available.iter().find(|p| p.has_strength(strength))
}

fn has_strength(available: &[ProviderProfile], name: &str, strength: Strength) -> bool {
    available
        .iter()
        .any(|p| p.name == name && p.has_strength(strength))
}

fn promote_to_front(agents: &mut Vec<String>, name: &str) {
    if let Some(pos) = agents.iter().position(|n| n == name) {
        let lead = agents.remove(pos);
        agents.insert(0, lead);
    } else {
        agents.insert(0, name.to_string());
        agents.truncate(MAX_AGENTS);
    }
}

fn dedup_in_place(agents: &mut Vec<String>) {
    let mut seen = Vec::new();
    agents.retain(|name| {
        if seen.contains(name) {
            false
        } else {
            seen.push(name.clone());
            true
        }
    });
}
