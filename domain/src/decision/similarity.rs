//! Token-overlap similarity between a new message and past decisions.
//!
//! Pure text math, no I/O. Tokens are lowercased alphanumeric runs;
//! similarity is the share of the query's distinct tokens that also
//! appear in the candidate.

use crate::decision::entities::DecisionLogEntry;
use std::collections::HashSet;

fn tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Overlap ratio in `[0, 1]`: distinct query tokens found in `candidate`
/// divided by distinct query tokens.
pub fn token_overlap(query: &str, candidate: &str) -> f64 {
    let query_tokens = tokens(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let candidate_tokens = tokens(candidate);
    let shared = query_tokens
        .iter()
        .filter(|t| candidate_tokens.contains(*t))
        .count();
    shared as f64 / query_tokens.len() as f64
}

/// Rank past entries by overlap with `query`, descending.
///
/// Entries below `min_overlap` are excluded; at most `k` are returned.
pub fn rank_similar<'a>(
    query: &str,
    entries: &'a [DecisionLogEntry],
    k: usize,
    min_overlap: f64,
) -> Vec<(&'a DecisionLogEntry, f64)> {
    let mut scored: Vec<(&DecisionLogEntry, f64)> = entries
        .iter()
        .map(|e| (e, token_overlap(query, &e.input)))
        .filter(|(_, score)| *score >= min_overlap)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}
