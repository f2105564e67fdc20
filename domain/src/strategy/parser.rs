//! Strategy extraction from free-form Brain replies.
//!
//! The Brain is asked to narrate its thinking, narrate its decision, and
//! then emit the strategy as JSON. Replies in the wild mix prose, fenced
//! blocks, and literal braces inside string values, so extraction is
//! layered — pure text processing, no I/O:
//!
//! 1. A fenced block tagged `json`, if present, is parsed directly.
//! 2. Otherwise a brace-depth scan finds the *first complete* top-level
//!    object, ignoring braces inside quoted strings.
//! 3. Narrative `THINKING:` / `DECISION:` sections are merged in only
//!    when the JSON omits them.

use crate::core::error::DomainError;
use crate::strategy::entities::Strategy;

/// Extract the contents of the first fenced block tagged `json`.
pub fn extract_fenced_json(text: &str) -> Option<&str> {
    let start_tag = text.find("```json")?;
    let body = &text[start_tag + "```json".len()..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Find the first complete top-level JSON object in `text`.
///
/// Scans left to right with a brace-depth counter and an in-string flag
/// with escape awareness. Braces inside quoted strings are ignored, so an
/// input like `{"a":"x } y"}` followed by more `{...}` text yields exactly
/// the first object — unlike a naive first-`{`-to-last-`}` match, which
/// over-captures across objects and surrounding prose.
pub fn extract_first_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        let s = start?;
                        return Some(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    None
}

/// Byte offset of the first ASCII-case-insensitive match of `needle`.
///
/// `needle` must be ASCII, so a match can only start on an ASCII byte and
/// the returned offset is always a char boundary of `haystack`. Unicode
/// case folding is deliberately avoided here: it can change byte lengths
/// and would misalign offsets against the original text.
fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Extract a labeled narrative section.
///
/// Sections start with a `LABEL:` prefix (ASCII case-insensitive) and run
/// until the next known label, the start of a fenced block, or the first
/// top-level `{`.
pub fn extract_section(text: &str, label: &str) -> Option<String> {
    let marker = format!("{label}:");
    let start = find_ignore_ascii_case(text, &marker)? + marker.len();
    let rest = &text[start..];

    let mut end = rest.len();
    for stop in ["THINKING:", "DECISION:", "```", "{"] {
        if let Some(pos) = find_ignore_ascii_case(rest, stop)
            && pos < end
        {
            end = pos;
        }
    }

    let section = rest[..end].trim();
    (!section.is_empty()).then(|| section.to_string())
}

/// Parse a [`Strategy`] from a raw Brain reply.
///
/// Returns `StrategyParseFailure` when no structured object can be found
/// or the object does not deserialize; callers substitute
/// [`Strategy::fallback`] and continue.
pub fn parse_strategy(text: &str) -> Result<Strategy, DomainError> {
    let candidate = extract_fenced_json(text)
        .and_then(|block| {
            // The fence may wrap prose around the object as well
            if block.starts_with('{') {
                Some(block)
            } else {
                extract_first_object(block)
            }
        })
        .or_else(|| extract_first_object(text))
        .ok_or_else(|| {
            DomainError::StrategyParseFailure("no JSON object in reply".to_string())
        })?;

    let mut strategy: Strategy = serde_json::from_str(candidate)
        .map_err(|e| DomainError::StrategyParseFailure(e.to_string()))?;

    // Narrative sections fill gaps the structured block left open
    if strategy.brain_thought.is_empty()
        && let Some(thought) = extract_section(text, "THINKING")
    {
        strategy.brain_thought = thought;
    }
    if strategy.brain_decision.is_empty()
        && let Some(decision) = extract_section(text, "DECISION")
    {
        strategy.brain_decision = decision;
    }

    strategy.normalize_agents();
    Ok(strategy)
}
