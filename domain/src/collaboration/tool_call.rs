//! Tool-call markers embedded in agent replies.
//!
//! Agents request tools with a fenced block tagged `tool` containing a
//! JSON call. The engine hands calls to the external tool collaborator
//! after generation completes; results (or failures) are appended to the
//! reply as rendered blocks. Tool failures are never fatal.

use serde::{Deserialize, Serialize};

/// One tool invocation requested by an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Extract every well-formed fenced `tool` block from a reply.
///
/// Malformed blocks (bad JSON, missing name) are skipped rather than
/// failing the reply.
pub fn parse_tool_calls(reply: &str) -> Vec<ToolCall> {
    let mut calls = Vec::new();
    let mut rest = reply;

    while let Some(start) = rest.find("```tool") {
        let body = &rest[start + "```tool".len()..];
        let Some(end) = body.find("```") else {
            break;
        };
        if let Ok(call) = serde_json::from_str::<ToolCall>(body[..end].trim())
            && !call.name.is_empty()
        {
            calls.push(call);
        }
        rest = &body[end + 3..];
    }

    calls
}

/// Render a successful tool result for appending to the reply
pub fn render_tool_result(call: &ToolCall, output: &str) -> String {
    format!("\n\n[tool {} result]\n{}", call.name, output)
}

/// Render a failed tool call as an inline failed-result block
pub fn render_tool_failure(call: &ToolCall, error: &str) -> String {
    format!("\n\n[tool {} failed: {}]", call.name, error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_call() {
        let reply = "Let me check.\n```tool\n{\"name\": \"web_search\", \"args\": {\"q\": \"rust\"}}\n```\nDone.";
        let calls = parse_tool_calls(reply);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "web_search");
        assert_eq!(calls[0].args["q"], "rust");
    }

    #[test]
    fn extracts_multiple_calls() {
        let reply = concat!(
            "```tool\n{\"name\": \"a\"}\n```\n",
            "between\n",
            "```tool\n{\"name\": \"b\"}\n```"
        );
        let calls = parse_tool_calls(reply);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].name, "b");
    }

    #[test]
    fn malformed_blocks_skipped() {
        let reply = "```tool\nnot json at all\n```\n```tool\n{\"name\": \"ok\"}\n```";
        let calls = parse_tool_calls(reply);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "ok");
    }

    #[test]
    fn no_blocks_yields_empty() {
        assert!(parse_tool_calls("plain reply").is_empty());
        assert!(parse_tool_calls("```json\n{\"name\":\"x\"}\n```").is_empty());
    }

    #[test]
    fn rendered_failure_names_tool_and_error() {
        let call = ToolCall {
            name: "db_query".to_string(),
            args: serde_json::Value::Null,
        };
        let rendered = render_tool_failure(&call, "connection refused");
        assert!(rendered.contains("db_query"));
        assert!(rendered.contains("connection refused"));
    }
}
