//! Tool runner adapters

use async_trait::async_trait;
use ensemble_application::ports::tool_runner::{ToolError, ToolRunner};
use ensemble_domain::ToolCall;

/// Tool runner for deployments without an external tool collaborator.
/// Every call fails as not-available, which agents see as an inline
/// failed-result block.
pub struct NoopToolRunner;

#[async_trait]
impl ToolRunner for NoopToolRunner {
    async fn run(&self, call: &ToolCall) -> Result<String, ToolError> {
        Err(ToolError::NotAvailable(call.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_call_is_not_available() {
        let runner = NoopToolRunner;
        let call = ToolCall {
            name: "web_search".to_string(),
            args: serde_json::Value::Null,
        };
        let result = runner.run(&call).await;
        assert!(matches!(result, Err(ToolError::NotAvailable(name)) if name == "web_search"));
    }
}
