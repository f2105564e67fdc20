//! HTTP gateway to an OpenAI-compatible chat backend.
//!
//! Requests use the `chat/completions` wire shape. Streamed replies are
//! SSE `data:` lines; each payload goes through the configured chunk
//! normalizer before the engine sees it.

use super::normalizer::ChunkNormalizer;
use async_trait::async_trait;
use ensemble_application::ports::provider_gateway::{
    ChatOptions, ChatResponse, ChunkStream, GatewayError, ProviderGateway, TokenUsage,
};
use ensemble_domain::{Message, ProviderProfile};
use futures::StreamExt;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpProviderGateway {
    profile: ProviderProfile,
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    normalize: ChunkNormalizer,
    enabled: bool,
}

impl HttpProviderGateway {
    pub fn new(
        profile: ProviderProfile,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        normalize: ChunkNormalizer,
        enabled: bool,
    ) -> Self {
        Self {
            profile,
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            normalize,
            enabled,
        }
    }

    fn request_body(&self, messages: &[Message], options: &ChatOptions, stream: bool) -> Value {
        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = &options.system_prompt {
            wire_messages.push(json!({"role": "system", "content": system}));
        }
        for message in messages {
            wire_messages.push(json!({
                "role": message.role.as_str(),
                "content": message.content,
            }));
        }

        let mut body = json!({
            "model": self.model,
            "messages": wire_messages,
            "stream": stream,
        });
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn post_chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
        stream: bool,
    ) -> Result<reqwest::Response, GatewayError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .authorized(self.client.post(&url))
            .json(&self.request_body(messages, options, stream))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GatewayError::RequestFailed(format!(
                "{} returned HTTP {}",
                self.profile.name,
                response.status()
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ProviderGateway for HttpProviderGateway {
    fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    fn is_available(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        let result = self
            .authorized(self.client.get(&url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health probe for {} failed: {}", self.profile.name, e);
                false
            }
        }
    }

    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChatResponse, GatewayError> {
        let response = self.post_chat(messages, options, false).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                GatewayError::RequestFailed(format!(
                    "{} reply carried no message content",
                    self.profile.name
                ))
            })?
            .to_string();

        let model = payload["model"]
            .as_str()
            .unwrap_or(&self.model)
            .to_string();
        let usage = payload.get("usage").map(|u| TokenUsage {
            prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model,
            provider: self.profile.name.clone(),
            usage,
        })
    }

    async fn stream_chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<ChunkStream, GatewayError> {
        let response = self.post_chat(messages, options, true).await?;
        let (tx, rx) = mpsc::channel(64);

        let normalize = self.normalize;
        let provider = self.profile.name.clone();
        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(piece) = bytes.next().await {
                let piece = match piece {
                    Ok(piece) => piece,
                    Err(e) => {
                        let _ = tx.send(Err(GatewayError::TransportClosed)).await;
                        warn!("Stream from {} broke: {}", provider, e);
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&piece));

                // SSE frames are newline-delimited; keep the trailing
                // partial line in the buffer
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data == "[DONE]" {
                        return;
                    }
                    let Ok(payload) = serde_json::from_str::<Value>(data) else {
                        debug!("Skipping unparseable chunk from {}", provider);
                        continue;
                    };
                    if let Some(delta) = normalize(&payload)
                        && tx.send(Ok(delta)).await.is_err()
                    {
                        // Receiver dropped; stop reading the wire
                        return;
                    }
                }
            }
        });

        Ok(ChunkStream::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::normalizer;
    use ensemble_domain::Strength;

    fn gateway(api_key: Option<&str>, enabled: bool) -> HttpProviderGateway {
        HttpProviderGateway::new(
            ProviderProfile::new("claude", vec![Strength::Technical]),
            "https://api.example.com/v1/",
            "claude-sonnet",
            api_key.map(str::to_string),
            normalizer::openai_delta,
            enabled,
        )
    }

    #[test]
    fn availability_requires_key_and_enablement() {
        assert!(gateway(Some("sk-test"), true).is_available());
        assert!(!gateway(None, true).is_available());
        assert!(!gateway(Some("sk-test"), false).is_available());
    }

    #[test]
    fn body_includes_system_message_first() {
        let gateway = gateway(Some("sk-test"), true);
        let options = ChatOptions::with_system("be terse");
        let body = gateway.request_body(&[Message::user("hi")], &options, false);

        assert_eq!(body["model"], "claude-sonnet");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "be terse");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["stream"], false);
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn body_carries_sampling_options() {
        let gateway = gateway(Some("sk-test"), true);
        let options = ChatOptions {
            system_prompt: None,
            temperature: Some(0.2),
            max_tokens: Some(512),
        };
        let body = gateway.request_body(&[Message::user("hi")], &options, true);
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 512);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = gateway(Some("sk-test"), true);
        assert_eq!(gateway.base_url, "https://api.example.com/v1");
    }
}
