//! Shared test doubles for the application layer

use crate::ports::decision_store::{DecisionStore, StoreError};
use crate::ports::memory_store::MemoryStore;
use crate::ports::provider_gateway::{
    ChatOptions, ChatResponse, GatewayError, ProviderGateway,
};
use crate::ports::tool_runner::{ToolError, ToolRunner};
use crate::executor::EventSink;
use async_trait::async_trait;
use ensemble_domain::{
    DecisionLogEntry, Message, ProviderProfile, Role, Strength, StreamEvent, ToolCall,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted provider gateway: pops one canned reply per `chat` call.
///
/// When the script runs dry the last reply repeats, so multi-call modes
/// can be driven with a short script.
pub struct ScriptedGateway {
    profile: ProviderProfile,
    available: bool,
    healthy: bool,
    delay: std::time::Duration,
    replies: Mutex<Vec<Result<String, String>>>,
    pub calls: AtomicUsize,
    pub health_checks: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new(name: &str, strengths: Vec<Strength>) -> Self {
        Self {
            profile: ProviderProfile::new(name, strengths),
            available: true,
            healthy: true,
            delay: std::time::Duration::ZERO,
            replies: Mutex::new(vec![Ok(format!("{name} default reply"))]),
            calls: AtomicUsize::new(0),
            health_checks: AtomicUsize::new(0),
        }
    }

    pub fn with_replies(mut self, replies: Vec<Result<String, String>>) -> Self {
        self.replies = Mutex::new(replies);
        self
    }

    /// Sleep this long inside every `chat` call
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn always_failing(name: &str) -> Self {
        Self::new(name, vec![]).with_replies(vec![Err("scripted failure".to_string())])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<dyn ProviderGateway> {
        Arc::new(self)
    }
}

#[async_trait]
impl ProviderGateway for ScriptedGateway {
    fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn check_health(&self) -> bool {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        self.healthy
    }

    async fn chat(
        &self,
        _messages: &[Message],
        _options: &ChatOptions,
    ) -> Result<ChatResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut replies = self.replies.lock().unwrap();
        let reply = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        };
        match reply {
            Ok(content) => Ok(ChatResponse {
                content,
                model: "scripted".to_string(),
                provider: self.profile.name.clone(),
                usage: None,
            }),
            Err(e) => Err(GatewayError::RequestFailed(e)),
        }
    }
}

/// In-memory decision store for analyzer tests
#[derive(Default)]
pub struct RecordingStore {
    pub entries: Mutex<Vec<DecisionLogEntry>>,
    pub context: Mutex<Vec<Message>>,
}

#[async_trait]
impl DecisionStore for RecordingStore {
    async fn log(&self, entry: DecisionLogEntry) -> Result<(), StoreError> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    async fn context_window(
        &self,
        _user_id: &str,
        _session_id: &str,
        n: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let context = self.context.lock().unwrap();
        let start = context.len().saturating_sub(n);
        Ok(context[start..].to_vec())
    }

    async fn recent_decisions(
        &self,
        decision_type: &str,
        limit: usize,
    ) -> Result<Vec<DecisionLogEntry>, StoreError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.decision_type == decision_type)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// In-memory memory store
#[derive(Default)]
pub struct RecordingMemory {
    pub rows: Mutex<Vec<(String, String, Role, String)>>,
    pub matches: Mutex<Vec<String>>,
}

#[async_trait]
impl MemoryStore for RecordingMemory {
    async fn remember(
        &self,
        user_id: &str,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> Result<(), StoreError> {
        self.rows.lock().unwrap().push((
            user_id.to_string(),
            session_id.to_string(),
            role,
            content.to_string(),
        ));
        Ok(())
    }

    async fn search(
        &self,
        _user_id: &str,
        _query: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let matches = self.matches.lock().unwrap();
        Ok(matches.iter().take(limit).cloned().collect())
    }
}

/// Event sink that cancels a token on the first matching event, the way
/// a stream consumer disconnecting mid-run does.
pub struct CancelOnEvent {
    pub token: tokio_util::sync::CancellationToken,
    pub matches: fn(&StreamEvent) -> bool,
}

impl EventSink for CancelOnEvent {
    fn emit(&self, event: StreamEvent) {
        if (self.matches)(&event) {
            self.token.cancel();
        }
    }

    fn wants_chunks(&self) -> bool {
        false
    }
}

/// Tool runner that echoes the call name
pub struct EchoTools;

#[async_trait]
impl ToolRunner for EchoTools {
    async fn run(&self, call: &ToolCall) -> Result<String, ToolError> {
        Ok(format!("ran {}", call.name))
    }
}

/// Tool runner that always fails
pub struct BrokenTools;

#[async_trait]
impl ToolRunner for BrokenTools {
    async fn run(&self, call: &ToolCall) -> Result<String, ToolError> {
        Err(ToolError::Failed(format!("{} exploded", call.name)))
    }
}
