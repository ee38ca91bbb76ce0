// SPDX-License-Identifier: MIT

//! Agent module - defines agent types for AI pipelines
//!
//! This module provides the core Agent trait and implementations:
//! - `LlmAgent` - LLM agent with tool calling, state templating and output keys
//! - `SequentialAgent`, `LoopAgent`, `ParallelAgent` - containers of sub-agents
//!
//! All agents of one invocation share a session through [`InvocationContext`].
//! An agent that must wait for a human stores a checkpoint under its own name
//! and returns [`RunStatus::Paused`]; running it again on the same context
//! picks up from that checkpoint.

mod llm;
mod workflow;

pub use llm::LlmAgent;
pub use workflow::{LoopAgent, ParallelAgent, SequentialAgent};

use crate::adk::error::AdkError;
use crate::adk::session::{SessionEvent, SessionHandle, SessionState};
use crate::adk::tool::{ConfirmationRequest, ToolConfirmation};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AgentEvent {
    Thought(String),
    ToolCall {
        name: String,
        args: Value,
    },
    ToolResult {
        name: String,
        result: Value,
    },
    Answer(String),
    Error(String),
    ConfirmationRequested(ConfirmationRequest),
    StateChanged {
        key: String,
        value: Value,
    },
    Escalated,
}

/// How an agent run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Completed(String),
    /// Finished, and asked the nearest enclosing loop to stop
    Escalated(String),
    /// Waiting for human decisions on these tool calls
    Paused(Vec<ConfirmationRequest>),
}

impl RunStatus {
    pub fn output(&self) -> Option<&str> {
        match self {
            RunStatus::Completed(s) | RunStatus::Escalated(s) => Some(s),
            RunStatus::Paused(_) => None,
        }
    }
}

/// Everything an agent needs for one invocation
#[derive(Clone)]
pub struct InvocationContext {
    invocation_id: String,
    user_content: String,
    session: SessionHandle,
    events: Option<mpsc::Sender<SessionEvent>>,
}

impl InvocationContext {
    pub fn new(
        invocation_id: impl Into<String>,
        user_content: impl Into<String>,
        session: SessionHandle,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            user_content: user_content.into(),
            session,
            events: None,
        }
    }

    /// Also forward every event to a channel (streaming runs)
    pub fn with_events(mut self, tx: mpsc::Sender<SessionEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn user_content(&self) -> &str {
        &self.user_content
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub async fn state(&self) -> SessionState {
        self.session.read().await.state.clone()
    }

    /// Record an event on the session and forward it to the stream, if any
    pub async fn emit(&self, author: &str, event: AgentEvent) {
        let record = SessionEvent {
            invocation_id: self.invocation_id.clone(),
            author: author.to_string(),
            timestamp: Utc::now(),
            event,
        };

        {
            let mut session = self.session.write().await;
            session.events.push(record.clone());
            session.last_update = record.timestamp;
        }

        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening any more
            let _ = tx.send(record).await;
        }
    }

    pub async fn set_state(&self, author: &str, key: &str, value: Value) {
        self.session
            .write()
            .await
            .state
            .set(key, value.clone());
        self.emit(
            author,
            AgentEvent::StateChanged {
                key: key.to_string(),
                value,
            },
        )
        .await;
    }

    pub async fn apply_state_delta(&self, author: &str, delta: Map<String, Value>) {
        for (key, value) in delta {
            self.set_state(author, &key, value).await;
        }
    }

    pub async fn load_checkpoint<T: DeserializeOwned>(
        &self,
        agent: &str,
    ) -> Result<Option<T>, AdkError> {
        let session = self.session.read().await;
        match session.agent_states.get(agent) {
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn save_checkpoint<T: Serialize>(
        &self,
        agent: &str,
        checkpoint: &T,
    ) -> Result<(), AdkError> {
        let value = serde_json::to_value(checkpoint)?;
        self.session
            .write()
            .await
            .agent_states
            .insert(agent.to_string(), value);
        Ok(())
    }

    pub async fn clear_checkpoint(&self, agent: &str) {
        self.session.write().await.agent_states.remove(agent);
    }

    /// Register a tool call that waits for a human decision
    pub async fn add_pending_confirmation(&self, author: &str, request: ConfirmationRequest) {
        self.session
            .write()
            .await
            .pending_confirmations
            .insert(request.function_call_id.clone(), request.clone());
        self.emit(author, AgentEvent::ConfirmationRequested(request))
            .await;
    }

    /// Decision for a paused call, consumed on read
    pub async fn take_confirmation(&self, function_call_id: &str) -> Option<ToolConfirmation> {
        self.session
            .write()
            .await
            .confirmations
            .remove(function_call_id)
    }

    /// Pending request for a call that has not been decided yet
    pub async fn pending_confirmation(&self, function_call_id: &str) -> Option<ConfirmationRequest> {
        self.session
            .read()
            .await
            .pending_confirmations
            .get(function_call_id)
            .cloned()
    }
}

/// Core agent trait for all agent types
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name (unique within one app)
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Run the agent against the invocation's session
    async fn run(&self, ctx: &InvocationContext) -> Result<RunStatus, AdkError>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::adk::session::InMemorySessionService;
    use serde_json::json;

    /// A mock agent that appends its tag to the `trace` state key
    pub struct MockAgent {
        name: String,
        status: fn(String) -> RunStatus,
    }

    impl MockAgent {
        pub fn new(name: &str, status: fn(String) -> RunStatus) -> Self {
            Self {
                name: name.to_string(),
                status,
            }
        }

        pub fn completing(name: &str) -> Self {
            Self::new(name, RunStatus::Completed)
        }
    }

    #[async_trait]
    impl Agent for MockAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, ctx: &InvocationContext) -> Result<RunStatus, AdkError> {
            let trace = ctx.state().await.get_string("trace").unwrap_or_default();
            let trace = format!("{}{}", trace, self.name);
            ctx.set_state(&self.name, "trace", json!(trace.clone()))
                .await;
            Ok((self.status)(trace))
        }
    }

    pub async fn test_context(input: &str) -> InvocationContext {
        let service = InMemorySessionService::new();
        let session = service.create("test_app", "user", None).await.unwrap();
        InvocationContext::new("inv-1", input, session)
    }

    #[tokio::test]
    async fn test_mock_agent_writes_state() {
        let ctx = test_context("input").await;
        let agent = MockAgent::completing("a");
        assert_eq!(agent.name(), "a");

        let status = agent.run(&ctx).await.unwrap();
        assert_eq!(status, RunStatus::Completed("a".to_string()));
        assert_eq!(ctx.state().await.get("trace"), Some(&json!("a")));
    }

    #[tokio::test]
    async fn test_emit_records_and_streams_events() {
        let (tx, mut rx) = mpsc::channel(8);
        let ctx = test_context("hi").await.with_events(tx);

        ctx.emit("agent", AgentEvent::Thought("hello".to_string())).await;

        let streamed = rx.recv().await.unwrap();
        assert_eq!(streamed.author, "agent");
        assert_eq!(streamed.invocation_id, "inv-1");
        assert_eq!(ctx.session().read().await.events.len(), 1);
    }

    #[tokio::test]
    async fn test_checkpoint_round_trip_and_clear() {
        let ctx = test_context("hi").await;
        assert_eq!(ctx.load_checkpoint::<u32>("seq").await.unwrap(), None);

        ctx.save_checkpoint("seq", &3u32).await.unwrap();
        assert_eq!(ctx.load_checkpoint::<u32>("seq").await.unwrap(), Some(3));

        ctx.clear_checkpoint("seq").await;
        assert_eq!(ctx.load_checkpoint::<u32>("seq").await.unwrap(), None);
    }

    #[test]
    fn test_run_status_output() {
        assert_eq!(RunStatus::Completed("x".into()).output(), Some("x"));
        assert_eq!(RunStatus::Escalated("y".into()).output(), Some("y"));
        assert_eq!(RunStatus::Paused(vec![]).output(), None);
    }
}
