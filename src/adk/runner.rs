// SPDX-License-Identifier: MIT

//! In-memory runner - drives an [`App`] against a session store
//!
//! `run` starts a new invocation; `resume` feeds a human decision back into
//! an invocation that paused on a tool confirmation.

use crate::adk::agent::{AgentEvent, InvocationContext, RunStatus};
use crate::adk::app::App;
use crate::adk::error::{AdkError, SessionError};
use crate::adk::session::{
    InMemorySessionService, PausedInvocation, SessionEvent, SessionHandle,
};
use crate::adk::tool::{ConfirmationRequest, ToolConfirmation};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

pub const DEFAULT_USER_ID: &str = "user";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationStatus {
    Completed {
        output: String,
    },
    Paused {
        confirmations: Vec<ConfirmationRequest>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub session_id: String,
    pub invocation_id: String,
    #[serde(flatten)]
    pub status: InvocationStatus,
    /// Session state after the invocation
    pub state: Value,
}

impl RunOutcome {
    pub fn output(&self) -> Option<&str> {
        match &self.status {
            InvocationStatus::Completed { output } => Some(output),
            InvocationStatus::Paused { .. } => None,
        }
    }

    pub fn confirmations(&self) -> &[ConfirmationRequest] {
        match &self.status {
            InvocationStatus::Paused { confirmations } => confirmations,
            InvocationStatus::Completed { .. } => &[],
        }
    }
}

pub struct Runner {
    app: App,
    sessions: InMemorySessionService,
    user_id: String,
}

impl Runner {
    pub fn new(app: App) -> Self {
        Self::with_session_service(app, InMemorySessionService::new())
    }

    pub fn with_session_service(app: App, sessions: InMemorySessionService) -> Self {
        Self {
            app,
            sessions,
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn sessions(&self) -> &InMemorySessionService {
        &self.sessions
    }

    /// Fails when `session_id` is already taken
    pub async fn create_session(
        &self,
        session_id: Option<String>,
    ) -> Result<SessionHandle, SessionError> {
        self.sessions
            .create(&self.app.name, &self.user_id, session_id)
            .await
    }

    /// Start a new invocation with the user's message
    pub async fn run(&self, session_id: Option<&str>, input: &str) -> Result<RunOutcome, AdkError> {
        self.start(session_id, input, None).await
    }

    pub async fn run_stream(
        &self,
        session_id: Option<&str>,
        input: &str,
        tx: mpsc::Sender<SessionEvent>,
    ) -> Result<RunOutcome, AdkError> {
        self.start(session_id, input, Some(tx)).await
    }

    async fn start(
        &self,
        session_id: Option<&str>,
        input: &str,
        tx: Option<mpsc::Sender<SessionEvent>>,
    ) -> Result<RunOutcome, AdkError> {
        let session = match session_id {
            Some(id) => {
                self.sessions
                    .get_or_create(&self.app.name, &self.user_id, id)
                    .await
            }
            None => self.create_session(None).await?,
        };

        {
            let mut guard = session.write().await;
            if guard.is_paused() {
                log::warn!(
                    "Session {} had a paused invocation; starting a new one abandons it",
                    guard.id
                );
                guard.clear_invocation();
            }
        }

        let invocation_id = format!("e-{}", uuid::Uuid::new_v4());
        self.invoke(session, invocation_id, input.to_string(), tx)
            .await
    }

    /// Approve or reject a paused tool call and continue the invocation
    pub async fn resume(
        &self,
        session_id: &str,
        function_call_id: &str,
        confirmed: bool,
    ) -> Result<RunOutcome, AdkError> {
        if !self.app.is_resumable() {
            return Err(SessionError::NotResumable(self.app.name.clone()).into());
        }

        let session = self.sessions.get(session_id).await?;
        let (paused, remaining) = {
            let mut guard = session.write().await;
            let paused = guard
                .paused_invocation
                .clone()
                .ok_or_else(|| SessionError::NothingToResume(session_id.to_string()))?;
            let request = guard
                .pending_confirmations
                .remove(function_call_id)
                .ok_or_else(|| SessionError::ConfirmationNotFound(function_call_id.to_string()))?;

            log::info!(
                "Session {}: call {} ({}) {}",
                session_id,
                function_call_id,
                request.tool_name,
                if confirmed { "approved" } else { "rejected" }
            );
            guard.confirmations.insert(
                function_call_id.to_string(),
                ToolConfirmation {
                    hint: request.hint,
                    confirmed,
                    payload: request.payload,
                },
            );

            let remaining: Vec<ConfirmationRequest> =
                guard.pending_confirmations.values().cloned().collect();
            (paused, remaining)
        };

        if !remaining.is_empty() {
            log::info!(
                "Session {} still waits on {} confirmation(s)",
                session_id,
                remaining.len()
            );
            return Ok(RunOutcome {
                session_id: session_id.to_string(),
                invocation_id: paused.invocation_id,
                status: InvocationStatus::Paused {
                    confirmations: remaining,
                },
                state: session.read().await.state.to_json(),
            });
        }

        self.invoke(session, paused.invocation_id, paused.user_content, None)
            .await
    }

    async fn invoke(
        &self,
        session: SessionHandle,
        invocation_id: String,
        user_content: String,
        tx: Option<mpsc::Sender<SessionEvent>>,
    ) -> Result<RunOutcome, AdkError> {
        let session_id = session.read().await.id.clone();
        log::info!(
            "Running app {} (session {}, invocation {})",
            self.app.name,
            session_id,
            invocation_id
        );

        let mut ctx = InvocationContext::new(&invocation_id, &user_content, session.clone());
        if let Some(tx) = tx {
            ctx = ctx.with_events(tx);
        }

        let result = self.app.root_agent.run(&ctx).await;

        let status = match result {
            Err(e) => {
                log::error!("App {} failed: {}", self.app.name, e);
                ctx.emit(&self.app.name, AgentEvent::Error(e.to_string()))
                    .await;
                session.write().await.clear_invocation();
                return Err(e);
            }
            Ok(RunStatus::Paused(confirmations)) => {
                let mut guard = session.write().await;
                if self.app.is_resumable() {
                    guard.paused_invocation = Some(PausedInvocation {
                        invocation_id: invocation_id.clone(),
                        user_content,
                    });
                } else {
                    log::warn!(
                        "App {} is not resumable; dropping paused invocation {}",
                        self.app.name,
                        invocation_id
                    );
                    guard.clear_invocation();
                }
                InvocationStatus::Paused { confirmations }
            }
            Ok(RunStatus::Completed(output)) | Ok(RunStatus::Escalated(output)) => {
                session.write().await.clear_invocation();
                InvocationStatus::Completed { output }
            }
        };

        let state = session.read().await.state.to_json();
        Ok(RunOutcome {
            session_id,
            invocation_id,
            status,
            state,
        })
    }
}
