// SPDX-License-Identifier: MIT

//! Session management
//!
//! This module provides:
//! - `SessionState` - key/value state that pipeline stages pass text through
//! - `Session` - state plus event log, checkpoints and pending confirmations
//! - `InMemorySessionService` - process-local session store

mod service;
mod state;

pub use service::{InMemorySessionService, SessionHandle};
pub use state::{inject_state, SessionState};

use crate::adk::agent::AgentEvent;
use crate::adk::tool::{ConfirmationRequest, ToolConfirmation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One recorded event, attributed to the agent that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub invocation_id: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub event: AgentEvent,
}

/// The invocation that stopped to wait for human input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PausedInvocation {
    pub invocation_id: String,
    pub user_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub state: SessionState,
    pub events: Vec<SessionEvent>,
    /// Per-agent checkpoints of a paused invocation, keyed by agent name
    #[serde(default)]
    pub agent_states: HashMap<String, Value>,
    /// Confirmations still waiting for a decision, keyed by function call id
    #[serde(default)]
    pub pending_confirmations: HashMap<String, ConfirmationRequest>,
    /// Decisions received but not yet consumed by the resumed tool call
    #[serde(default)]
    pub confirmations: HashMap<String, ToolConfirmation>,
    pub paused_invocation: Option<PausedInvocation>,
    pub last_update: DateTime<Utc>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        app_name: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            state: SessionState::new(),
            events: Vec::new(),
            agent_states: HashMap::new(),
            pending_confirmations: HashMap::new(),
            confirmations: HashMap::new(),
            paused_invocation: None,
            last_update: Utc::now(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_invocation.is_some()
    }

    /// Forget everything tied to an unfinished invocation
    pub fn clear_invocation(&mut self) {
        self.agent_states.clear();
        self.pending_confirmations.clear();
        self.confirmations.clear();
        self.paused_invocation = None;
        self.state.clear_temp();
    }
}
