// SPDX-License-Identifier: MIT

//! Tool module - what agents can call
//!
//! - [`Tool`] - a single callable function exposed to the model
//! - [`Toolset`] - a provider of tools resolved at run time (e.g. an MCP server)
//! - [`ToolContext`] - per-call view of session state, confirmation and actions
//! - [`FunctionTool`] - wraps a typed Rust function as a [`Tool`]

mod function;

pub use function::FunctionTool;

use crate::adk::error::AdkError;
use crate::adk::session::SessionState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Trait for tools that can be called by agents.
///
/// `name()`, `description()` and `schema()` return references; implementations
/// store these values in struct fields or statics.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (must be unique within an agent's tool set)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// Execute the tool with the given input and return the result
    async fn execute(&self, input: Value, ctx: &mut ToolContext) -> Result<Value, AdkError>;
}

/// A source of tools that are only known once the agent runs
#[async_trait]
pub trait Toolset: Send + Sync {
    fn name(&self) -> &str;

    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>, AdkError>;
}

/// Human decision attached to a paused tool call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolConfirmation {
    pub hint: String,
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// A tool call waiting for a human decision
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationRequest {
    pub function_call_id: String,
    pub tool_name: String,
    pub args: Value,
    pub hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Side effects a tool asks the framework to apply after it returns
#[derive(Debug, Clone, Default)]
pub struct ToolActions {
    /// Stop the nearest enclosing loop once the current sub-agent finishes
    pub escalate: bool,
    pub state_delta: Map<String, Value>,
    pub requested_confirmation: Option<ToolConfirmation>,
}

/// Execution context handed to a tool for one function call
#[derive(Debug, Clone)]
pub struct ToolContext {
    function_call_id: String,
    agent_name: String,
    state: SessionState,
    /// Set when the call is being replayed after a human decision
    pub tool_confirmation: Option<ToolConfirmation>,
    pub actions: ToolActions,
}

impl ToolContext {
    pub fn new(
        function_call_id: impl Into<String>,
        agent_name: impl Into<String>,
        state: SessionState,
    ) -> Self {
        Self {
            function_call_id: function_call_id.into(),
            agent_name: agent_name.into(),
            state,
            tool_confirmation: None,
            actions: ToolActions::default(),
        }
    }

    pub fn with_confirmation(mut self, confirmation: Option<ToolConfirmation>) -> Self {
        self.tool_confirmation = confirmation;
        self
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Read a state value, seeing this call's own writes first
    pub fn get_state(&self, key: &str) -> Option<&Value> {
        self.actions
            .state_delta
            .get(key)
            .or_else(|| self.state.get(key))
    }

    pub fn set_state(&mut self, key: impl Into<String>, value: Value) {
        self.actions.state_delta.insert(key.into(), value);
    }

    /// Pause the invocation until a human approves or rejects this call
    pub fn request_confirmation(&mut self, hint: impl Into<String>, payload: Option<Value>) {
        log::debug!(
            "{}: call {} asks for confirmation",
            self.agent_name,
            self.function_call_id
        );
        self.actions.requested_confirmation = Some(ToolConfirmation {
            hint: hint.into(),
            confirmed: false,
            payload,
        });
    }

    pub fn escalate(&mut self) {
        self.actions.escalate = true;
    }
}
