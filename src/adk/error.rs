// SPDX-License-Identifier: MIT

//! Typed error handling for adk-pipelines
//!
//! Every fallible framework operation returns [`AdkError`]. The binary edge
//! wraps it in `anyhow`.

use thiserror::Error;

/// Top-level error type for the agent framework and pipelines
#[derive(Debug, Error)]
pub enum AdkError {
    /// API errors from external services (model providers, MCP servers)
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// Tool not found during execution
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },

    /// Tool arguments did not match the declared schema
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidToolArgs { tool: String, message: String },

    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model/LLM errors
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Session and resumption errors
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Instruction template references a state key that is not set
    #[error("Context variable not found: `{0}`")]
    MissingStateKey(String),

    /// No pipeline registered under this name
    #[error("Unknown app: {0}")]
    UnknownApp(String),

    /// MCP connection or protocol errors
    #[error("MCP error: {0}")]
    Mcp(String),

    /// Operation exceeded its deadline
    #[error("Timed out after {secs} seconds: {what}")]
    Timeout { what: String, secs: u64 },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Max iterations/turns reached
    #[error("Max {kind} reached: {limit}")]
    MaxIterations { kind: String, limit: u32 },

    /// A spawned agent task panicked or was cancelled
    #[error("Agent task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error wrapper
    #[error("{0}")]
    Other(String),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

/// Session lookup and human-in-the-loop resumption errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Session already exists: {0}")]
    AlreadyExists(String),

    /// The app was not configured with resumability
    #[error("App '{0}' is not resumable")]
    NotResumable(String),

    /// No pending confirmation with this function call id
    #[error("No pending confirmation for function call '{0}'")]
    ConfirmationNotFound(String),

    /// Resume was requested but nothing is paused
    #[error("Session '{0}' has no paused invocation")]
    NothingToResume(String),
}

impl AdkError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a tool not found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create from a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<&str> for AdkError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

impl From<String> for AdkError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}
