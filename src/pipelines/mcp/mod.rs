// SPDX-License-Identifier: MIT

//! MCP client side: stdio servers exposed as agent tools
//!
//! - [`McpServiceManager`] keeps one running client per server name
//! - [`McpTool`] forwards a single tool call to its server
//! - [`McpToolset`] lists a server's tools when the agent runs

pub mod manager;
pub mod tool;
pub mod toolset;

pub use manager::{McpServerConfig, McpServiceManager, SharedService};
pub use tool::McpTool;
pub use toolset::{McpToolset, StdioConnectionParams};

use crate::adk::error::AdkError;
use rmcp::model::{ClientCapabilities, ClientInfo, Implementation};
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::child_process::TokioChildProcess;
use rmcp::{ClientHandler, ServiceExt};
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct BasicClientHandler;

impl ClientHandler for BasicClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
        }
    }
}

/// Spawn `command args..` and complete the MCP handshake over its stdio.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), adk_pipelines::adk::AdkError> {
/// use adk_pipelines::pipelines::mcp::create_mcp_service;
///
/// let args = vec!["-y".to_string(), "@modelcontextprotocol/server-everything".to_string()];
/// let service = create_mcp_service("npx", &args).await?;
/// # Ok(())
/// # }
/// ```
pub async fn create_mcp_service(
    command: &str,
    args: &[String],
) -> Result<RunningService<RoleClient, BasicClientHandler>, AdkError> {
    let mut server_cmd = Command::new(command);
    server_cmd.args(args);

    let transport = TokioChildProcess::new(server_cmd)?;
    BasicClientHandler
        .serve(transport)
        .await
        .map_err(|e| AdkError::Mcp(format!("handshake with '{}' failed: {}", command, e)))
}
