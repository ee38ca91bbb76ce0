// SPDX-License-Identifier: MIT

use super::manager::is_transport_error;
use super::{McpServerConfig, McpServiceManager, McpTool};
use crate::adk::error::AdkError;
use crate::adk::tool::{Tool, Toolset};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// How to launch a stdio MCP server
#[derive(Debug, Clone, PartialEq)]
pub struct StdioConnectionParams {
    pub command: String,
    pub args: Vec<String>,
    /// Applies to startup, tool listing and each tool call
    pub timeout: Duration,
}

/// Tools of one MCP server, optionally narrowed to a fixed list of names
pub struct McpToolset {
    name: String,
    params: StdioConnectionParams,
    tool_filter: Option<Vec<String>>,
    manager: Arc<McpServiceManager>,
}

impl McpToolset {
    pub fn new(
        name: impl Into<String>,
        params: StdioConnectionParams,
        manager: Arc<McpServiceManager>,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            tool_filter: None,
            manager,
        }
    }

    pub fn with_tool_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tool_filter = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn params(&self) -> &StdioConnectionParams {
        &self.params
    }

    pub fn is_selected(&self, tool_name: &str) -> bool {
        match &self.tool_filter {
            Some(names) => names.iter().any(|n| n == tool_name),
            None => true,
        }
    }

    async fn with_timeout<T, F>(&self, what: &str, fut: F) -> Result<T, AdkError>
    where
        F: Future<Output = Result<T, AdkError>>,
    {
        tokio::time::timeout(self.params.timeout, fut)
            .await
            .map_err(|_| AdkError::Timeout {
                what: format!("{} ({})", what, self.name),
                secs: self.params.timeout.as_secs(),
            })?
    }
}

#[async_trait]
impl Toolset for McpToolset {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>, AdkError> {
        let config = McpServerConfig {
            name: self.name.clone(),
            command: self.params.command.clone(),
            args: self.params.args.clone(),
        };
        let service = self
            .with_timeout("MCP server startup", self.manager.get_or_create_service(&config))
            .await?;

        let listed = self
            .with_timeout("MCP tool listing", async {
                let listed = service.read().await.list_all_tools().await;
                match listed {
                    Ok(tools) => Ok(tools),
                    Err(e) => {
                        if is_transport_error(&e) {
                            self.manager.evict(&self.name, &service).await;
                        }
                        Err(AdkError::Mcp(format!("listing tools failed: {}", e)))
                    }
                }
            })
            .await?;

        let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
        for tool in listed {
            if !self.is_selected(&tool.name) {
                continue;
            }
            log::debug!("Using MCP tool {}:{}", self.name, tool.name);
            tools.push(Arc::new(McpTool::new(
                service.clone(),
                self.name.clone(),
                self.manager.clone(),
                tool.name.to_string(),
                tool.description.unwrap_or_default().to_string(),
                serde_json::to_value(&tool.input_schema)?,
                self.params.timeout,
            )));
        }

        if tools.is_empty() {
            log::warn!("MCP server '{}' offered no matching tools", self.name);
        }
        Ok(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolset() -> McpToolset {
        McpToolset::new(
            "everything",
            StdioConnectionParams {
                command: "npx".to_string(),
                args: vec!["-y".to_string()],
                timeout: Duration::from_secs(30),
            },
            Arc::new(McpServiceManager::new()),
        )
    }

    #[test]
    fn test_without_filter_everything_is_selected() {
        let set = toolset();
        assert!(set.is_selected("getTinyImage"));
        assert!(set.is_selected("echo"));
    }

    #[test]
    fn test_filter_limits_tools() {
        let set = toolset().with_tool_filter(["getTinyImage"]);
        assert!(set.is_selected("getTinyImage"));
        assert!(!set.is_selected("echo"));
        assert_eq!(set.name(), "everything");
    }

    #[tokio::test]
    async fn test_unreachable_server_fails() {
        let set = McpToolset::new(
            "broken",
            StdioConnectionParams {
                command: "/nonexistent/mcp-server-binary".to_string(),
                args: vec![],
                timeout: Duration::from_secs(5),
            },
            Arc::new(McpServiceManager::new()),
        );
        assert!(set.get_tools().await.is_err());
    }
}
