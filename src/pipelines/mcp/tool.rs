// SPDX-License-Identifier: MIT

use super::manager::is_transport_error;
use super::{McpServiceManager, SharedService};
use crate::adk::error::AdkError;
use crate::adk::tool::{Tool, ToolContext};
use async_trait::async_trait;
use rmcp::model::CallToolRequestParam;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// A tool living on an MCP server
pub struct McpTool {
    service: SharedService,
    server: String,
    manager: Arc<McpServiceManager>,
    name: String,
    description: String,
    schema: Value,
    timeout: Duration,
}

impl McpTool {
    /// `server` is the manager's name for `service`, used to drop it once the connection dies
    pub fn new(
        service: SharedService,
        server: impl Into<String>,
        manager: Arc<McpServiceManager>,
        name: String,
        description: String,
        schema: Value,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            server: server.into(),
            manager,
            name,
            description,
            schema,
            timeout,
        }
    }
}

#[async_trait]
impl Tool for McpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, input: Value, _ctx: &mut ToolContext) -> Result<Value, AdkError> {
        let arguments = match input {
            Value::Object(map) => Some(map),
            _ => None,
        };

        let result = {
            let service = self.service.read().await;
            let call = service.call_tool(CallToolRequestParam {
                name: self.name.clone().into(),
                arguments,
            });
            tokio::time::timeout(self.timeout, call)
                .await
                .map_err(|_| AdkError::Timeout {
                    what: format!("MCP tool '{}'", self.name),
                    secs: self.timeout.as_secs(),
                })?
        };

        match result {
            Ok(result) => Ok(serde_json::to_value(result)?),
            Err(e) => {
                if is_transport_error(&e) {
                    self.manager.evict(&self.server, &self.service).await;
                }
                Err(AdkError::Mcp(format!("tool '{}' failed: {}", self.name, e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::session::SessionState;
    use crate::pipelines::mcp::manager::tests::{connected_pair, manager_with};
    use serde_json::json;

    #[tokio::test]
    async fn test_dead_server_is_dropped_from_manager() {
        let (service, server) = connected_pair().await;
        let manager = Arc::new(manager_with("everything", &service).await);
        let tool = McpTool::new(
            service,
            "everything",
            manager.clone(),
            "getTinyImage".to_string(),
            String::new(),
            json!({"type": "object"}),
            Duration::from_secs(5),
        );

        server.cancel().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut ctx = ToolContext::new("call-1", "image_agent", SessionState::default());
        let result = tool.execute(json!({}), &mut ctx).await;
        assert!(matches!(result, Err(AdkError::Mcp(_))));
        assert!(manager.get_service("everything").await.is_none());
    }
}
