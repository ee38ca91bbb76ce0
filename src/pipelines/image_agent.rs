// SPDX-License-Identifier: MIT

//! Image agent backed by the MCP "everything" reference server

use super::mcp::{McpServiceManager, McpToolset, StdioConnectionParams};
use super::ModelSpec;
use crate::adk::agent::LlmAgent;
use crate::adk::app::App;
use crate::adk::tool::Toolset;
use std::sync::Arc;
use std::time::Duration;

pub const APP_NAME: &str = "image_agent";

pub const MCP_SERVER_NAME: &str = "everything";
pub const MCP_COMMAND: &str = "npx";
pub const MCP_PACKAGE: &str = "@modelcontextprotocol/server-everything";
pub const IMAGE_TOOL: &str = "getTinyImage";

const INSTRUCTION: &str = "Use the MCP Tool to generate images for user queries";

pub fn mcp_image_server(manager: Arc<McpServiceManager>, timeout: Duration) -> McpToolset {
    McpToolset::new(
        MCP_SERVER_NAME,
        StdioConnectionParams {
            command: MCP_COMMAND.to_string(),
            // -y lets npx install the package without asking
            args: vec!["-y".to_string(), MCP_PACKAGE.to_string()],
            timeout,
        },
        manager,
    )
    .with_tool_filter([IMAGE_TOOL])
}

pub fn root_agent(spec: &ModelSpec, images: Arc<dyn Toolset>) -> LlmAgent {
    spec.agent(
        "image_agent",
        "Generates images through an MCP tool",
        INSTRUCTION,
    )
    .with_toolset(images)
}

pub fn app(spec: &ModelSpec, images: Arc<dyn Toolset>) -> App {
    App::new(APP_NAME, Arc::new(root_agent(spec, images)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::AdkError;
    use crate::adk::model::Content;
    use crate::adk::runner::Runner;
    use crate::adk::tool::{FunctionTool, Tool};
    use crate::pipelines::testing::ScriptedModel;
    use async_trait::async_trait;
    use serde_json::json;

    struct FakeImageServer;

    #[async_trait]
    impl Toolset for FakeImageServer {
        fn name(&self) -> &str {
            MCP_SERVER_NAME
        }

        async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>, AdkError> {
            let tool = FunctionTool::new(IMAGE_TOOL, "Returns a tiny image", json!({"type": "object", "properties": {}}), |_, _| {
                Ok(json!({"content": [{"type": "image", "data": "iVBORw0KGgo=", "mimeType": "image/png"}]}))
            });
            Ok(vec![Arc::new(tool)])
        }
    }

    #[test]
    fn test_server_params() {
        let toolset = mcp_image_server(Arc::new(McpServiceManager::new()), Duration::from_secs(30));
        let params = toolset.params();
        assert_eq!(params.command, "npx");
        assert_eq!(params.args, ["-y", "@modelcontextprotocol/server-everything"]);
        assert_eq!(params.timeout, Duration::from_secs(30));
        assert!(toolset.is_selected("getTinyImage"));
        assert!(!toolset.is_selected("echo"));
    }

    #[tokio::test]
    async fn test_agent_calls_image_tool() {
        let model = Arc::new(ScriptedModel::new(vec![
            ScriptedModel::call("call-img", IMAGE_TOOL, json!({})),
            Content::text("model", "Here is your image."),
        ]));
        let runner = Runner::new(app(&ModelSpec::new(model.clone()), Arc::new(FakeImageServer)));

        let outcome = runner.run(None, "draw a cat").await.unwrap();
        assert_eq!(outcome.output(), Some("Here is your image."));
        assert_eq!(model.calls(), 2);
        assert_eq!(model.system_prompts()[0], INSTRUCTION);
    }
}
