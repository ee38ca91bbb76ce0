// SPDX-License-Identifier: MIT

use crate::adk::tool::{FunctionTool, ToolContext};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

pub const TOOL_NAME: &str = "exit_loop";

const DESCRIPTION: &str = "Call this function ONLY when the critique is 'APPROVED', indicating the story is finished and no more changes are needed.";

/// Takes no arguments
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ExitLoopArgs {}

/// Approves the story and stops the enclosing refinement loop
pub fn exit_loop(_args: ExitLoopArgs, ctx: &mut ToolContext) -> Value {
    log::info!("{} approved the story, leaving the loop", ctx.agent_name());
    ctx.escalate();
    json!({
        "status": "approved",
        "message": "Story approved. Exiting refinement loop."
    })
}

pub fn exit_loop_tool() -> FunctionTool {
    FunctionTool::typed(TOOL_NAME, DESCRIPTION, exit_loop)
}
