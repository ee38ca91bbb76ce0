// SPDX-License-Identifier: MIT

//! LLM Agent - LLM agent with tool calling
//!
//! This agent sends prompts to an LLM and handles tool calls in a loop
//! until a text response is received. The instruction is a template filled
//! from session state, and the final text can be written back to state under
//! `output_key`.

use super::{Agent, AgentEvent, InvocationContext, RunStatus};
use crate::adk::error::AdkError;
use crate::adk::model::{Content, GenerationConfig, Model, Part};
use crate::adk::session::inject_state;
use crate::adk::tool::{ConfirmationRequest, Tool, ToolConfirmation, ToolContext, Toolset};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_MAX_TURNS: u32 = 10;

/// LLM agent with tool calling support
pub struct LlmAgent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub toolsets: Vec<Arc<dyn Toolset>>,
    /// State key that receives the final text response
    pub output_key: Option<String>,
    pub generation_config: Option<GenerationConfig>,
    pub max_turns: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingCall {
    id: String,
    name: String,
    args: Value,
}

/// Saved when a tool call waits for a human decision
#[derive(Debug, Serialize, Deserialize)]
struct LlmCheckpoint {
    history: Vec<Content>,
    /// Next model turn to run once the paused calls are settled
    turn: u32,
    /// Responses of calls from the same batch that already completed
    answered: Vec<Part>,
    pending: Vec<PendingCall>,
}

#[derive(Default)]
struct CallBatch {
    responses: Vec<Part>,
    paused: Vec<(PendingCall, ConfirmationRequest)>,
    escalate: bool,
}

impl LlmAgent {
    pub fn new(
        name: String,
        description: String,
        instruction: String,
        model: Arc<dyn Model>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        Self {
            name,
            description,
            instruction,
            model,
            tools,
            toolsets: Vec::new(),
            output_key: None,
            generation_config: None,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn with_toolset(mut self, toolset: Arc<dyn Toolset>) -> Self {
        self.toolsets.push(toolset);
        self
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Static tools plus whatever the toolsets expose right now
    async fn resolve_tools(&self) -> Result<Vec<Arc<dyn Tool>>, AdkError> {
        let mut tools = self.tools.clone();
        for toolset in &self.toolsets {
            let resolved = toolset.get_tools().await?;
            log::debug!(
                "Agent {} resolved {} tools from toolset {}",
                self.name,
                resolved.len(),
                toolset.name()
            );
            tools.extend(resolved);
        }
        Ok(tools)
    }

    async fn initial_history(&self, ctx: &InvocationContext) -> Result<Vec<Content>, AdkError> {
        let state = ctx.state().await;
        let instruction = inject_state(&self.instruction, &state)?;
        Ok(vec![
            Content::text("system", instruction),
            Content::text("user", ctx.user_content()),
        ])
    }

    async fn call_tool(
        &self,
        ctx: &InvocationContext,
        tool_map: &HashMap<&str, &Arc<dyn Tool>>,
        call: &PendingCall,
        confirmation: Option<ToolConfirmation>,
        batch: &mut CallBatch,
    ) {
        log::info!("Tool call: {} {}", call.name, call.args);
        ctx.emit(
            &self.name,
            AgentEvent::ToolCall {
                name: call.name.clone(),
                args: call.args.clone(),
            },
        )
        .await;

        let mut tool_ctx = ToolContext::new(&call.id, &self.name, ctx.state().await)
            .with_confirmation(confirmation);

        let response = match tool_map.get(call.name.as_str()) {
            Some(tool) => match tool.execute(call.args.clone(), &mut tool_ctx).await {
                Ok(res) => res,
                Err(e) => {
                    log::error!("Tool {} failed: {}", call.name, e);
                    ctx.emit(
                        &self.name,
                        AgentEvent::Error(format!("Tool {} failed: {}", call.name, e)),
                    )
                    .await;
                    json!({ "error": e.to_string() })
                }
            },
            None => {
                log::error!("Tool {} not found", call.name);
                ctx.emit(
                    &self.name,
                    AgentEvent::Error(format!("Tool {} not found", call.name)),
                )
                .await;
                json!({ "error": AdkError::tool_not_found(&call.name).to_string() })
            }
        };

        log::info!("Tool {} response: {}", call.name, response);
        ctx.emit(
            &self.name,
            AgentEvent::ToolResult {
                name: call.name.clone(),
                result: response.clone(),
            },
        )
        .await;

        let actions = tool_ctx.actions;
        if !actions.state_delta.is_empty() {
            ctx.apply_state_delta(&self.name, actions.state_delta).await;
        }
        batch.escalate |= actions.escalate;

        match actions.requested_confirmation {
            Some(requested) => {
                let request = ConfirmationRequest {
                    function_call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    args: call.args.clone(),
                    hint: requested.hint,
                    payload: requested.payload,
                };
                batch.paused.push((call.clone(), request));
            }
            None => batch.responses.push(Part::FunctionResponse {
                id: Some(call.id.clone()),
                name: call.name.clone(),
                response,
            }),
        }
    }

    /// Fold a finished batch into the history.
    ///
    /// Returns a status when the agent has to stop here.
    async fn settle(
        &self,
        ctx: &InvocationContext,
        history: &mut Vec<Content>,
        next_turn: u32,
        batch: CallBatch,
    ) -> Result<Option<RunStatus>, AdkError> {
        if !batch.paused.is_empty() {
            let mut requests = Vec::with_capacity(batch.paused.len());
            let mut pending = Vec::with_capacity(batch.paused.len());
            for (call, request) in batch.paused {
                if ctx.pending_confirmation(&call.id).await.is_none() {
                    ctx.add_pending_confirmation(&self.name, request.clone())
                        .await;
                }
                log::info!(
                    "Agent {} paused: tool {} awaits confirmation ({})",
                    self.name,
                    call.name,
                    call.id
                );
                pending.push(call);
                requests.push(request);
            }

            ctx.save_checkpoint(
                &self.name,
                &LlmCheckpoint {
                    history: history.clone(),
                    turn: next_turn,
                    answered: batch.responses,
                    pending,
                },
            )
            .await?;
            return Ok(Some(RunStatus::Paused(requests)));
        }

        history.push(Content {
            role: "user".to_string(),
            parts: batch.responses,
        });

        if batch.escalate {
            log::info!("Agent {} escalated", self.name);
            ctx.clear_checkpoint(&self.name).await;
            let output = match &self.output_key {
                Some(key) => ctx.state().await.get_string(key).unwrap_or_default(),
                None => String::new(),
            };
            return Ok(Some(RunStatus::Escalated(output)));
        }

        Ok(None)
    }

    /// Replay the calls that were waiting for a decision
    async fn resume(
        &self,
        ctx: &InvocationContext,
        tool_map: &HashMap<&str, &Arc<dyn Tool>>,
        checkpoint: LlmCheckpoint,
    ) -> Result<Result<(Vec<Content>, u32), RunStatus>, AdkError> {
        log::info!(
            "Agent {} resuming {} paused tool call(s)",
            self.name,
            checkpoint.pending.len()
        );

        let mut history = checkpoint.history;
        let mut batch = CallBatch {
            responses: checkpoint.answered,
            ..CallBatch::default()
        };

        for call in &checkpoint.pending {
            match ctx.take_confirmation(&call.id).await {
                Some(confirmation) => {
                    self.call_tool(ctx, tool_map, call, Some(confirmation), &mut batch)
                        .await
                }
                None => {
                    let request = match ctx.pending_confirmation(&call.id).await {
                        Some(request) => request,
                        None => {
                            return Err(AdkError::other(format!(
                                "paused call {} has neither a decision nor a pending request",
                                call.id
                            )))
                        }
                    };
                    batch.paused.push((call.clone(), request));
                }
            }
        }

        match self.settle(ctx, &mut history, checkpoint.turn, batch).await? {
            Some(status) => Ok(Err(status)),
            None => Ok(Ok((history, checkpoint.turn))),
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<RunStatus, AdkError> {
        let tools = self.resolve_tools().await?;
        let tool_map: HashMap<&str, &Arc<dyn Tool>> =
            tools.iter().map(|t| (t.name(), t)).collect();

        let (mut history, first_turn) = match ctx.load_checkpoint(&self.name).await? {
            Some(checkpoint) => match self.resume(ctx, &tool_map, checkpoint).await? {
                Ok(resumed) => resumed,
                Err(status) => return Ok(status),
            },
            None => (self.initial_history(ctx).await?, 0),
        };

        for turn in first_turn..self.max_turns {
            log::info!("Agent {} turn {}/{}", self.name, turn + 1, self.max_turns);
            let mut response = self
                .model
                .generate_content(&history, self.generation_config.as_ref(), Some(&tools))
                .await?;

            // Every call needs an id so its response can be matched up later
            let mut calls = Vec::new();
            for part in response.parts.iter_mut() {
                if let Part::FunctionCall { id, name, args } = part {
                    let call_id = id
                        .get_or_insert_with(|| format!("call-{}", uuid::Uuid::new_v4()))
                        .clone();
                    calls.push(PendingCall {
                        id: call_id,
                        name: name.clone(),
                        args: args.clone(),
                    });
                }
            }
            let text = response.text_content();

            if calls.is_empty() {
                if text.is_empty() {
                    log::warn!(
                        "Agent {} received empty response with no function calls",
                        self.name
                    );
                } else {
                    log::info!(
                        "Agent {} returning text response (length: {})",
                        self.name,
                        text.len()
                    );
                    ctx.emit(&self.name, AgentEvent::Answer(text.clone())).await;
                    if let Some(key) = &self.output_key {
                        ctx.set_state(&self.name, key, json!(text)).await;
                    }
                }
                ctx.clear_checkpoint(&self.name).await;
                return Ok(RunStatus::Completed(text));
            }

            if !text.is_empty() {
                ctx.emit(&self.name, AgentEvent::Thought(text)).await;
            }
            history.push(response);

            let mut batch = CallBatch::default();
            for call in &calls {
                self.call_tool(ctx, &tool_map, call, None, &mut batch).await;
            }

            if let Some(status) = self.settle(ctx, &mut history, turn + 1, batch).await? {
                return Ok(status);
            }
        }

        log::error!(
            "Agent {} reached max turns without text response",
            self.name
        );
        ctx.clear_checkpoint(&self.name).await;
        Err(AdkError::MaxIterations {
            kind: "turns".to_string(),
            limit: self.max_turns,
        })
    }
}
