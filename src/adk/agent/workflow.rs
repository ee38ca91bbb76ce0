// SPDX-License-Identifier: MIT

//! Workflow agents - containers that orchestrate sub-agents
//!
//! None of these talk to a model themselves. They share the invocation's
//! session with their children, so data moves between stages through state.

use super::{Agent, AgentEvent, InvocationContext, RunStatus};
use crate::adk::error::AdkError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SequentialCheckpoint {
    next: usize,
    escalated: bool,
    last_output: String,
}

/// Runs sub-agents one after another; the result is the last one's output
pub struct SequentialAgent {
    pub name: String,
    pub description: String,
    pub sub_agents: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    pub fn new(name: String, description: String, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            name,
            description,
            sub_agents,
        }
    }
}

#[async_trait]
impl Agent for SequentialAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<RunStatus, AdkError> {
        let checkpoint: SequentialCheckpoint =
            ctx.load_checkpoint(&self.name).await?.unwrap_or_default();
        if checkpoint.next > 0 {
            log::info!(
                "SequentialAgent {} resuming at step {}/{}",
                self.name,
                checkpoint.next + 1,
                self.sub_agents.len()
            );
        }

        let mut escalated = checkpoint.escalated;
        let mut last_output = checkpoint.last_output;

        for (idx, agent) in self.sub_agents.iter().enumerate().skip(checkpoint.next) {
            log::info!(
                "SequentialAgent {} step {}/{}: {}",
                self.name,
                idx + 1,
                self.sub_agents.len(),
                agent.name()
            );
            match agent.run(ctx).await? {
                RunStatus::Completed(out) => last_output = out,
                RunStatus::Escalated(out) => {
                    last_output = out;
                    escalated = true;
                }
                RunStatus::Paused(requests) => {
                    ctx.save_checkpoint(
                        &self.name,
                        &SequentialCheckpoint {
                            next: idx,
                            escalated,
                            last_output,
                        },
                    )
                    .await?;
                    return Ok(RunStatus::Paused(requests));
                }
            }
        }

        ctx.clear_checkpoint(&self.name).await;
        Ok(if escalated {
            RunStatus::Escalated(last_output)
        } else {
            RunStatus::Completed(last_output)
        })
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LoopCheckpoint {
    iteration: u32,
    next: usize,
    last_output: String,
}

/// Repeats its sub-agents until one escalates or the iteration cap is hit
pub struct LoopAgent {
    pub name: String,
    pub description: String,
    pub sub_agents: Vec<Arc<dyn Agent>>,
    /// `None` loops until a sub-agent escalates
    pub max_iterations: Option<u32>,
}

impl LoopAgent {
    pub fn new(
        name: String,
        description: String,
        sub_agents: Vec<Arc<dyn Agent>>,
        max_iterations: Option<u32>,
    ) -> Self {
        Self {
            name,
            description,
            sub_agents,
            max_iterations,
        }
    }
}

#[async_trait]
impl Agent for LoopAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<RunStatus, AdkError> {
        let checkpoint: LoopCheckpoint = ctx.load_checkpoint(&self.name).await?.unwrap_or_default();
        let mut iteration = checkpoint.iteration;
        let mut start = checkpoint.next;
        let mut last_output = checkpoint.last_output;

        if self.sub_agents.is_empty() {
            return Ok(RunStatus::Completed(last_output));
        }

        while self.max_iterations.map_or(true, |max| iteration < max) {
            log::info!(
                "LoopAgent {} iteration {}{}",
                self.name,
                iteration + 1,
                self.max_iterations
                    .map(|m| format!("/{}", m))
                    .unwrap_or_default()
            );

            for (idx, agent) in self.sub_agents.iter().enumerate().skip(start) {
                match agent.run(ctx).await? {
                    RunStatus::Completed(out) => last_output = out,
                    RunStatus::Escalated(out) => {
                        log::info!(
                            "LoopAgent {} stopped by {} after iteration {}",
                            self.name,
                            agent.name(),
                            iteration + 1
                        );
                        ctx.emit(&self.name, AgentEvent::Escalated).await;
                        ctx.clear_checkpoint(&self.name).await;
                        let out = if out.is_empty() { last_output } else { out };
                        return Ok(RunStatus::Completed(out));
                    }
                    RunStatus::Paused(requests) => {
                        ctx.save_checkpoint(
                            &self.name,
                            &LoopCheckpoint {
                                iteration,
                                next: idx,
                                last_output,
                            },
                        )
                        .await?;
                        return Ok(RunStatus::Paused(requests));
                    }
                }
            }

            start = 0;
            iteration += 1;
        }

        ctx.clear_checkpoint(&self.name).await;
        Ok(RunStatus::Completed(last_output))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ParallelCheckpoint {
    finished: BTreeMap<usize, String>,
    escalated: bool,
}

/// Runs sub-agents concurrently on the same session
pub struct ParallelAgent {
    pub name: String,
    pub description: String,
    pub sub_agents: Vec<Arc<dyn Agent>>,
}

impl ParallelAgent {
    pub fn new(name: String, description: String, sub_agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            name,
            description,
            sub_agents,
        }
    }
}

#[async_trait]
impl Agent for ParallelAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<RunStatus, AdkError> {
        let mut checkpoint: ParallelCheckpoint =
            ctx.load_checkpoint(&self.name).await?.unwrap_or_default();

        // Dropping the set aborts branches still running when one fails
        let mut branches = JoinSet::new();
        for (idx, agent) in self.sub_agents.iter().enumerate() {
            if checkpoint.finished.contains_key(&idx) {
                continue;
            }
            let agent = agent.clone();
            let ctx = ctx.clone();
            branches.spawn(async move { (idx, agent.run(&ctx).await) });
        }

        let mut paused = BTreeMap::new();
        while let Some(joined) = branches.join_next().await {
            let (idx, result) = joined?;
            match result? {
                RunStatus::Completed(out) => {
                    checkpoint.finished.insert(idx, out);
                }
                RunStatus::Escalated(out) => {
                    checkpoint.escalated = true;
                    checkpoint.finished.insert(idx, out);
                }
                RunStatus::Paused(requests) => {
                    paused.insert(idx, requests);
                }
            }
        }
        let paused: Vec<_> = paused.into_values().flatten().collect();

        if !paused.is_empty() {
            ctx.save_checkpoint(&self.name, &checkpoint).await?;
            return Ok(RunStatus::Paused(paused));
        }

        ctx.clear_checkpoint(&self.name).await;
        let combined = checkpoint
            .finished
            .into_values()
            .filter(|out| !out.is_empty())
            .collect::<Vec<_>>()
            .join("\n---\n");

        Ok(if checkpoint.escalated {
            RunStatus::Escalated(combined)
        } else {
            RunStatus::Completed(combined)
        })
    }
}
