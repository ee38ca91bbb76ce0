// SPDX-License-Identifier: MIT

pub mod agent;
pub mod app;
pub mod error;
pub mod model;
pub mod runner;
pub mod session;
pub mod tool;

pub use agent::{Agent, AgentEvent, InvocationContext, LlmAgent, LoopAgent, ParallelAgent, RunStatus, SequentialAgent};
pub use app::{App, ResumabilityConfig};
pub use error::{AdkError, ModelError, SessionError};
pub use runner::{InvocationStatus, RunOutcome, Runner};
