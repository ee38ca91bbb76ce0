// SPDX-License-Identifier: MIT

use crate::adk::agent::Agent;
use std::sync::Arc;

/// Whether paused invocations may be resumed later
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumabilityConfig {
    pub is_resumable: bool,
}

impl ResumabilityConfig {
    pub fn resumable() -> Self {
        Self { is_resumable: true }
    }
}

/// A named root agent plus app-wide settings
#[derive(Clone)]
pub struct App {
    pub name: String,
    pub root_agent: Arc<dyn Agent>,
    pub resumability: ResumabilityConfig,
}

impl App {
    pub fn new(name: impl Into<String>, root_agent: Arc<dyn Agent>) -> Self {
        Self {
            name: name.into(),
            root_agent,
            resumability: ResumabilityConfig::default(),
        }
    }

    pub fn with_resumability(mut self, resumability: ResumabilityConfig) -> Self {
        self.resumability = resumability;
        self
    }

    pub fn is_resumable(&self) -> bool {
        self.resumability.is_resumable
    }
}
