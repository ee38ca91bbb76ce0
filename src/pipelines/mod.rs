// SPDX-License-Identifier: MIT

//! The four agent apps and the catalog that builds them by name

pub mod blog_writer;
pub mod config;
pub mod image_agent;
pub mod mcp;
pub mod server;
pub mod shipping_agent;
pub mod story_writer;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

use crate::adk::agent::LlmAgent;
use crate::adk::app::App;
use crate::adk::error::AdkError;
use crate::adk::model::{GenerationConfig, Model};
use crate::adk::tool::Tool;
use config::Settings;
use mcp::McpServiceManager;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Model and sampling settings shared by every agent of an app
#[derive(Clone)]
pub struct ModelSpec {
    pub model: Arc<dyn Model>,
    pub generation_config: Option<GenerationConfig>,
}

impl ModelSpec {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            generation_config: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AdkError> {
        Ok(Self {
            model: settings.build_model()?,
            generation_config: settings.generation_config(),
        })
    }

    pub fn agent(&self, name: &str, description: &str, instruction: &str) -> LlmAgent {
        self.agent_with_tools(name, description, instruction, Vec::new())
    }

    pub fn agent_with_tools(
        &self,
        name: &str,
        description: &str,
        instruction: &str,
        tools: Vec<Arc<dyn Tool>>,
    ) -> LlmAgent {
        let agent = LlmAgent::new(
            name.to_string(),
            description.to_string(),
            instruction.to_string(),
            self.model.clone(),
            tools,
        );
        match &self.generation_config {
            Some(config) => agent.with_generation_config(config.clone()),
            None => agent,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AppInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub resumable: bool,
}

pub const APPS: [AppInfo; 4] = [
    AppInfo {
        name: blog_writer::APP_NAME,
        description: "Outline, write and edit a short blog post",
        resumable: false,
    },
    AppInfo {
        name: story_writer::APP_NAME,
        description: "Draft a short story and refine it with a critic",
        resumable: false,
    },
    AppInfo {
        name: image_agent::APP_NAME,
        description: "Generate images through an MCP server",
        resumable: false,
    },
    AppInfo {
        name: shipping_agent::APP_NAME,
        description: "Place shipping orders with human approval for large ones",
        resumable: true,
    },
];

pub fn app_info(name: &str) -> Option<&'static AppInfo> {
    APPS.iter().find(|info| info.name == name)
}

/// Builds apps by name from one set of settings
pub struct Catalog {
    settings: Settings,
    mcp: Arc<McpServiceManager>,
}

impl Catalog {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            mcp: Arc::new(McpServiceManager::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn build_app(&self, name: &str) -> Result<App, AdkError> {
        if app_info(name).is_none() {
            return Err(AdkError::UnknownApp(name.to_string()));
        }
        let spec = ModelSpec::from_settings(&self.settings)?;
        self.build_app_with(name, &spec)
    }

    /// Same as [`Catalog::build_app`] with an explicit model
    pub fn build_app_with(&self, name: &str, spec: &ModelSpec) -> Result<App, AdkError> {
        let app = match name {
            blog_writer::APP_NAME => blog_writer::app(spec),
            story_writer::APP_NAME => story_writer::app(spec),
            image_agent::APP_NAME => {
                let timeout = Duration::from_secs(self.settings.mcp_timeout_secs);
                let images = image_agent::mcp_image_server(self.mcp.clone(), timeout);
                image_agent::app(spec, Arc::new(images))
            }
            shipping_agent::APP_NAME => shipping_agent::app(spec),
            other => return Err(AdkError::UnknownApp(other.to_string())),
        };
        log::debug!("Built app {}", app.name);
        Ok(app)
    }
}
