// SPDX-License-Identifier: MIT

//! Model endpoint settings shared by every pipeline
//!
//! Values come from built-in defaults, then an optional YAML file, then the
//! environment (`OPENROUTER_API_KEY`, `OPENROUTER_API_BASE`, `ADK_MODEL`).

use crate::adk::error::{AdkError, ModelError};
use crate::adk::model::openai::OpenAIModel;
use crate::adk::model::{GenerationConfig, Model};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_MCP_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_API_BASE: &str = "OPENROUTER_API_BASE";
pub const ENV_MODEL: &str = "ADK_MODEL";

const PROVIDER: &str = "openrouter";

static DEFAULT_ALIASES: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "gemini-2.5-flash".to_string(),
            "openrouter/google/gemini-2.5-flash".to_string(),
        ),
        (
            "gemini-2.5-flash-lite".to_string(),
            "openrouter/google/gemini-2.5-flash-lite".to_string(),
        ),
    ])
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub api_base: String,
    /// Never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub model_aliases: BTreeMap<String, String>,
    pub mcp_timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            model_aliases: DEFAULT_ALIASES.clone(),
            mcp_timeout_secs: DEFAULT_MCP_TIMEOUT_SECS,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl Settings {
    /// Defaults, overridden by `path` (if any), overridden by the environment
    pub fn load(path: Option<&Path>) -> Result<Self, AdkError> {
        dotenv::dotenv().ok();

        let mut settings = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, AdkError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Apply overrides from a variable lookup (the process env in production)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(base) = non_empty(ENV_API_BASE) {
            self.api_base = base;
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.model = model;
        }
    }

    pub fn validate(&self) -> Result<(), AdkError> {
        let url = url::Url::parse(&self.api_base)
            .map_err(|e| AdkError::config(format!("invalid api_base '{}': {}", self.api_base, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AdkError::config(format!(
                "api_base must be http(s), got '{}'",
                self.api_base
            )));
        }
        if self.model.trim().is_empty() {
            return Err(AdkError::config("model must not be empty"));
        }
        if self.mcp_timeout_secs == 0 {
            return Err(AdkError::config("mcp_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Model id sent to the endpoint: alias target without the provider prefix
    pub fn resolve_model(&self, name: &str) -> String {
        let target = self
            .model_aliases
            .get(name)
            .map(String::as_str)
            .unwrap_or(name);
        target
            .strip_prefix("openrouter/")
            .unwrap_or(target)
            .to_string()
    }

    pub fn generation_config(&self) -> Option<GenerationConfig> {
        if self.temperature.is_none() && self.max_output_tokens.is_none() {
            return None;
        }
        Some(GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            top_p: None,
        })
    }

    pub fn build_model(&self) -> Result<Arc<dyn Model>, AdkError> {
        let api_key = self
            .api_key
            .clone()
            .ok_or_else(|| ModelError::ApiKeyMissing(PROVIDER.to_string()))?;
        let model_id = self.resolve_model(&self.model);
        log::info!("Using model {} via {}", model_id, self.api_base);

        let model = OpenAIModel::with_endpoint(PROVIDER, model_id, api_key, &self.api_base)?;
        Ok(Arc::new(model))
    }
}
