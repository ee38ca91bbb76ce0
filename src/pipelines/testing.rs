// SPDX-License-Identifier: MIT

//! Scripted model for pipeline tests

use crate::adk::error::AdkError;
use crate::adk::model::{Content, GenerationConfig, Model, Part};
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned replies in order and records every history it was sent
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Content>>,
    seen: Mutex<Vec<Vec<Content>>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Content>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|t| Content::text("model", *t)).collect())
    }

    pub fn call(id: &str, name: &str, args: Value) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                id: Some(id.to_string()),
                name: name.to_string(),
                args,
            }],
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn history(&self, call: usize) -> Vec<Content> {
        self.seen.lock().unwrap()[call].clone()
    }

    /// System instruction of every call, in order
    pub fn system_prompts(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|h| h[0].text_content())
            .collect()
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn generate_content(
        &self,
        history: &[Content],
        _config: Option<&GenerationConfig>,
        _tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AdkError> {
        self.seen.lock().unwrap().push(history.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AdkError::other("scripted model ran out of replies"))
    }
}
