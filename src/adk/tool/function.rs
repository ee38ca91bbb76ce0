// SPDX-License-Identifier: MIT

//! Function-based tool implementation.
//!
//! [`FunctionTool`] turns a plain Rust function into a [`Tool`]. With
//! [`FunctionTool::typed`] the argument struct drives both the JSON schema
//! sent to the model (via `schemars`) and the decoding of the call arguments.

use super::{Tool, ToolContext};
use crate::adk::error::AdkError;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

type ToolFn = dyn Fn(Value, &mut ToolContext) -> Result<Value, AdkError> + Send + Sync;

/// A tool backed by a synchronous function
pub struct FunctionTool {
    name: String,
    description: String,
    schema: Value,
    function: Box<ToolFn>,
}

impl FunctionTool {
    /// Wrap an untyped function taking raw JSON arguments
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: Value,
        function: F,
    ) -> Self
    where
        F: Fn(Value, &mut ToolContext) -> Result<Value, AdkError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
            function: Box::new(function),
        }
    }

    /// Wrap a function whose arguments and result are serde types
    pub fn typed<A, R, F>(name: impl Into<String>, description: impl Into<String>, function: F) -> Self
    where
        A: DeserializeOwned + JsonSchema,
        R: Serialize,
        F: Fn(A, &mut ToolContext) -> R + Send + Sync + 'static,
    {
        let name = name.into();
        let tool_name = name.clone();
        let schema = parameters_schema::<A>();

        Self::new(name, description, schema, move |input, ctx| {
            let input = if input.is_null() { json!({}) } else { input };
            let args: A = serde_json::from_value(input).map_err(|e| AdkError::InvalidToolArgs {
                tool: tool_name.clone(),
                message: e.to_string(),
            })?;
            Ok(serde_json::to_value(function(args, ctx))?)
        })
    }
}

/// JSON schema for a parameters struct, without the root metadata the
/// function-calling APIs reject
pub fn parameters_schema<A: JsonSchema>() -> Value {
    let root = schemars::schema_for!(A);
    let mut schema = serde_json::to_value(root).unwrap_or_else(|_| json!({"type": "object"}));
    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
        map.entry("properties").or_insert_with(|| json!({}));
    }
    schema
}

#[async_trait]
impl Tool for FunctionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, input: Value, ctx: &mut ToolContext) -> Result<Value, AdkError> {
        (self.function)(input, ctx)
    }
}
