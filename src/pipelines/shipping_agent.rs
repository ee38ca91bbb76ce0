// SPDX-License-Identifier: MIT

//! Shipping coordinator with human approval for large orders
//!
//! The app is resumable: a large order pauses the invocation until
//! [`Runner::resume`](crate::adk::runner::Runner::resume) supplies a decision.

use super::tools::shipping_order_tool;
use super::ModelSpec;
use crate::adk::agent::LlmAgent;
use crate::adk::app::{App, ResumabilityConfig};
use crate::adk::tool::Tool;
use std::sync::Arc;

pub const APP_NAME: &str = "shipping_agent";

const INSTRUCTION: &str = "You are a shipping coordinator assistant.
  
  When users request to ship containers:
   1. Use the place_shipping_order tool with the number of containers and destination
   2. If the order status is 'pending', inform the user that approval is required
   3. After receiving the final result, provide a clear summary including:
      - Order status (approved/rejected)
      - Order ID (if available)
      - Number of containers and destination
   4. Keep responses concise but informative
  ";

pub fn root_agent(spec: &ModelSpec) -> LlmAgent {
    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(shipping_order_tool())];
    spec.agent_with_tools(
        "shipping_agent",
        "Places shipping orders, asking a human before large ones",
        INSTRUCTION,
        tools,
    )
}

pub fn app(spec: &ModelSpec) -> App {
    App::new(APP_NAME, Arc::new(root_agent(spec)))
        .with_resumability(ResumabilityConfig::resumable())
}
