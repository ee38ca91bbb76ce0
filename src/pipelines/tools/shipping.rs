// SPDX-License-Identifier: MIT

//! Shipping orders with human approval for large quantities
//!
//! The tool runs twice for a large order: the first call requests a
//! confirmation and reports `pending`; once a human has decided, the same
//! call is replayed with the decision on [`ToolContext::tool_confirmation`].

use crate::adk::tool::{FunctionTool, ToolContext};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Orders above this many containers need a human decision
pub const LARGE_ORDER_THRESHOLD: u32 = 5;

pub const TOOL_NAME: &str = "place_shipping_order";

const DESCRIPTION: &str = "Places a shipping order. Requires approval if ordering more than 5 containers (LARGE_ORDER_THRESHOLD).";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ShippingOrderArgs {
    /// Number of containers to ship
    pub num_containers: u32,
    /// Shipping destination
    pub destination: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Approved,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShippingOrderResult {
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_containers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub message: String,
}

impl ShippingOrderResult {
    fn approved(num_containers: u32, destination: &str, suffix: &str, message: String) -> Self {
        Self {
            status: OrderStatus::Approved,
            order_id: Some(format!("ORD-{}-{}", num_containers, suffix)),
            num_containers: Some(num_containers),
            destination: Some(destination.to_string()),
            message,
        }
    }

    fn bare(status: OrderStatus, message: String) -> Self {
        Self {
            status,
            order_id: None,
            num_containers: None,
            destination: None,
            message,
        }
    }
}

pub fn place_shipping_order(args: ShippingOrderArgs, ctx: &mut ToolContext) -> ShippingOrderResult {
    let ShippingOrderArgs {
        num_containers,
        destination,
    } = args;

    if num_containers <= LARGE_ORDER_THRESHOLD {
        return ShippingOrderResult::approved(
            num_containers,
            &destination,
            "AUTO",
            format!(
                "Order auto-approved: {} containers to {}",
                num_containers, destination
            ),
        );
    }

    let Some(confirmation) = ctx.tool_confirmation.as_ref() else {
        log::info!(
            "Order of {} containers to {} waits for approval",
            num_containers,
            destination
        );
        ctx.request_confirmation(
            format!(
                "⚠️ Large order: {} containers to {}. Do you want to approve?",
                num_containers, destination
            ),
            Some(json!({
                "num_containers": num_containers,
                "destination": destination,
            })),
        );
        return ShippingOrderResult::bare(
            OrderStatus::Pending,
            format!("Order for {} containers requires approval", num_containers),
        );
    };

    if confirmation.confirmed {
        ShippingOrderResult::approved(
            num_containers,
            &destination,
            "HUMAN",
            format!(
                "Order approved: {} containers to {}",
                num_containers, destination
            ),
        )
    } else {
        ShippingOrderResult::bare(
            OrderStatus::Rejected,
            format!(
                "Order rejected: {} containers to {}",
                num_containers, destination
            ),
        )
    }
}

pub fn shipping_order_tool() -> FunctionTool {
    FunctionTool::typed(TOOL_NAME, DESCRIPTION, place_shipping_order)
}
