// SPDX-License-Identifier: MIT

//! Local function tools used by the pipelines

pub mod exit_loop;
pub mod shipping;

pub use exit_loop::{exit_loop, exit_loop_tool};
pub use shipping::{place_shipping_order, shipping_order_tool, LARGE_ORDER_THRESHOLD};
