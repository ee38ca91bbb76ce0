// SPDX-License-Identifier: MIT

//! Agent pipelines on a small ADK-style framework
//!
//! [`adk`] holds the framework: models, tools, sessions, agents and the
//! runner. [`pipelines`] builds the concrete apps on top of it.

pub mod adk;
pub mod pipelines;
