// SPDX-License-Identifier: MIT

//! Story writer: one draft, then up to two critique/refine rounds
//!
//! The refiner either rewrites `current_story` from the `critique` or, once
//! the critic answers exactly `APPROVED`, calls `exit_loop` to leave the
//! loop early.

use super::tools::exit_loop_tool;
use super::ModelSpec;
use crate::adk::agent::{Agent, LoopAgent, SequentialAgent};
use crate::adk::app::App;
use crate::adk::tool::Tool;
use std::sync::Arc;

pub const APP_NAME: &str = "story_writer";

pub const STORY_KEY: &str = "current_story";
pub const CRITIQUE_KEY: &str = "critique";

pub const MAX_REFINEMENTS: u32 = 2;

const INITIAL_WRITER_INSTRUCTION: &str = "Based on the user's prompt, write the first draft of a short story (around 100-150 words).
    Output only the story text, with no introduction or explanation.";

const CRITIC_INSTRUCTION: &str = r#"You are a constructive story critic. Review the story provided below.
    Story: {current_story}
    
    Evaluate the story's plot, characters, and pacing.
    - If the story is well-written and complete, you MUST respond with the exact phrase: "APPROVED"
    - Otherwise, provide 2-3 specific, actionable suggestions for improvement."#;

const REFINER_INSTRUCTION: &str = r#"You are a story refiner. You have a story draft and critique.
    
    Story Draft: {current_story}
    Critique: {critique}
    
    Your task is to analyze the critique.
    - IF the critique is EXACTLY "APPROVED", you MUST call the `exit_loop` function and nothing else.
    - OTHERWISE, rewrite the story draft to fully incorporate the feedback from the critique."#;

pub fn root_agent(spec: &ModelSpec) -> SequentialAgent {
    let initial_writer: Arc<dyn Agent> = Arc::new(
        spec.agent(
            "InitialWriterAgent",
            "Writes the first draft",
            INITIAL_WRITER_INSTRUCTION,
        )
        .with_output_key(STORY_KEY),
    );

    let critic: Arc<dyn Agent> = Arc::new(
        spec.agent("CriticAgent", "Reviews the current draft", CRITIC_INSTRUCTION)
            .with_output_key(CRITIQUE_KEY),
    );

    let exit_loop: Arc<dyn Tool> = Arc::new(exit_loop_tool());
    let refiner: Arc<dyn Agent> = Arc::new(
        spec.agent_with_tools(
            "RefinerAgent",
            "Rewrites the draft or ends the loop",
            REFINER_INSTRUCTION,
            vec![exit_loop],
        )
        .with_output_key(STORY_KEY),
    );

    let refinement: Arc<dyn Agent> = Arc::new(LoopAgent::new(
        "StoryRefinementLoop".to_string(),
        "Critique and refine until approved".to_string(),
        vec![critic, refiner],
        Some(MAX_REFINEMENTS),
    ));

    SequentialAgent::new(
        "StoryPipeline".to_string(),
        "Draft a short story and refine it".to_string(),
        vec![initial_writer, refinement],
    )
}

pub fn app(spec: &ModelSpec) -> App {
    App::new(APP_NAME, Arc::new(root_agent(spec)))
}
