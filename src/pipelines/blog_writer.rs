// SPDX-License-Identifier: MIT

//! Blog writer: outline, draft, then edit
//!
//! Each stage reads the previous stage's output from session state
//! (`blog_outline` then `blog_draft`) and the editor's text ends up in
//! `final_blog`.

use super::ModelSpec;
use crate::adk::agent::{Agent, SequentialAgent};
use crate::adk::app::App;
use std::sync::Arc;

pub const APP_NAME: &str = "blog_writer";

pub const OUTLINE_KEY: &str = "blog_outline";
pub const DRAFT_KEY: &str = "blog_draft";
pub const FINAL_KEY: &str = "final_blog";

const OUTLINE_INSTRUCTION: &str = "Создайте план блога по заданной теме, включающий:
    1. Цепляющий заголовок
    2. Вступительную завязку
    3. 3–5 основных разделов с 2–3 тезисами в каждом
    4. Заключительную мысль";

const WRITER_INSTRUCTION: &str = "Строго следуйте этому плану: {blog_outline}
    Напишите краткую запись в блоге объёмом 200–300 слов, содержательную и увлекательную.";

const EDITOR_INSTRUCTION: &str = "Отредактируй этот черновик: {blog_draft}
    Ваша задача — отшлифовать текст, исправив грамматические ошибки, улучшив последовательность и структуру предложений, а также повысив общую ясность.";

pub fn root_agent(spec: &ModelSpec) -> SequentialAgent {
    let outline: Arc<dyn Agent> = Arc::new(
        spec.agent(
            "OutlineAgent",
            "Creates the initial blog post outline",
            OUTLINE_INSTRUCTION,
        )
        .with_output_key(OUTLINE_KEY),
    );
    let writer: Arc<dyn Agent> = Arc::new(
        spec.agent(
            "WriterAgent",
            "Writes the full post from the outline",
            WRITER_INSTRUCTION,
        )
        .with_output_key(DRAFT_KEY),
    );
    let editor: Arc<dyn Agent> = Arc::new(
        spec.agent("EditorAgent", "Polishes the draft", EDITOR_INSTRUCTION)
            .with_output_key(FINAL_KEY),
    );

    SequentialAgent::new(
        "BlogPipeline".to_string(),
        "Outline, write and edit a short blog post".to_string(),
        vec![outline, writer, editor],
    )
}

pub fn app(spec: &ModelSpec) -> App {
    App::new(APP_NAME, Arc::new(root_agent(spec)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::runner::Runner;
    use crate::pipelines::testing::ScriptedModel;

    #[tokio::test]
    async fn test_stages_pass_text_through_state() {
        let model = Arc::new(ScriptedModel::texts(&["OUTLINE", "DRAFT", "FINAL"]));
        let runner = Runner::new(app(&ModelSpec::new(model.clone())));

        let outcome = runner.run(None, "Rust в продакшене").await.unwrap();
        assert_eq!(outcome.output(), Some("FINAL"));
        assert_eq!(outcome.state[OUTLINE_KEY], "OUTLINE");
        assert_eq!(outcome.state[DRAFT_KEY], "DRAFT");
        assert_eq!(outcome.state[FINAL_KEY], "FINAL");

        let prompts = model.system_prompts();
        assert!(prompts[1].starts_with("Строго следуйте этому плану: OUTLINE"));
        assert!(prompts[2].starts_with("Отредактируй этот черновик: DRAFT"));
    }

    #[test]
    fn test_agent_names() {
        let model = Arc::new(ScriptedModel::texts(&[]));
        let root = root_agent(&ModelSpec::new(model));
        assert_eq!(root.name(), "BlogPipeline");
        let names: Vec<&str> = root.sub_agents.iter().map(|a| a.name()).collect();
        assert_eq!(names, ["OutlineAgent", "WriterAgent", "EditorAgent"]);
    }
}
