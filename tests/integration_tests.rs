//! Integration tests for the pipelines
//!
//! These tests drive each app end-to-end through the public runner using mock components.

use adk_pipelines::adk::agent::{Agent, AgentEvent, InvocationContext, ParallelAgent, RunStatus};
use adk_pipelines::adk::error::{AdkError, SessionError};
use adk_pipelines::adk::model::{Content, GenerationConfig, Model, Part};
use adk_pipelines::adk::runner::{InvocationStatus, Runner};
use adk_pipelines::adk::session::InMemorySessionService;
use adk_pipelines::adk::tool::{Tool, Toolset};
use adk_pipelines::adk::App;
use adk_pipelines::pipelines::config::Settings;
use adk_pipelines::pipelines::{blog_writer, image_agent, shipping_agent, story_writer};
use adk_pipelines::pipelines::{Catalog, ModelSpec, APPS};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that returns predefined responses and remembers what it saw
struct MockModel {
    responses: Vec<Content>,
    response_index: AtomicUsize,
    histories: Mutex<Vec<Vec<Content>>>,
}

impl MockModel {
    fn new(responses: Vec<Content>) -> Arc<Self> {
        Arc::new(Self {
            responses,
            response_index: AtomicUsize::new(0),
            histories: Mutex::new(Vec::new()),
        })
    }

    fn text_response(text: &str) -> Content {
        Content::text("model", text)
    }

    fn tool_call_response(id: &str, tool_name: &str, args: Value) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                id: Some(id.to_string()),
                name: tool_name.to_string(),
                args,
            }],
        }
    }

    fn calls(&self) -> usize {
        self.response_index.load(Ordering::SeqCst)
    }

    fn instruction(&self, call: usize) -> String {
        self.histories.lock().unwrap()[call][0].text_content()
    }

    fn last_function_response(&self, call: usize) -> Option<Value> {
        let histories = self.histories.lock().unwrap();
        histories[call].last()?.parts.iter().find_map(|p| match p {
            Part::FunctionResponse { response, .. } => Some(response.clone()),
            _ => None,
        })
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_content(
        &self,
        history: &[Content],
        _config: Option<&GenerationConfig>,
        _tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, AdkError> {
        self.histories.lock().unwrap().push(history.to_vec());
        let idx = self.response_index.fetch_add(1, Ordering::SeqCst);
        if idx < self.responses.len() {
            Ok(self.responses[idx].clone())
        } else {
            Ok(MockModel::text_response("Max responses reached"))
        }
    }
}

/// Static schema for MockTool
static MOCK_TOOL_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {}
    })
});

/// Mock tool that returns predefined response
struct MockTool {
    name: String,
    response: Value,
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Mock tool"
    }

    fn schema(&self) -> &Value {
        &MOCK_TOOL_SCHEMA
    }

    async fn execute(
        &self,
        _input: Value,
        _ctx: &mut adk_pipelines::adk::tool::ToolContext,
    ) -> Result<Value, AdkError> {
        Ok(self.response.clone())
    }
}

/// Stands in for the MCP server
struct MockToolset;

#[async_trait]
impl Toolset for MockToolset {
    fn name(&self) -> &str {
        "everything"
    }

    async fn get_tools(&self) -> Result<Vec<Arc<dyn Tool>>, AdkError> {
        Ok(vec![Arc::new(MockTool {
            name: "getTinyImage".to_string(),
            response: json!({"content": [{"type": "image", "mimeType": "image/png", "data": "AAAA"}]}),
        })])
    }
}

/// Mock agent that writes its output under its own name
struct MockAgent {
    name: String,
    output: String,
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &InvocationContext) -> Result<RunStatus, AdkError> {
        ctx.set_state(&self.name, &self.name, json!(self.output)).await;
        Ok(RunStatus::Completed(self.output.clone()))
    }
}

fn spec(model: &Arc<MockModel>) -> ModelSpec {
    ModelSpec::new(model.clone())
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_catalog_lists_four_apps() {
    let names: Vec<&str> = APPS.iter().map(|a| a.name).collect();
    assert_eq!(
        names,
        ["blog_writer", "story_writer", "image_agent", "shipping_agent"]
    );
}

#[test]
fn test_catalog_builds_with_explicit_model() {
    let catalog = Catalog::new(Settings::default());
    let model = MockModel::new(vec![]);

    let app = catalog.build_app_with("shipping_agent", &spec(&model)).unwrap();
    assert!(app.is_resumable());
    assert_eq!(app.root_agent.name(), "shipping_agent");

    let err = catalog.build_app_with("nope", &spec(&model)).err().unwrap();
    assert!(matches!(err, AdkError::UnknownApp(_)));
}

// ============================================================================
// Blog Writer Tests
// ============================================================================

#[tokio::test]
async fn test_blog_writer_fills_state_keys() {
    let model = MockModel::new(vec![
        MockModel::text_response("# План"),
        MockModel::text_response("Черновик"),
        MockModel::text_response("Готовый текст"),
    ]);
    let runner = Runner::new(blog_writer::app(&spec(&model)));

    let outcome = runner.run(None, "Асинхронный Rust").await.unwrap();

    assert_eq!(outcome.output(), Some("Готовый текст"));
    assert_eq!(outcome.state["blog_outline"], "# План");
    assert_eq!(outcome.state["blog_draft"], "Черновик");
    assert_eq!(outcome.state["final_blog"], "Готовый текст");
    assert!(model.instruction(1).contains("# План"));
    assert!(model.instruction(2).contains("Черновик"));
}

#[tokio::test]
async fn test_blog_writer_empty_outline_fails() {
    // An empty answer leaves `blog_outline` unset, so the writer cannot fill its instruction
    let model = MockModel::new(vec![MockModel::text_response("")]);
    let runner = Runner::new(blog_writer::app(&spec(&model)));

    let err = runner.run(None, "topic").await.unwrap_err();
    assert!(matches!(err, AdkError::MissingStateKey(key) if key == "blog_outline"));
}

// ============================================================================
// Story Writer Tests
// ============================================================================

#[tokio::test]
async fn test_story_writer_exit_loop() {
    let model = MockModel::new(vec![
        MockModel::text_response("Once upon a time"),
        MockModel::text_response("APPROVED"),
        MockModel::tool_call_response("exit-1", "exit_loop", json!({})),
    ]);
    let runner = Runner::new(story_writer::app(&spec(&model)));

    let outcome = runner.run(None, "a dragon").await.unwrap();

    assert_eq!(outcome.output(), Some("Once upon a time"));
    assert_eq!(outcome.state["current_story"], "Once upon a time");
    // No model turn follows the escalation
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn test_story_writer_runs_two_refinements() {
    let model = MockModel::new(vec![
        MockModel::text_response("v1"),
        MockModel::text_response("more dialogue"),
        MockModel::text_response("v2"),
        MockModel::text_response("shorter ending"),
        MockModel::text_response("v3"),
    ]);
    let runner = Runner::new(story_writer::app(&spec(&model)));

    let outcome = runner.run(None, "a dragon").await.unwrap();

    assert_eq!(outcome.state["current_story"], "v3");
    assert_eq!(outcome.state["critique"], "shorter ending");
    assert_eq!(model.calls(), 5);
}

// ============================================================================
// Image Agent Tests
// ============================================================================

#[tokio::test]
async fn test_image_agent_uses_toolset() {
    let model = MockModel::new(vec![
        MockModel::tool_call_response("img-1", "getTinyImage", json!({})),
        MockModel::text_response("Here is a tiny image."),
    ]);
    let runner = Runner::new(image_agent::app(&spec(&model), Arc::new(MockToolset)));

    let outcome = runner.run(None, "show me an image").await.unwrap();

    assert_eq!(outcome.output(), Some("Here is a tiny image."));
    let response = model.last_function_response(1).unwrap();
    assert_eq!(response["content"][0]["type"], "image");
}

// ============================================================================
// Shipping Agent Tests
// ============================================================================

fn large_order_model(final_text: &str) -> Arc<MockModel> {
    MockModel::new(vec![
        MockModel::tool_call_response(
            "ship-1",
            "place_shipping_order",
            json!({"num_containers": 12, "destination": "Singapore"}),
        ),
        MockModel::text_response(final_text),
    ])
}

#[tokio::test]
async fn test_shipping_small_order_auto_approved() {
    let model = MockModel::new(vec![
        MockModel::tool_call_response(
            "ship-1",
            "place_shipping_order",
            json!({"num_containers": 4, "destination": "Singapore"}),
        ),
        MockModel::text_response("Approved ORD-4-AUTO"),
    ]);
    let runner = Runner::new(shipping_agent::app(&spec(&model)));

    let outcome = runner.run(None, "ship 4 to Singapore").await.unwrap();

    assert!(matches!(outcome.status, InvocationStatus::Completed { .. }));
    let response = model.last_function_response(1).unwrap();
    assert_eq!(response["status"], "approved");
    assert_eq!(response["order_id"], "ORD-4-AUTO");
}

#[tokio::test]
async fn test_shipping_large_order_approved_after_pause() {
    let model = large_order_model("Order ORD-12-HUMAN approved");
    let runner = Runner::new(shipping_agent::app(&spec(&model)));

    let paused = runner.run(Some("sess"), "ship 12 to Singapore").await.unwrap();
    let request = paused.confirmations()[0].clone();
    assert_eq!(request.tool_name, "place_shipping_order");
    assert_eq!(
        request.payload,
        Some(json!({"num_containers": 12, "destination": "Singapore"}))
    );

    let done = runner.resume("sess", &request.function_call_id, true).await.unwrap();
    assert_eq!(done.output(), Some("Order ORD-12-HUMAN approved"));

    let response = model.last_function_response(1).unwrap();
    assert_eq!(response["order_id"], "ORD-12-HUMAN");
    assert_eq!(
        response["message"],
        "Order approved: 12 containers to Singapore"
    );
}

#[tokio::test]
async fn test_shipping_large_order_rejected_after_pause() {
    let model = large_order_model("The order was rejected");
    let runner = Runner::new(shipping_agent::app(&spec(&model)));

    runner.run(Some("sess"), "ship 12 to Singapore").await.unwrap();
    let done = runner.resume("sess", "ship-1", false).await.unwrap();

    assert_eq!(done.output(), Some("The order was rejected"));
    let response = model.last_function_response(1).unwrap();
    assert_eq!(response["status"], "rejected");
    assert_eq!(
        response["message"],
        "Order rejected: 12 containers to Singapore"
    );
}

#[tokio::test]
async fn test_shipping_pause_is_recorded_in_events() {
    let model = large_order_model("done");
    let sessions = InMemorySessionService::new();
    let runner = Runner::with_session_service(shipping_agent::app(&spec(&model)), sessions.clone());

    runner.run(Some("sess"), "ship 12").await.unwrap();

    let session = sessions.get("sess").await.unwrap();
    let guard = session.read().await;
    assert!(guard.is_paused());
    assert!(guard
        .events
        .iter()
        .any(|e| matches!(&e.event, AgentEvent::ConfirmationRequested(r) if r.function_call_id == "ship-1")));
}

#[tokio::test]
async fn test_resume_non_resumable_app_fails() {
    let model = MockModel::new(vec![]);
    let runner = Runner::new(blog_writer::app(&spec(&model)));

    let err = runner.resume("sess", "call", true).await.unwrap_err();
    assert!(matches!(
        err,
        AdkError::Session(SessionError::NotResumable(_))
    ));
}

// ============================================================================
// Parallel Tests
// ============================================================================

#[tokio::test]
async fn test_parallel_agent_shares_session() {
    let parallel = ParallelAgent::new(
        "fanout".to_string(),
        "".to_string(),
        vec![
            Arc::new(MockAgent {
                name: "left".to_string(),
                output: "L".to_string(),
            }),
            Arc::new(MockAgent {
                name: "right".to_string(),
                output: "R".to_string(),
            }),
        ],
    );
    let runner = Runner::new(App::new("fanout", Arc::new(parallel)));

    let outcome = runner.run(None, "go").await.unwrap();

    assert_eq!(outcome.output(), Some("L\n---\nR"));
    assert_eq!(outcome.state["left"], "L");
    assert_eq!(outcome.state["right"], "R");
}
