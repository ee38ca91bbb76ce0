// SPDX-License-Identifier: MIT

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adk::error::{AdkError, SessionError};
use crate::adk::runner::Runner;
use crate::adk::session::SessionEvent;
use crate::adk::tool::ConfirmationRequest;
use crate::pipelines::{Catalog, APPS};

/// One runner (and so one session store) per app
#[derive(Clone)]
pub struct ServerState {
    runners: Arc<HashMap<String, Arc<Runner>>>,
}

impl ServerState {
    pub fn new(runners: HashMap<String, Arc<Runner>>) -> Self {
        Self {
            runners: Arc::new(runners),
        }
    }

    /// Build every app of the catalog
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, AdkError> {
        let mut runners = HashMap::new();
        for info in APPS.iter() {
            let app = catalog.build_app(info.name)?;
            runners.insert(info.name.to_string(), Arc::new(Runner::new(app)));
        }
        Ok(Self::new(runners))
    }

    fn runner(&self, app: &str) -> Result<Arc<Runner>, ApiError> {
        self.runners
            .get(app)
            .cloned()
            .ok_or_else(|| ApiError(AdkError::UnknownApp(app.to_string())))
    }
}

/// Maps framework errors to HTTP statuses
pub struct ApiError(pub AdkError);

impl From<AdkError> for ApiError {
    fn from(e: AdkError) -> Self {
        Self(e)
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        Self(e.into())
    }
}

pub fn status_for(error: &AdkError) -> StatusCode {
    match error {
        AdkError::UnknownApp(_) | AdkError::Session(SessionError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        AdkError::Session(_) => StatusCode::CONFLICT,
        AdkError::InvalidToolArgs { .. } | AdkError::MissingStateKey(_) => {
            StatusCode::BAD_REQUEST
        }
        AdkError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AdkError::Api { .. } | AdkError::Http(_) | AdkError::Mcp(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            log::error!("Request failed: {}", self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/apps", get(list_apps))
        .route("/api/apps/{app}/sessions", post(create_session))
        .route("/api/apps/{app}/sessions/{id}", get(get_session))
        .route("/api/apps/{app}/sessions/{id}/confirm", post(confirm))
        .route("/api/apps/{app}/run", post(run))
        .route("/api/apps/{app}/run/stream", post(run_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(port: u16, state: ServerState) -> Result<(), AdkError> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_apps() -> Json<Value> {
    Json(json!(APPS))
}

#[derive(Debug, Default, Deserialize)]
struct CreateSessionRequest {
    session_id: Option<String>,
}

async fn create_session(
    State(state): State<ServerState>,
    Path(app): Path<String>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<Json<Value>, ApiError> {
    let runner = state.runner(&app)?;
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let session = runner.create_session(request.session_id).await?;
    let id = session.read().await.id.clone();
    Ok(Json(json!({ "app": app, "session_id": id })))
}

#[derive(Serialize)]
struct SessionView {
    id: String,
    app_name: String,
    user_id: String,
    state: Value,
    events: Vec<SessionEvent>,
    pending_confirmations: Vec<ConfirmationRequest>,
    paused: bool,
}

async fn get_session(
    State(state): State<ServerState>,
    Path((app, id)): Path<(String, String)>,
) -> Result<Json<SessionView>, ApiError> {
    let runner = state.runner(&app)?;
    let handle = runner.sessions().get(&id).await?;
    let session = handle.read().await;
    if session.app_name != app {
        return Err(SessionError::NotFound(id).into());
    }

    Ok(Json(SessionView {
        id: session.id.clone(),
        app_name: session.app_name.clone(),
        user_id: session.user_id.clone(),
        state: session.state.to_json(),
        events: session.events.clone(),
        pending_confirmations: session.pending_confirmations.values().cloned().collect(),
        paused: session.is_paused(),
    }))
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    session_id: Option<String>,
    input: String,
}

async fn run(
    State(state): State<ServerState>,
    Path(app): Path<String>,
    Json(payload): Json<RunRequest>,
) -> Result<Response, ApiError> {
    let runner = state.runner(&app)?;
    let outcome = runner
        .run(payload.session_id.as_deref(), &payload.input)
        .await?;
    Ok(Json(outcome).into_response())
}

#[derive(Debug, Deserialize)]
struct ConfirmRequest {
    function_call_id: String,
    confirmed: bool,
}

async fn confirm(
    State(state): State<ServerState>,
    Path((app, id)): Path<(String, String)>,
    Json(payload): Json<ConfirmRequest>,
) -> Result<Response, ApiError> {
    let runner = state.runner(&app)?;
    let outcome = runner
        .resume(&id, &payload.function_call_id, payload.confirmed)
        .await?;
    Ok(Json(outcome).into_response())
}

fn sse_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

async fn run_stream(
    State(state): State<ServerState>,
    Path(app): Path<String>,
    Json(payload): Json<RunRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let runner = state.runner(&app)?;
    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        log::info!("Starting streaming run of {}", app);
        let (event_tx, mut event_rx) = mpsc::channel::<SessionEvent>(100);

        let forward = async {
            while let Some(event) = event_rx.recv().await {
                // Keep draining even if the client went away
                let _ = tx.send(sse_event("event", &event)).await;
            }
        };
        let run = runner.run_stream(payload.session_id.as_deref(), &payload.input, event_tx);
        let (result, ()) = tokio::join!(run, forward);

        let last = match result {
            Ok(outcome) => sse_event("outcome", &outcome),
            Err(e) => {
                log::error!("Streaming run of {} failed: {}", app, e);
                sse_event("error", &json!({ "error": e.to_string() }))
            }
        };
        let _ = tx.send(last).await;
    });

    let stream = ReceiverStream::new(rx).map(Ok::<Event, Infallible>);
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}
