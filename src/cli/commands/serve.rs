//! HTTP API server with one conversation per session id.
//!
//! `/analyze` reports failures in the response body; `/ask` passes chat
//! failures straight through as an error status.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::SentinelError;
use crate::orchestrator::{AnalysisReport, Answer, Orchestrator};
use crate::session::SessionStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    orchestrator: Orchestrator,
    sessions: SessionStore,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let credentials = super::credentials_or_report(&settings)?;
    let orchestrator = Orchestrator::new(&settings, &credentials)?;
    let sessions =
        SessionStore::with_ttl(Duration::from_secs(settings.server.session_ttl_seconds));

    let app = router(Arc::new(AppState {
        orchestrator,
        sessions,
    }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Sentinel API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Analyze", "POST   /analyze");
    Output::kv("Ask", "POST   /ask");
    Output::kv("Session", "GET    /sessions/{id}");
    Output::kv("End session", "DELETE /sessions/{id}");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/ask", post(ask))
        .route("/sessions/{id}", get(get_session).delete(end_session))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AnalyzeRequest {
    /// YouTube URL or chart image URL
    url: String,
    /// Existing session to continue; a new one is created when absent or unknown
    #[serde(default)]
    session_id: Option<Uuid>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    session_id: Uuid,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cost_display: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct AskRequest {
    session_id: Uuid,
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    input_tokens: u64,
    output_tokens: u64,
    cost: f64,
    cost_display: String,
}

impl From<Answer> for AskResponse {
    fn from(answer: Answer) -> Self {
        Self {
            answer: answer.text,
            input_tokens: answer.usage.input_tokens,
            output_tokens: answer.usage.output_tokens,
            cost: answer.cost,
            cost_display: answer.cost_display,
        }
    }
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
    active: bool,
    turns: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    if req.url.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "url must not be empty");
    }

    let checkout = state
        .sessions
        .get_or_create(req.session_id, || state.orchestrator.start_session())
        .await;
    let session_id = checkout.id;
    let report = {
        let mut session = checkout.session.lock().await;
        state.orchestrator.analyze(&mut session, &req.url).await
    };

    // A failed first analysis leaves nothing to follow up on.
    if checkout.created && matches!(report, AnalysisReport::Failed(_)) {
        state.sessions.remove(&session_id).await;
        debug!(%session_id, "Dropped session after failed first analysis");
    }

    let response = match report {
        AnalysisReport::Completed(answer) => AnalyzeResponse {
            session_id,
            success: true,
            title: answer.title,
            answer: Some(answer.text),
            cost: Some(answer.cost),
            cost_display: Some(answer.cost_display),
            error: None,
        },
        AnalysisReport::Failed(message) => AnalyzeResponse {
            session_id,
            success: false,
            title: None,
            answer: None,
            cost: None,
            cost_display: None,
            error: Some(message),
        },
    };

    Json(response).into_response()
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> impl IntoResponse {
    let Some(session) = state.sessions.get(&req.session_id).await else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Session not found: {}", req.session_id),
        );
    };
    let mut session = session.lock().await;

    match state.orchestrator.ask(&mut session, &req.question).await {
        Ok(answer) => Json(AskResponse::from(answer)).into_response(),
        Err(e @ SentinelError::SessionInactive) => error_response(StatusCode::CONFLICT, e),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, e),
    }
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match state.sessions.get(&id).await {
        Some(session) => {
            let session = session.lock().await;
            Json(SessionResponse {
                session_id: id,
                active: session.is_active(),
                turns: session.history().len(),
            })
            .into_response()
        }
        None => error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id)),
    }
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    if state.sessions.remove(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        error_response(StatusCode::NOT_FOUND, format!("Session not found: {}", id))
    }
}
