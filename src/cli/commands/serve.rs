//! HTTP API server for the course assistant.
//!
//! Provides REST endpoints for questions and the course catalog.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{CourseAnalytics, QueryResponse, RagSystem};
use crate::tools::SourceCitation;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    rag: RagSystem,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    docs: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let rag = RagSystem::new(&settings)?;

    let docs_dir = docs
        .map(|d| Settings::expand_path(&d))
        .or_else(|| settings.docs_dir());
    if let Some(dir) = docs_dir {
        load_startup_documents(&rag, dir).await;
    }

    let app = router(Arc::new(AppState { rag }));

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Syllabus API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /api/query");
    Output::kv("Courses", "GET  /api/courses");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Index a documents folder before serving. Failures are logged, not fatal.
async fn load_startup_documents(rag: &RagSystem, dir: PathBuf) {
    info!("Loading initial documents from {:?}", dir);
    match rag.add_course_folder(&dir, false).await {
        Ok(report) => Output::info(&format!(
            "Loaded {} courses with {} chunks from {}",
            report.courses,
            report.chunks,
            dir.display()
        )),
        Err(e) => warn!("Error loading documents from {:?}: {}", dir, e),
    }
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct QueryResult {
    answer: String,
    sources: Vec<SourceCitation>,
    session_id: String,
}

impl From<QueryResponse> for QueryResult {
    fn from(response: QueryResponse) -> Self {
        Self {
            answer: response.answer,
            sources: response.sources,
            session_id: response.session_id,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn internal_error(e: impl std::fmt::Display) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> impl IntoResponse {
    match state.rag.query(&req.query, req.session_id.as_deref()).await {
        Ok(response) => Json(QueryResult::from(response)).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn courses(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.rag.course_analytics().await {
        Ok(analytics) => Json::<CourseAnalytics>(analytics).into_response(),
        Err(e) => internal_error(e),
    }
}
