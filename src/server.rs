use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::{info, warn};

use crate::AppState;
use crate::client::{ChatRequest, ChatResponse};
use crate::config::AppConfig;
use crate::llm::{HttpDriver, LlmDriver, LlmError};

/// Request bodies larger than this are rejected.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let settings = config.llm_settings()?;

    info!(
        name: "llm.config.loaded",
        provider = %settings.provider,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let driver: Arc<dyn LlmDriver> = Arc::new(HttpDriver::new(settings)?);
    let state = AppState {
        driver,
        config: Arc::clone(&config),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the backend router: status probe, `/chat`, and the middleware stack.
pub fn build_router(state: AppState) -> Router {
    let timeout_duration = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(status_handler))
        .route("/chat", post(chat_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let duration = timeout_duration;
                async move {
                    match tokio::time::timeout(duration, next.run(req)).await {
                        Ok(res) => res,
                        Err(_) => {
                            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
                        }
                    }
                }
            },
        ))
        // The widget is served from another origin.
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Error body returned to the widget.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

/// GET / - liveness probe.
async fn status_handler() -> impl IntoResponse {
    Json(json!({ "status": "Online", "service": "Customer Support Chatbot" }))
}

/// POST /chat - answer one customer message.
async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    tracing::info!(
        name: "chat.request.received",
        chars = req.message.chars().count(),
        "Received chat request"
    );

    match state.driver.complete(&req.message).await {
        Ok(response) => Ok(Json(ChatResponse { response })),
        Err(e) => {
            warn!(name: "chat.request.failed", error = %e, "Chat request failed");
            if state.config.llm.debug {
                warn!(
                    name: "chat.request.error_chain",
                    chain = %error_chain(&e),
                    "Backend exception"
                );
            }
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    detail: format!("Error processing request: {}", failure_reason(&e)),
                }),
            ))
        }
    }
}

/// Reason text for a failed request.
///
/// Upstream rejections are reported as a 500 of their own, whatever status
/// the provider used.
fn failure_reason(err: &LlmError) -> String {
    match err {
        LlmError::Upstream { detail, .. } => {
            format!("{}: {detail}", StatusCode::INTERNAL_SERVER_ERROR.as_u16())
        }
        other => other.to_string(),
    }
}

/// `err` followed by each of its sources, joined with ": ".
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
