//! Router, handlers and server startup.

use super::types::{
    AiResponseRequest, ErrorBody, TestCompletionResponse, VerificationResponse,
};
use crate::config::ServerConfig;
use crate::llm::{ChatMessage, CompletionMetadata, CompletionRequest, CompletionResponse, CompletionService};
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

const TEST_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const TEST_USER_PROMPT: &str = "Hello, how are you?";
const TEST_MAX_TOKENS: u32 = 50;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<dyn CompletionService>,
}

impl ApiState {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }
}

/// Build the axum router.
///
/// CORS is restricted to `allowed_origins`; an empty list allows no
/// cross-origin callers.
pub fn build_router(state: ApiState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/ai-response", post(ai_response))
        .route("/api/test-openai", get(test_completion))
        .route("/api/verify-world-id", post(verify_identity))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server. Runs until the process is stopped.
pub async fn start_server(
    config: &ServerConfig,
    service: Arc<dyn CompletionService>,
) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port).parse()?;
    let router = build_router(ApiState::new(service), &config.allowed_origins);

    tracing::info!("Arena HTTP server listening on http://{}", addr);
    tracing::info!("Completion proxy: http://{}/api/ai-response", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

fn error_response(status: StatusCode, error: &str, message: Option<String>) -> Response {
    let body = ErrorBody {
        error: error.to_string(),
        message,
        error_type: None,
    };
    (status, Json(body)).into_response()
}

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// POST /api/ai-response
async fn ai_response(
    State(state): State<ApiState>,
    Json(body): Json<AiResponseRequest>,
) -> Response {
    let started = Instant::now();

    if !state.service.is_configured() {
        tracing::error!("Completion proxy called without an API key");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "OpenAI API key is not configured",
            None,
        );
    }

    let prompt = match body.prompt.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p.to_string(),
        _ => return error_response(StatusCode::BAD_REQUEST, "Prompt is required", None),
    };

    let raw = body.messages.unwrap_or_default();
    let messages: Option<Vec<ChatMessage>> = raw.iter().map(|m| m.validate()).collect();
    let Some(messages) = messages else {
        tracing::warn!("Rejected completion request with malformed messages");
        return error_response(
            StatusCode::BAD_REQUEST,
            "One or more messages have invalid format",
            None,
        );
    };

    let message_count = messages.len();
    tracing::debug!("Proxying completion: {} messages", message_count);
    let request = CompletionRequest::new(prompt).with_messages(messages);

    match state.service.complete(request).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => {
            tracing::warn!("Completion failed ({}), answering with filler: {}", e.kind(), e);
            let filler = state.service.filler().await;
            let resp = CompletionResponse {
                response: filler,
                metadata: CompletionMetadata {
                    processing_time_ms: started.elapsed().as_millis() as u64,
                    message_count,
                    model: state.service.model().to_string(),
                    fallback: true,
                },
            };
            Json(resp).into_response()
        }
    }
}

/// GET /api/test-openai
async fn test_completion(State(state): State<ApiState>) -> Response {
    if !state.service.is_configured() {
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "API key not configured", None);
    }

    let request = CompletionRequest::new(TEST_SYSTEM_PROMPT)
        .with_messages(vec![ChatMessage::user(TEST_USER_PROMPT)])
        .with_max_tokens(TEST_MAX_TOKENS);

    match state.service.complete(request).await {
        Ok(resp) => Json(TestCompletionResponse {
            success: true,
            message: resp.response,
            model: resp.metadata.model,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Completion self-test failed: {}", e);
            let status =
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let body = ErrorBody {
                error: "OpenAI API error".to_string(),
                message: Some(e.to_string()),
                error_type: Some(e.kind().to_string()),
            };
            (status, Json(body)).into_response()
        }
    }
}

/// POST /api/verify-world-id
///
/// Accepts any proof payload.
async fn verify_identity() -> Json<VerificationResponse> {
    Json(VerificationResponse {
        success: true,
        message: "Verification successful".to_string(),
    })
}
