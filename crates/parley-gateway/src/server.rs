use crate::error::ApiError;
use crate::router::{InboundMessage, MessageRouter, OutboundMessage, MESSAGE_REQUIRED};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use parley_agent::AgentClient;
use parley_session::TranscriptStore;
use std::sync::Arc;
use tracing::warn;

/// The chat page served at `/`.
pub const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared application state.
pub struct AppState {
    /// Turn handler shared by all requests.
    pub router: Arc<MessageRouter>,
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the HTTP application around one agent client and one store.
    pub fn build(agent: Arc<AgentClient>, transcripts: Arc<dyn TranscriptStore>) -> Router {
        let state = Arc::new(AppState {
            router: Arc::new(MessageRouter::new(agent, transcripts)),
        });

        Router::new()
            .route("/", get(index_handler))
            .route("/api/message", post(message_handler))
            .route("/health", get(health_handler))
            .with_state(state)
    }
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "parley"}))
}

async fn message_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InboundMessage>, JsonRejection>,
) -> Result<Json<OutboundMessage>, ApiError> {
    let Json(inbound) = payload.map_err(|e| {
        warn!(error = %e, "Rejected undecodable message body");
        ApiError::BadRequest(MESSAGE_REQUIRED.to_string())
    })?;
    let outbound = state.router.handle_message(inbound).await?;
    Ok(Json(outbound))
}
