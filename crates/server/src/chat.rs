//! Chat routes.
//!
//! - `POST /chat`                   run one dialogue turn
//! - `GET  /sessions/{thread_id}`   current state of a thread

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use leadflow_agent::runtime::{AgentRuntime, TurnReply, TurnRequest};
use leadflow_core::domain::field::FieldConfig;
use leadflow_core::errors::{ApplicationError, InterfaceError};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

impl ChatState {
    pub fn new(runtime: Arc<AgentRuntime>) -> Self {
        Self { runtime }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub thread_id: String,
    pub message: String,
    #[serde(default)]
    pub field_configs: Option<Vec<FieldConfig>>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub thread_id: String,
    pub state: BTreeMap<String, String>,
    pub is_complete: bool,
    pub lead_captured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
    pub correlation_id: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/sessions/{thread_id}", get(session))
        .with_state(state)
}

pub async fn chat(
    State(state): State<ChatState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnReply>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let thread_id = request.thread_id.trim();
    if thread_id.is_empty() {
        return Err(api_error(InterfaceError::BadRequest {
            message: "thread_id must not be empty".to_string(),
            correlation_id,
        }));
    }
    if request.message.trim().is_empty() {
        return Err(api_error(InterfaceError::BadRequest {
            message: "message must not be empty".to_string(),
            correlation_id,
        }));
    }

    info!(
        event_name = "ingress.chat.received",
        correlation_id = %correlation_id,
        thread_id,
        "chat turn received"
    );

    let mut turn = TurnRequest::new(thread_id, request.message).with_correlation_id(correlation_id);
    if let Some(configs) = request.field_configs {
        turn = turn.with_field_configs(configs);
    }
    Ok(Json(state.runtime.handle_turn(turn).await))
}

pub async fn session(
    State(state): State<ChatState>,
    headers: HeaderMap,
    Path(thread_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let correlation_id = correlation_id(&headers);
    let stored = state.runtime.session(&thread_id).await.map_err(|repository_error| {
        error!(
            event_name = "persistence.session_lookup_failed",
            correlation_id = %correlation_id,
            thread_id = %thread_id,
            error = %repository_error,
            "session lookup failed"
        );
        api_error(
            ApplicationError::Persistence(repository_error.to_string())
                .into_interface(correlation_id.clone()),
        )
    })?;

    let Some(conversation) = stored else {
        return Err(api_error(
            ApplicationError::UnknownThread(thread_id).into_interface(correlation_id),
        ));
    };

    Ok(Json(SessionResponse {
        thread_id,
        state: conversation.to_flat_map(),
        is_complete: conversation.conversation_complete,
        lead_captured: conversation.lead_captured,
    }))
}

fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn api_error(error: InterfaceError) -> ApiError {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let detail =
        if error.is_client_error() { error.to_string() } else { error.user_message().to_string() };
    (
        status,
        Json(ErrorBody {
            error: error.kind(),
            detail,
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}
