//! Route handlers

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, warn};

use super::AppState;
use crate::{
    config::ModelList,
    error::ProxyError,
    messages::{ChatCompletionRequest, UpstreamRequest},
};

/// `GET /v1/models`
pub async fn list_models(State(state): State<AppState>) -> Json<ModelList> {
    Json(ModelList::new(state.models.as_ref().clone()))
}

/// `POST /v1/chat/completions`
///
/// Always answers with an event stream; upstream failures after this point end the
/// stream early instead of changing the status code.
pub async fn chat_completions(
    State(state): State<AppState>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, ProxyError> {
    let Json(request) = payload.map_err(|e| ProxyError::InvalidInput(e.body_text()))?;

    if let Some(model) = request.model.as_deref() {
        if model != state.driver.model() {
            debug!(
                requested = model,
                served = state.driver.model(),
                "Serving requested model with the upstream default"
            );
        }
    }

    let stream = state.driver.run(UpstreamRequest::from(request));

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ProxyError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_request_error"),
            ProxyError::Authentication
            | ProxyError::UpstreamStatus { .. }
            | ProxyError::Transport(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ProxyError::Automation(_) => (StatusCode::SERVICE_UNAVAILABLE, "authentication_error"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        };

        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }

        (
            status,
            Json(json!({
                "error": {
                    "message": self.to_string(),
                    "type": kind,
                }
            })),
        )
            .into_response()
    }
}
