//! Builder chat endpoint: `POST /api/chat`.
//!
//! The reply is relayed as an incrementally flushed `text/plain` body.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use agentforge_core::chat::relay::TextStream;

use crate::http::error::{AppError, ResultExt};
use crate::state::AppState;

/// Wrap a relayed text stream in a streaming `text/plain` response.
pub fn text_stream_response(stream: TextStream) -> Response {
    (
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Parse a raw request body as JSON. Empty or malformed bodies become `None`
/// so the service reports the missing field instead of a parse error.
pub(crate) fn json_body(body: &Bytes) -> Option<Value> {
    serde_json::from_slice(body).ok()
}

pub async fn chat(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let mut body = json_body(&body).unwrap_or(Value::Null);
    let agent_id = body
        .get("agentId")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let messages = body.get_mut("messages").map(Value::take);

    let stream = state
        .chat_service
        .chat(agent_id.as_deref(), messages)
        .await
        .or_internal("Failed to process chat")?;

    Ok(text_stream_response(stream))
}
