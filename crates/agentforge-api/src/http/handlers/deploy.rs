//! Deployment endpoints.
//!
//! - `POST   /api/deploy/create`  deploy an agent (idempotent)
//! - `POST   /api/deploy/{id}`    public chat, `Authorization: Bearer <apiKey>`
//! - `GET    /api/deploy/{id}`    deployment status
//! - `PATCH  /api/deploy/{id}`    activate or deactivate
//! - `DELETE /api/deploy/{id}`    remove the deployment

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use serde::Deserialize;
use serde_json::{Value, json};

use agentforge_types::deployment::Deployment;

use super::chat::{json_body, text_stream_response};
use crate::http::error::{AppError, ResultExt};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeploymentBody {
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBody {
    pub is_active: Option<bool>,
}

/// API key from the `Authorization` header. The `Bearer ` prefix is
/// optional; a bare key is accepted as-is.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    (!token.is_empty()).then_some(token)
}

fn status_body(deployment: &Deployment) -> Value {
    json!({
        "deployed": true,
        "isActive": deployment.is_active,
        "requestCount": deployment.request_count,
        "createdAt": deployment.created_at,
    })
}

pub async fn create_deployment(
    State(state): State<AppState>,
    body: Result<Json<CreateDeploymentBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let agent_id = body.ok().and_then(|Json(b)| b.agent_id);
    let outcome = state
        .deployment_service
        .deploy(agent_id.as_deref())
        .await
        .or_internal("Failed to create deployment")?;

    Ok(Json(json!({
        "apiKey": outcome.api_key,
        "endpoint": outcome.endpoint,
        "existing": outcome.existing,
    })))
}

pub async fn invoke_deployment(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let stream = state
        .chat_service
        .chat_deployment(&agent_id, bearer_token(&headers), json_body(&body))
        .await
        .or_internal("Failed to process request")?;

    Ok(text_stream_response(stream))
}

pub async fn deployment_status(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let deployment = state
        .deployment_service
        .status(&agent_id)
        .await
        .or_internal("Failed to get deployment")?;

    Ok(Json(match deployment {
        Some(d) => status_body(&d),
        None => json!({ "deployed": false }),
    }))
}

pub async fn toggle_deployment(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
    body: Result<Json<ToggleBody>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let is_active = body.ok().and_then(|Json(b)| b.is_active);
    let deployment = state
        .deployment_service
        .set_active(&agent_id, is_active)
        .await
        .or_internal("Failed to update deployment")?;

    Ok(Json(status_body(&deployment)))
}

pub async fn delete_deployment(
    State(state): State<AppState>,
    Path(agent_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .deployment_service
        .undeploy(&agent_id)
        .await
        .or_internal("Failed to delete deployment")?;

    Ok(Json(json!({ "success": true })))
}
