//! Agent CRUD endpoints.
//!
//! - `GET    /api/agents`          list, most recently updated first
//! - `POST   /api/agents`          create
//! - `PUT    /api/agents`          partial update, id in the body
//! - `DELETE /api/agents?id=...`   delete

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use agentforge_types::agent::{Agent, AgentPatch, CreateAgentRequest};

use crate::http::error::{AppError, ResultExt};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Body of `PUT /api/agents`: the id plus any subset of agent fields.
/// Read-only fields sent back by clients (`createdAt`, ...) are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateAgentBody {
    pub id: Option<String>,
    #[serde(flatten)]
    pub patch: AgentPatch,
}

pub async fn list_agents(State(state): State<AppState>) -> Result<Json<Vec<Agent>>, AppError> {
    let agents = state
        .agent_service
        .list_agents()
        .await
        .or_internal("Failed to get agents")?;
    Ok(Json(agents))
}

pub async fn create_agent(
    State(state): State<AppState>,
    body: Result<Json<CreateAgentRequest>, JsonRejection>,
) -> Result<Json<Agent>, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let agent = state
        .agent_service
        .create_agent(request)
        .await
        .or_internal("Failed to create agent")?;
    Ok(Json(agent))
}

pub async fn update_agent(
    State(state): State<AppState>,
    body: Result<Json<UpdateAgentBody>, JsonRejection>,
) -> Result<Json<Agent>, AppError> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let agent = state
        .agent_service
        .update_agent(body.id.as_deref(), body.patch)
        .await
        .or_internal("Failed to update agent")?;
    Ok(Json(agent))
}

pub async fn delete_agent(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<Value>, AppError> {
    state
        .agent_service
        .delete_agent(query.id.as_deref())
        .await
        .or_internal("Failed to delete agent")?;
    Ok(Json(json!({ "success": true })))
}
