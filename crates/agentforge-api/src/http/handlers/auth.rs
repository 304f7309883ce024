//! Session endpoints: login, logout, and the current user.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use agentforge_types::auth::User;

use super::chat::json_body;
use crate::http::error::AppError;
use crate::http::session::{clear_session_cookie, current_user, session_cookie};
use crate::state::AppState;

fn user_json(user: &User) -> Value {
    json!({ "username": user.username, "role": user.role })
}

fn non_empty<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let body = json_body(&body).unwrap_or(Value::Null);
    let (Some(username), Some(password)) = (non_empty(&body, "username"), non_empty(&body, "password"))
    else {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    let Some(user) = state.credentials.validate(username, password) else {
        tracing::info!(username, "login rejected");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };

    let token = state.credentials.issue(&user).map_err(|e| AppError::Internal {
        message: "Login failed",
        detail: e.to_string(),
    })?;

    tracing::info!(username = %user.username, role = %user.role, "login succeeded");

    Ok((
        [(SET_COOKIE, session_cookie(&token, state.production))],
        Json(json!({ "success": true, "user": user_json(&user) })),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>) -> Response {
    (
        [(SET_COOKIE, clear_session_cookie(state.production))],
        Json(json!({ "success": true })),
    )
        .into_response()
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    Json(match current_user(&state, &headers) {
        Some(user) => json!({ "authenticated": true, "user": user_json(&user) }),
        None => json!({ "authenticated": false }),
    })
}
