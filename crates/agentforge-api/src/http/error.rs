//! Application error type mapping to HTTP status codes.
//!
//! Every error response has the body `{"error": "<message>"}`. Server-side
//! failures answer with a generic message; the underlying detail is logged.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use agentforge_types::error::{AgentError, ChatError, DeploymentError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Agent-related errors.
    Agent(AgentError),
    /// Deployment management errors.
    Deployment(DeploymentError),
    /// Chat proxy errors.
    Chat(ChatError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Internal failure with a public message and a logged detail.
    Internal { message: &'static str, detail: String },
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::Agent(e)
    }
}

impl From<DeploymentError> for AppError {
    fn from(e: DeploymentError) -> Self {
        AppError::Deployment(e)
    }
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Agent(AgentError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Agent(AgentError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Agent(AgentError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Agent(AgentError::StorageError(_)) => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::Deployment(DeploymentError::NotFound | DeploymentError::AgentNotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Deployment(DeploymentError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Deployment(DeploymentError::StorageError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            AppError::Chat(ChatError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Chat(ChatError::AgentNotFound | ChatError::DeploymentNotFound) => {
                StatusCode::NOT_FOUND
            }
            AppError::Chat(ChatError::DeploymentInactive) => StatusCode::FORBIDDEN,
            AppError::Chat(ChatError::InvalidApiKey) => StatusCode::UNAUTHORIZED,
            AppError::Chat(ChatError::StorageError(_) | ChatError::Provider(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Give a server-side failure a route-specific public message.
    /// Client errors are returned unchanged.
    pub fn or_internal(self, message: &'static str) -> Self {
        match self {
            AppError::Internal { detail, .. } => AppError::Internal { message, detail },
            other if other.status().is_server_error() => AppError::Internal {
                message,
                detail: other.message(),
            },
            other => other,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Agent(e) => e.to_string(),
            AppError::Deployment(e) => e.to_string(),
            AppError::Chat(e) => e.to_string(),
            AppError::Unauthorized(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Internal { message, .. } => (*message).to_string(),
        }
    }
}

/// `map_err` shorthand for [`AppError::or_internal`].
pub trait ResultExt<T> {
    fn or_internal(self, message: &'static str) -> Result<T, AppError>;
}

impl<T, E: Into<AppError>> ResultExt<T> for Result<T, E> {
    fn or_internal(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|e| e.into().or_internal(message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match self {
            AppError::Internal { message, detail } => {
                tracing::error!(error = %detail, "{message}");
                message.to_string()
            }
            other if status.is_server_error() => {
                tracing::error!(error = %other.message(), "request failed");
                "Internal server error".to_string()
            }
            other => other.message(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
