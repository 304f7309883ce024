use thiserror::Error;

use crate::llm::LlmError;

/// Errors related to agent operations.
///
/// Display strings of the client-facing variants double as HTTP error messages.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("agent '{0}' already exists")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to deployment management.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("Deployment not found")]
    NotFound,

    #[error("Agent not found")]
    AgentNotFound,

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors raised before or while starting a chat stream.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0}")]
    Validation(String),

    #[error("Agent not found")]
    AgentNotFound,

    #[error("Deployment not found")]
    DeploymentNotFound,

    #[error("Deployment is inactive")]
    DeploymentInactive,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("provider error: {0}")]
    Provider(#[from] LlmError),
}

/// Errors from repository operations (used by trait definitions in agentforge-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_facing_messages() {
        assert_eq!(AgentError::NotFound.to_string(), "Agent not found");
        assert_eq!(ChatError::DeploymentInactive.to_string(), "Deployment is inactive");
        assert_eq!(ChatError::InvalidApiKey.to_string(), "Invalid API key");
        assert_eq!(
            AgentError::Validation("Name and role are required".to_string()).to_string(),
            "Name and role are required"
        );
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_chat_error_from_llm_error() {
        let err: ChatError = LlmError::AuthenticationFailed.into();
        assert!(matches!(err, ChatError::Provider(LlmError::AuthenticationFailed)));
    }
}
