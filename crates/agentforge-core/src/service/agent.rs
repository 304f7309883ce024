//! Agent management service.
//!
//! Validates create and update requests, fills defaults, and maps storage
//! failures into [`AgentError`].

use agentforge_types::agent::{Agent, AgentPatch, CreateAgentRequest};
use agentforge_types::error::{AgentError, RepositoryError};
use tracing::info;

use crate::repository::AgentRepository;

/// Service orchestrating the agent lifecycle.
pub struct AgentService<R: AgentRepository> {
    repo: R,
}

impl<R: AgentRepository> AgentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// All agents, most recently updated first.
    pub async fn list_agents(&self) -> Result<Vec<Agent>, AgentError> {
        self.repo.list_agents().await.map_err(storage_error)
    }

    pub async fn get_agent(&self, id: &str) -> Result<Agent, AgentError> {
        self.repo
            .get_agent(id)
            .await
            .map_err(storage_error)?
            .ok_or(AgentError::NotFound)
    }

    /// Create an agent with defaults for every omitted field.
    ///
    /// A caller-supplied id that already exists yields [`AgentError::Conflict`].
    pub async fn create_agent(&self, request: CreateAgentRequest) -> Result<Agent, AgentError> {
        let agent = Agent::from_request(request, agentforge_types::time::now())?;

        let agent = self.repo.create_agent(&agent).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AgentError::Conflict(agent.id.clone()),
            other => storage_error(other),
        })?;

        info!(agent_id = %agent.id, name = %agent.name, model = %agent.model, "agent created");
        Ok(agent)
    }

    /// Apply a partial update. Unknown ids yield [`AgentError::NotFound`].
    pub async fn update_agent(&self, id: Option<&str>, patch: AgentPatch) -> Result<Agent, AgentError> {
        let id = require_id(id)?;
        patch.validate()?;

        let agent = self
            .repo
            .update_agent(id, &patch)
            .await
            .map_err(storage_error)?
            .ok_or(AgentError::NotFound)?;

        info!(agent_id = %agent.id, "agent updated");
        Ok(agent)
    }

    /// Delete an agent. Deployments pointing at it are left in place.
    pub async fn delete_agent(&self, id: Option<&str>) -> Result<(), AgentError> {
        let id = require_id(id)?;
        if !self.repo.delete_agent(id).await.map_err(storage_error)? {
            return Err(AgentError::NotFound);
        }
        info!(agent_id = %id, "agent deleted");
        Ok(())
    }
}

fn require_id(id: Option<&str>) -> Result<&str, AgentError> {
    match id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(AgentError::Validation("Agent ID is required".to_string())),
    }
}

fn storage_error(e: RepositoryError) -> AgentError {
    AgentError::StorageError(e.to_string())
}
