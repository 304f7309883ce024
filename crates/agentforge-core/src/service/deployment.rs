//! Deployment management service.
//!
//! Deploying an agent is idempotent: the first call mints an API key, later
//! calls return the same key with `existing = true`.

use agentforge_types::deployment::{API_KEY_PREFIX, Deployment, endpoint_for};
use agentforge_types::error::{DeploymentError, RepositoryError};
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::info;

use crate::repository::{AgentRepository, DeploymentRepository};

/// Random characters following [`API_KEY_PREFIX`] in a generated key.
pub const API_KEY_LENGTH: usize = 32;

/// Result of a deploy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOutcome {
    pub api_key: String,
    pub endpoint: String,
    pub existing: bool,
}

/// Service managing one deployment per agent.
pub struct DeploymentService<R: AgentRepository + DeploymentRepository> {
    repo: R,
}

impl<R: AgentRepository + DeploymentRepository> DeploymentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Deploy an agent, or return its existing deployment.
    ///
    /// Lookup-before-create: two concurrent first calls for the same agent
    /// may both create a record.
    pub async fn deploy(&self, agent_id: Option<&str>) -> Result<DeployOutcome, DeploymentError> {
        let agent_id = require_agent_id(agent_id)?;

        if self
            .repo
            .get_agent(agent_id)
            .await
            .map_err(storage_error)?
            .is_none()
        {
            return Err(DeploymentError::AgentNotFound);
        }

        if let Some(existing) = self
            .repo
            .get_deployment_by_agent_id(agent_id)
            .await
            .map_err(storage_error)?
        {
            return Ok(DeployOutcome {
                endpoint: existing.endpoint(),
                api_key: existing.api_key,
                existing: true,
            });
        }

        let deployment = Deployment::new(agent_id, generate_api_key(), agentforge_types::time::now());
        let deployment = self
            .repo
            .create_deployment(&deployment)
            .await
            .map_err(storage_error)?;

        info!(agent_id = %agent_id, deployment_id = %deployment.id, "agent deployed");

        Ok(DeployOutcome {
            endpoint: endpoint_for(agent_id),
            api_key: deployment.api_key,
            existing: false,
        })
    }

    /// Current deployment of an agent, if any.
    pub async fn status(&self, agent_id: &str) -> Result<Option<Deployment>, DeploymentError> {
        self.repo
            .get_deployment_by_agent_id(agent_id)
            .await
            .map_err(storage_error)
    }

    /// Activate or deactivate an agent's deployment.
    pub async fn set_active(
        &self,
        agent_id: &str,
        is_active: Option<bool>,
    ) -> Result<Deployment, DeploymentError> {
        let is_active = is_active
            .ok_or_else(|| DeploymentError::Validation("isActive is required".to_string()))?;

        let deployment = self
            .status(agent_id)
            .await?
            .ok_or(DeploymentError::NotFound)?;

        self.repo
            .set_deployment_active(&deployment.id, is_active)
            .await
            .map_err(storage_error)?;

        info!(agent_id = %agent_id, is_active, "deployment toggled");
        Ok(Deployment {
            is_active,
            ..deployment
        })
    }

    /// Remove an agent's deployment. Its API key stops working immediately.
    pub async fn undeploy(&self, agent_id: &str) -> Result<(), DeploymentError> {
        let deployment = self
            .status(agent_id)
            .await?
            .ok_or(DeploymentError::NotFound)?;

        if !self
            .repo
            .delete_deployment(&deployment.id)
            .await
            .map_err(storage_error)?
        {
            return Err(DeploymentError::NotFound);
        }

        info!(agent_id = %agent_id, deployment_id = %deployment.id, "deployment removed");
        Ok(())
    }
}

/// Mint a fresh deployment API key: `af_` followed by 32 alphanumeric characters.
pub fn generate_api_key() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(API_KEY_LENGTH)
        .map(char::from)
        .collect();
    format!("{API_KEY_PREFIX}{suffix}")
}

fn require_agent_id(agent_id: Option<&str>) -> Result<&str, DeploymentError> {
    match agent_id {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(DeploymentError::Validation("Agent ID is required".to_string())),
    }
}

fn storage_error(e: RepositoryError) -> DeploymentError {
    DeploymentError::StorageError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fake::FakeStore;
    use agentforge_types::agent::{Agent, CreateAgentRequest};

    async fn service_with_agent() -> (DeploymentService<FakeStore>, String) {
        let store = FakeStore::default();
        let agent = Agent::from_request(
            CreateAgentRequest {
                name: Some("R".to_string()),
                role: Some("Researcher".to_string()),
                ..Default::default()
            },
            agentforge_types::time::now(),
        )
        .unwrap();
        store.create_agent(&agent).await.unwrap();
        (DeploymentService::new(store), agent.id)
    }

    #[test]
    fn test_generated_key_shape() {
        let key = generate_api_key();
        assert!(key.starts_with("af_"));
        assert_eq!(key.len(), 3 + API_KEY_LENGTH);
        assert!(key[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(key, generate_api_key());
    }

    #[tokio::test]
    async fn test_deploy_is_idempotent() {
        let (svc, agent_id) = service_with_agent().await;

        let first = svc.deploy(Some(agent_id.as_str())).await.unwrap();
        assert!(!first.existing);
        assert_eq!(first.endpoint, format!("/api/deploy/{agent_id}"));

        let second = svc.deploy(Some(agent_id.as_str())).await.unwrap();
        assert!(second.existing);
        assert_eq!(second.api_key, first.api_key);

        let status = svc.status(&agent_id).await.unwrap().unwrap();
        assert!(status.is_active);
        assert_eq!(status.request_count, 0);
    }

    #[tokio::test]
    async fn test_deploy_validates_agent() {
        let (svc, _) = service_with_agent().await;
        assert!(matches!(
            svc.deploy(None).await,
            Err(DeploymentError::Validation(_))
        ));
        assert!(matches!(
            svc.deploy(Some("ghost")).await,
            Err(DeploymentError::AgentNotFound)
        ));
    }

    #[tokio::test]
    async fn test_toggle_and_undeploy() {
        let (svc, agent_id) = service_with_agent().await;
        svc.deploy(Some(agent_id.as_str())).await.unwrap();

        let toggled = svc.set_active(&agent_id, Some(false)).await.unwrap();
        assert!(!toggled.is_active);
        assert!(!svc.status(&agent_id).await.unwrap().unwrap().is_active);

        assert!(matches!(
            svc.set_active(&agent_id, None).await,
            Err(DeploymentError::Validation(_))
        ));

        svc.undeploy(&agent_id).await.unwrap();
        assert!(svc.status(&agent_id).await.unwrap().is_none());
        assert!(matches!(
            svc.undeploy(&agent_id).await,
            Err(DeploymentError::NotFound)
        ));
    }
}
