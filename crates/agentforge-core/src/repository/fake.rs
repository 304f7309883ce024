//! Minimal in-process store used by the core service tests.

use std::sync::Arc;

use dashmap::DashMap;

use agentforge_types::agent::{Agent, AgentPatch};
use agentforge_types::conversation::Conversation;
use agentforge_types::deployment::Deployment;
use agentforge_types::error::RepositoryError;

use super::{AgentRepository, ConversationRepository, DeploymentRepository};

/// Clones share the same maps.
#[derive(Default, Clone)]
pub struct FakeStore {
    pub agents: Arc<DashMap<String, Agent>>,
    pub conversations: Arc<DashMap<String, Conversation>>,
    pub deployments: Arc<DashMap<String, Deployment>>,
}

impl AgentRepository for FakeStore {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        let mut agents: Vec<Agent> = self.agents.iter().map(|e| e.value().clone()).collect();
        agents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(agents)
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.get(id).map(|a| a.clone()))
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        if self.agents.contains_key(&agent.id) {
            return Err(RepositoryError::Conflict(agent.id.clone()));
        }
        self.agents.insert(agent.id.clone(), agent.clone());
        Ok(agent.clone())
    }

    async fn update_agent(
        &self,
        id: &str,
        patch: &AgentPatch,
    ) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.get_mut(id).map(|mut agent| {
            agent.apply_patch(patch.clone(), agentforge_types::time::now());
            agent.clone()
        }))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.agents.remove(id).is_some())
    }
}

impl ConversationRepository for FakeStore {
    async fn get_conversation_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .iter()
            .find(|c| c.agent_id == agent_id)
            .map(|c| c.value().clone()))
    }

    async fn save_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        let mut entry = self
            .conversations
            .entry(conversation.id.clone())
            .or_insert_with(|| conversation.clone());
        entry.messages = conversation.messages.clone();
        Ok(entry.clone())
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.conversations.remove(id).is_some())
    }
}

impl DeploymentRepository for FakeStore {
    async fn get_deployment_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Deployment>, RepositoryError> {
        Ok(self
            .deployments
            .iter()
            .find(|d| d.agent_id == agent_id)
            .map(|d| d.value().clone()))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, RepositoryError> {
        self.deployments
            .insert(deployment.id.clone(), deployment.clone());
        Ok(deployment.clone())
    }

    async fn increment_request_count(&self, id: &str) -> Result<(), RepositoryError> {
        if let Some(mut d) = self.deployments.get_mut(id) {
            d.request_count += 1;
        }
        Ok(())
    }

    async fn set_deployment_active(&self, id: &str, is_active: bool) -> Result<(), RepositoryError> {
        if let Some(mut d) = self.deployments.get_mut(id) {
            d.is_active = is_active;
        }
        Ok(())
    }

    async fn delete_deployment(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.deployments.remove(id).is_some())
    }
}
