//! In-process storage backend backed by `DashMap`.
//!
//! State lives in the [`InMemoryStore`] instance: clones share it, a fresh
//! instance starts empty, and nothing survives a restart. Reads clone values
//! out immediately so no `DashMap` guard outlives a call.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use agentforge_core::repository::{AgentRepository, ConversationRepository, DeploymentRepository};
use agentforge_types::agent::{Agent, AgentPatch};
use agentforge_types::conversation::Conversation;
use agentforge_types::deployment::Deployment;
use agentforge_types::error::RepositoryError;

/// Process-local implementation of the full store.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    agents: Arc<DashMap<String, Agent>>,
    conversations: Arc<DashMap<String, Conversation>>,
    deployments: Arc<DashMap<String, Deployment>>,
    /// agent id -> deployment id
    deployment_by_agent: Arc<DashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentRepository for InMemoryStore {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        let mut agents: Vec<Agent> = self.agents.iter().map(|r| r.value().clone()).collect();
        agents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(agents)
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.get(id).map(|r| r.value().clone()))
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        match self.agents.entry(agent.id.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Conflict(format!(
                "agent '{}' already exists",
                agent.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(agent.clone());
                Ok(agent.clone())
            }
        }
    }

    async fn update_agent(
        &self,
        id: &str,
        patch: &AgentPatch,
    ) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.get_mut(id).map(|mut entry| {
            entry.apply_patch(patch.clone(), agentforge_types::time::now());
            entry.value().clone()
        }))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.agents.remove(id).is_some())
    }
}

impl ConversationRepository for InMemoryStore {
    async fn get_conversation_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .iter()
            .find(|r| r.agent_id == agent_id)
            .map(|r| r.value().clone()))
    }

    async fn save_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        let stored = match self.conversations.entry(conversation.id.clone()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().messages = conversation.messages.clone();
                existing.get().clone()
            }
            Entry::Vacant(slot) => slot.insert(conversation.clone()).value().clone(),
        };
        Ok(stored)
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, RepositoryError> {
        Ok(self.conversations.remove(id).is_some())
    }
}

impl DeploymentRepository for InMemoryStore {
    async fn get_deployment_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Deployment>, RepositoryError> {
        let Some(deployment_id) = self.deployment_by_agent.get(agent_id).map(|r| r.value().clone())
        else {
            return Ok(None);
        };
        Ok(self.deployments.get(&deployment_id).map(|r| r.value().clone()))
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, RepositoryError> {
        match self.deployments.entry(deployment.id.clone()) {
            Entry::Occupied(_) => {
                return Err(RepositoryError::Conflict(format!(
                    "deployment '{}' already exists",
                    deployment.id
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(deployment.clone());
            }
        }
        self.deployment_by_agent
            .insert(deployment.agent_id.clone(), deployment.id.clone());
        Ok(deployment.clone())
    }

    async fn increment_request_count(&self, id: &str) -> Result<(), RepositoryError> {
        if let Some(mut entry) = self.deployments.get_mut(id) {
            entry.request_count += 1;
        }
        Ok(())
    }

    async fn set_deployment_active(&self, id: &str, is_active: bool) -> Result<(), RepositoryError> {
        if let Some(mut entry) = self.deployments.get_mut(id) {
            entry.is_active = is_active;
        }
        Ok(())
    }

    async fn delete_deployment(&self, id: &str) -> Result<bool, RepositoryError> {
        let Some((_, removed)) = self.deployments.remove(id) else {
            return Ok(false);
        };
        self.deployment_by_agent
            .remove_if(&removed.agent_id, |_, deployment_id| deployment_id == id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_contract() {
        crate::store_contract::run_all(&InMemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_fresh_instances_are_isolated() {
        let a = InMemoryStore::new();
        let b = InMemoryStore::new();
        let shared = a.clone();

        let agent = crate::store_contract::make_agent("iso", "R");
        a.create_agent(&agent).await.unwrap();

        assert!(shared.get_agent("iso").await.unwrap().is_some());
        assert!(b.get_agent("iso").await.unwrap().is_none());
    }
}
