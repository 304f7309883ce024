//! Key-value storage backend.
//!
//! Records are JSON documents stored under `agent:{id}`, `conversation:{id}`
//! and `deployment:{id}`. Secondary indexes are kept next to them:
//!
//! - `agents`: set of agent ids
//! - `conversations:agent:{agentId}`: set of conversation ids
//! - `deployment:agent:{agentId}`: id of the agent's deployment
//!
//! Indexes are written on every create and cleaned on every delete. Nothing
//! here is transactional: a read-modify-write such as the request counter
//! can lose updates under concurrency.

pub mod client;

use serde::Serialize;
use serde::de::DeserializeOwned;

use agentforge_core::repository::{AgentRepository, ConversationRepository, DeploymentRepository};
use agentforge_types::agent::{Agent, AgentPatch};
use agentforge_types::conversation::Conversation;
use agentforge_types::deployment::Deployment;
use agentforge_types::error::RepositoryError;

pub use self::client::{KvClient, KvError, UpstashClient};

const AGENT_INDEX: &str = "agents";

fn agent_key(id: &str) -> String {
    format!("agent:{id}")
}

fn conversation_key(id: &str) -> String {
    format!("conversation:{id}")
}

fn conversation_index_key(agent_id: &str) -> String {
    format!("conversations:agent:{agent_id}")
}

fn deployment_key(id: &str) -> String {
    format!("deployment:{id}")
}

fn deployment_index_key(agent_id: &str) -> String {
    format!("deployment:agent:{agent_id}")
}

fn encode<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value).map_err(|e| RepositoryError::Query(format!("encode: {e}")))
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::Query(format!("decode: {e}")))
}

/// Store implementation over any [`KvClient`].
pub struct KvStore<C> {
    client: C,
}

impl<C: KvClient> KvStore<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        match self.client.get(key).await? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    async fn load_deployment(&self, id: &str) -> Result<Option<Deployment>, RepositoryError> {
        self.load(&deployment_key(id)).await
    }
}

impl<C: KvClient> AgentRepository for KvStore<C> {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        let ids = self.client.smembers(AGENT_INDEX).await?;
        let mut agents = Vec::with_capacity(ids.len());
        for id in ids {
            // Index entries whose record is gone are skipped.
            if let Some(agent) = self.load::<Agent>(&agent_key(&id)).await? {
                agents.push(agent);
            }
        }
        agents.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(agents)
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, RepositoryError> {
        self.load(&agent_key(id)).await
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let raw = encode(agent)?;
        if !self.client.set_nx(&agent_key(&agent.id), &raw).await? {
            return Err(RepositoryError::Conflict(format!(
                "agent '{}' already exists",
                agent.id
            )));
        }
        self.client.sadd(AGENT_INDEX, &agent.id).await?;
        Ok(agent.clone())
    }

    async fn update_agent(
        &self,
        id: &str,
        patch: &AgentPatch,
    ) -> Result<Option<Agent>, RepositoryError> {
        let Some(mut agent) = self.load::<Agent>(&agent_key(id)).await? else {
            return Ok(None);
        };
        agent.apply_patch(patch.clone(), agentforge_types::time::now());
        self.client.set(&agent_key(id), &encode(&agent)?).await?;
        Ok(Some(agent))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool, RepositoryError> {
        let removed = self.client.del(&agent_key(id)).await?;
        self.client.srem(AGENT_INDEX, id).await?;
        Ok(removed)
    }
}

impl<C: KvClient> ConversationRepository for KvStore<C> {
    async fn get_conversation_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        for id in self.client.smembers(&conversation_index_key(agent_id)).await? {
            if let Some(conversation) = self.load(&conversation_key(&id)).await? {
                return Ok(Some(conversation));
            }
        }
        Ok(None)
    }

    async fn save_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        let key = conversation_key(&conversation.id);
        let stored = match self.load::<Conversation>(&key).await? {
            Some(mut existing) => {
                existing.messages = conversation.messages.clone();
                existing
            }
            None => {
                self.client
                    .sadd(
                        &conversation_index_key(&conversation.agent_id),
                        &conversation.id,
                    )
                    .await?;
                conversation.clone()
            }
        };
        self.client.set(&key, &encode(&stored)?).await?;
        Ok(stored)
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, RepositoryError> {
        let key = conversation_key(id);
        let Some(conversation) = self.load::<Conversation>(&key).await? else {
            return Ok(false);
        };
        let removed = self.client.del(&key).await?;
        self.client
            .srem(&conversation_index_key(&conversation.agent_id), id)
            .await?;
        Ok(removed)
    }
}

impl<C: KvClient> DeploymentRepository for KvStore<C> {
    async fn get_deployment_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Deployment>, RepositoryError> {
        match self.client.get(&deployment_index_key(agent_id)).await? {
            Some(deployment_id) => self.load_deployment(&deployment_id).await,
            None => Ok(None),
        }
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, RepositoryError> {
        let raw = encode(deployment)?;
        if !self.client.set_nx(&deployment_key(&deployment.id), &raw).await? {
            return Err(RepositoryError::Conflict(format!(
                "deployment '{}' already exists",
                deployment.id
            )));
        }
        self.client
            .set(&deployment_index_key(&deployment.agent_id), &deployment.id)
            .await?;
        Ok(deployment.clone())
    }

    async fn increment_request_count(&self, id: &str) -> Result<(), RepositoryError> {
        if let Some(mut deployment) = self.load_deployment(id).await? {
            deployment.request_count += 1;
            self.client.set(&deployment_key(id), &encode(&deployment)?).await?;
        }
        Ok(())
    }

    async fn set_deployment_active(&self, id: &str, is_active: bool) -> Result<(), RepositoryError> {
        if let Some(mut deployment) = self.load_deployment(id).await? {
            deployment.is_active = is_active;
            self.client.set(&deployment_key(id), &encode(&deployment)?).await?;
        }
        Ok(())
    }

    async fn delete_deployment(&self, id: &str) -> Result<bool, RepositoryError> {
        let Some(deployment) = self.load_deployment(id).await? else {
            return Ok(false);
        };
        let removed = self.client.del(&deployment_key(id)).await?;

        // Only drop the pointer if it still points at this deployment.
        let index_key = deployment_index_key(&deployment.agent_id);
        if self.client.get(&index_key).await?.as_deref() == Some(id) {
            self.client.del(&index_key).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-process stand-in for the REST endpoint.

    use std::collections::BTreeSet;

    use dashmap::DashMap;

    use super::client::{KvClient, KvError};

    #[derive(Default)]
    pub struct FakeKv {
        strings: DashMap<String, String>,
        sets: DashMap<String, BTreeSet<String>>,
    }

    impl FakeKv {
        pub fn key_count(&self) -> usize {
            self.strings.len() + self.sets.iter().filter(|s| !s.is_empty()).count()
        }

        pub fn has_key(&self, key: &str) -> bool {
            self.strings.contains_key(key)
        }

        pub fn set_members(&self, key: &str) -> Vec<String> {
            self.sets
                .get(key)
                .map(|s| s.iter().cloned().collect())
                .unwrap_or_default()
        }
    }

    impl KvClient for FakeKv {
        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            Ok(self.strings.get(key).map(|v| v.value().clone()))
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
            self.strings.insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn set_nx(&self, key: &str, value: &str) -> Result<bool, KvError> {
            match self.strings.entry(key.to_string()) {
                dashmap::mapref::entry::Entry::Occupied(_) => Ok(false),
                dashmap::mapref::entry::Entry::Vacant(slot) => {
                    slot.insert(value.to_string());
                    Ok(true)
                }
            }
        }

        async fn del(&self, key: &str) -> Result<bool, KvError> {
            let string = self.strings.remove(key).is_some();
            let set = self.sets.remove(key).is_some();
            Ok(string || set)
        }

        async fn sadd(&self, key: &str, member: &str) -> Result<(), KvError> {
            self.sets
                .entry(key.to_string())
                .or_default()
                .insert(member.to_string());
            Ok(())
        }

        async fn srem(&self, key: &str, member: &str) -> Result<(), KvError> {
            if let Some(mut set) = self.sets.get_mut(key) {
                set.remove(member);
            }
            Ok(())
        }

        async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
            Ok(self.set_members(key))
        }
    }
}
