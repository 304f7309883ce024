//! BoxStore -- object-safe dynamic dispatch wrapper for [`Store`].
//!
//! Same blanket-impl pattern as `BoxLlmProvider`:
//! 1. Define an object-safe `StoreDyn` trait with boxed futures
//! 2. Blanket-impl `StoreDyn` for all `T: Store`
//! 3. `BoxStore` wraps `Arc<dyn StoreDyn>`, delegates, and itself implements
//!    the repository traits so services stay generic over their storage.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use agentforge_types::agent::{Agent, AgentPatch};
use agentforge_types::conversation::Conversation;
use agentforge_types::deployment::Deployment;
use agentforge_types::error::RepositoryError;

use super::{AgentRepository, ConversationRepository, DeploymentRepository, Store};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RepositoryError>> + Send + 'a>>;

/// Object-safe version of [`Store`] with boxed futures.
pub trait StoreDyn: Send + Sync {
    fn list_agents_boxed(&self) -> BoxFuture<'_, Vec<Agent>>;
    fn get_agent_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Agent>>;
    fn create_agent_boxed<'a>(&'a self, agent: &'a Agent) -> BoxFuture<'a, Agent>;
    fn update_agent_boxed<'a>(
        &'a self,
        id: &'a str,
        patch: &'a AgentPatch,
    ) -> BoxFuture<'a, Option<Agent>>;
    fn delete_agent_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool>;

    fn get_conversation_by_agent_id_boxed<'a>(
        &'a self,
        agent_id: &'a str,
    ) -> BoxFuture<'a, Option<Conversation>>;
    fn save_conversation_boxed<'a>(
        &'a self,
        conversation: &'a Conversation,
    ) -> BoxFuture<'a, Conversation>;
    fn delete_conversation_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool>;

    fn get_deployment_by_agent_id_boxed<'a>(
        &'a self,
        agent_id: &'a str,
    ) -> BoxFuture<'a, Option<Deployment>>;
    fn create_deployment_boxed<'a>(&'a self, deployment: &'a Deployment)
    -> BoxFuture<'a, Deployment>;
    fn increment_request_count_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ()>;
    fn set_deployment_active_boxed<'a>(&'a self, id: &'a str, is_active: bool)
    -> BoxFuture<'a, ()>;
    fn delete_deployment_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool>;
}

/// Blanket implementation: any `Store` automatically implements `StoreDyn`.
impl<T: Store> StoreDyn for T {
    fn list_agents_boxed(&self) -> BoxFuture<'_, Vec<Agent>> {
        Box::pin(self.list_agents())
    }

    fn get_agent_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Option<Agent>> {
        Box::pin(self.get_agent(id))
    }

    fn create_agent_boxed<'a>(&'a self, agent: &'a Agent) -> BoxFuture<'a, Agent> {
        Box::pin(self.create_agent(agent))
    }

    fn update_agent_boxed<'a>(
        &'a self,
        id: &'a str,
        patch: &'a AgentPatch,
    ) -> BoxFuture<'a, Option<Agent>> {
        Box::pin(self.update_agent(id, patch))
    }

    fn delete_agent_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(self.delete_agent(id))
    }

    fn get_conversation_by_agent_id_boxed<'a>(
        &'a self,
        agent_id: &'a str,
    ) -> BoxFuture<'a, Option<Conversation>> {
        Box::pin(self.get_conversation_by_agent_id(agent_id))
    }

    fn save_conversation_boxed<'a>(
        &'a self,
        conversation: &'a Conversation,
    ) -> BoxFuture<'a, Conversation> {
        Box::pin(self.save_conversation(conversation))
    }

    fn delete_conversation_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(self.delete_conversation(id))
    }

    fn get_deployment_by_agent_id_boxed<'a>(
        &'a self,
        agent_id: &'a str,
    ) -> BoxFuture<'a, Option<Deployment>> {
        Box::pin(self.get_deployment_by_agent_id(agent_id))
    }

    fn create_deployment_boxed<'a>(
        &'a self,
        deployment: &'a Deployment,
    ) -> BoxFuture<'a, Deployment> {
        Box::pin(self.create_deployment(deployment))
    }

    fn increment_request_count_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ()> {
        Box::pin(self.increment_request_count(id))
    }

    fn set_deployment_active_boxed<'a>(
        &'a self,
        id: &'a str,
        is_active: bool,
    ) -> BoxFuture<'a, ()> {
        Box::pin(self.set_deployment_active(id, is_active))
    }

    fn delete_deployment_boxed<'a>(&'a self, id: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(self.delete_deployment(id))
    }
}

/// Type-erased storage backend selected at startup.
///
/// Cheap to clone; every clone shares the same underlying backend.
#[derive(Clone)]
pub struct BoxStore {
    inner: Arc<dyn StoreDyn>,
    backend: &'static str,
}

impl BoxStore {
    /// Wrap a concrete store, tagging it with a backend name for diagnostics.
    pub fn new<T: Store + 'static>(store: T, backend: &'static str) -> Self {
        Self {
            inner: Arc::new(store),
            backend,
        }
    }

    /// Name of the wrapped backend ("sqlite", "memory", "kv").
    pub fn backend(&self) -> &'static str {
        self.backend
    }
}

impl std::fmt::Debug for BoxStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxStore")
            .field("backend", &self.backend)
            .finish()
    }
}

impl AgentRepository for BoxStore {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        self.inner.list_agents_boxed().await
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, RepositoryError> {
        self.inner.get_agent_boxed(id).await
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        self.inner.create_agent_boxed(agent).await
    }

    async fn update_agent(
        &self,
        id: &str,
        patch: &AgentPatch,
    ) -> Result<Option<Agent>, RepositoryError> {
        self.inner.update_agent_boxed(id, patch).await
    }

    async fn delete_agent(&self, id: &str) -> Result<bool, RepositoryError> {
        self.inner.delete_agent_boxed(id).await
    }
}

impl ConversationRepository for BoxStore {
    async fn get_conversation_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        self.inner.get_conversation_by_agent_id_boxed(agent_id).await
    }

    async fn save_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        self.inner.save_conversation_boxed(conversation).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, RepositoryError> {
        self.inner.delete_conversation_boxed(id).await
    }
}

impl DeploymentRepository for BoxStore {
    async fn get_deployment_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Deployment>, RepositoryError> {
        self.inner.get_deployment_by_agent_id_boxed(agent_id).await
    }

    async fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> Result<Deployment, RepositoryError> {
        self.inner.create_deployment_boxed(deployment).await
    }

    async fn increment_request_count(&self, id: &str) -> Result<(), RepositoryError> {
        self.inner.increment_request_count_boxed(id).await
    }

    async fn set_deployment_active(&self, id: &str, is_active: bool) -> Result<(), RepositoryError> {
        self.inner.set_deployment_active_boxed(id, is_active).await
    }

    async fn delete_deployment(&self, id: &str) -> Result<bool, RepositoryError> {
        self.inner.delete_deployment_boxed(id).await
    }
}
