//! Application state wiring all services together.
//!
//! Services are generic over the repository traits; AppState pins them to
//! the type-erased [`BoxStore`] so the storage backend can be chosen at
//! startup.

use std::sync::Arc;

use agentforge_core::chat::service::ChatService;
use agentforge_core::llm::box_provider::BoxLlmProvider;
use agentforge_core::repository::BoxStore;
use agentforge_core::service::agent::AgentService;
use agentforge_core::service::deployment::DeploymentService;
use agentforge_infra::auth::CredentialStore;
use agentforge_infra::backend::{build_credentials, build_provider, build_store};
use agentforge_infra::config::AppConfig;

/// Concrete type aliases for the service generics pinned to the boxed store.
pub type ConcreteAgentService = AgentService<BoxStore>;
pub type ConcreteDeploymentService = DeploymentService<BoxStore>;
pub type ConcreteChatService = ChatService<BoxStore>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub agent_service: Arc<ConcreteAgentService>,
    pub deployment_service: Arc<ConcreteDeploymentService>,
    pub chat_service: Arc<ConcreteChatService>,
    pub credentials: Arc<CredentialStore>,
    /// Marks session cookies `Secure`.
    pub production: bool,
}

impl AppState {
    /// Wire services around an already-opened store and provider.
    pub fn new(
        store: BoxStore,
        provider: BoxLlmProvider,
        credentials: CredentialStore,
        relay_capacity: usize,
        production: bool,
    ) -> Self {
        Self {
            agent_service: Arc::new(AgentService::new(store.clone())),
            deployment_service: Arc::new(DeploymentService::new(store.clone())),
            chat_service: Arc::new(
                ChatService::new(store, provider).with_relay_capacity(relay_capacity),
            ),
            credentials: Arc::new(credentials),
            production,
        }
    }

    /// Initialize the application state from configuration: open the
    /// storage backend, build the provider, load credentials.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let store = build_store(config).await?;
        let provider = build_provider(config)?;
        let credentials = build_credentials(config);

        Ok(Self::new(
            store,
            provider,
            credentials,
            config.relay_capacity,
            config.production,
        ))
    }
}
