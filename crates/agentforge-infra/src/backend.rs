//! Startup wiring: turn an [`AppConfig`] into concrete infrastructure.

use secrecy::ExposeSecret;

use agentforge_core::llm::box_provider::BoxLlmProvider;
use agentforge_core::repository::BoxStore;
use agentforge_types::llm::LlmError;

use crate::auth::{CredentialStore, parse_users};
use crate::config::{AppConfig, ConfigError, StorageBackend};
use crate::kv::{KvError, KvStore, UpstashClient};
use crate::llm::create_provider;
use crate::llm::openai_compat::config::OpenAiCompatConfig;
use crate::memory::InMemoryStore;
use crate::sqlite::SqliteStore;
use crate::sqlite::pool::SqlitePools;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create data directory: {0}")]
    DataDir(#[from] std::io::Error),

    #[error("failed to open database: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Kv(#[from] KvError),

    #[error(transparent)]
    Provider(#[from] LlmError),
}

/// Open the configured storage backend.
pub async fn build_store(config: &AppConfig) -> Result<BoxStore, BackendError> {
    let store = match config.backend {
        StorageBackend::Sqlite => {
            tokio::fs::create_dir_all(&config.data_dir).await?;
            let pools = SqlitePools::open(&config.database_url).await?;
            BoxStore::new(SqliteStore::new(pools), "sqlite")
        }
        StorageBackend::Memory => BoxStore::new(InMemoryStore::new(), "memory"),
        StorageBackend::Kv => {
            let (Some(url), Some(token)) = (&config.kv_url, &config.kv_token) else {
                return Err(ConfigError::MissingKvCredentials.into());
            };
            let client = UpstashClient::new(url.clone(), token.clone())?;
            BoxStore::new(KvStore::new(client), "kv")
        }
    };

    tracing::info!(backend = store.backend(), "storage backend ready");
    Ok(store)
}

/// Build the upstream chat completion provider.
pub fn build_provider(config: &AppConfig) -> Result<BoxLlmProvider, BackendError> {
    Ok(create_provider(OpenAiCompatConfig {
        provider_name: "openrouter".to_string(),
        base_url: config.provider_base_url.clone(),
        api_key: config.provider_api_key.clone(),
        site_url: config.site_url.clone(),
        site_name: config.site_name.clone(),
    })?)
}

/// Build the login and session token store.
pub fn build_credentials(config: &AppConfig) -> CredentialStore {
    if config.default_secret {
        tracing::warn!("AUTH_SECRET is not set; using the built-in signing secret");
    }
    let users = parse_users(config.auth_users.expose_secret());
    if users.is_empty() {
        tracing::warn!("no valid users configured; every login will fail");
    }
    CredentialStore::new(users, &config.auth_secret)
}
