//! Agent repository trait definition.

use agentforge_types::agent::{Agent, AgentPatch};
use agentforge_types::error::RepositoryError;

/// Repository trait for agent persistence.
///
/// Implementations live in agentforge-infra (e.g., `SqliteStore`).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait AgentRepository: Send + Sync {
    /// All agents, most recently updated first (ties broken by id ascending).
    fn list_agents(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Agent>, RepositoryError>> + Send;

    /// Get an agent by its id.
    fn get_agent(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// Insert a new agent. Fails with [`RepositoryError::Conflict`] if the id is taken.
    fn create_agent(
        &self,
        agent: &Agent,
    ) -> impl std::future::Future<Output = Result<Agent, RepositoryError>> + Send;

    /// Merge `patch` into the stored agent and stamp `updated_at`.
    ///
    /// Returns `None` when no agent has this id.
    fn update_agent(
        &self,
        id: &str,
        patch: &AgentPatch,
    ) -> impl std::future::Future<Output = Result<Option<Agent>, RepositoryError>> + Send;

    /// Delete an agent. Returns whether a record was removed.
    fn delete_agent(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
