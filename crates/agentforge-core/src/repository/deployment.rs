//! Deployment repository trait definition.

use agentforge_types::deployment::Deployment;
use agentforge_types::error::RepositoryError;

/// Repository trait for deployment persistence.
///
/// At most one deployment exists per agent; the invariant is kept by callers
/// looking up before creating.
pub trait DeploymentRepository: Send + Sync {
    /// The deployment attached to an agent, if any.
    fn get_deployment_by_agent_id(
        &self,
        agent_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Deployment>, RepositoryError>> + Send;

    /// Insert a new deployment. Fails with [`RepositoryError::Conflict`] if the id is taken.
    fn create_deployment(
        &self,
        deployment: &Deployment,
    ) -> impl std::future::Future<Output = Result<Deployment, RepositoryError>> + Send;

    /// Add one to the usage counter. Unknown ids are ignored.
    fn increment_request_count(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Flip the active flag. Unknown ids are ignored.
    fn set_deployment_active(
        &self,
        id: &str,
        is_active: bool,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a deployment and its agent index entry. Returns whether a record was removed.
    fn delete_deployment(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
