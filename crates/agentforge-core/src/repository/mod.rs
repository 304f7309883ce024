//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (agentforge-infra) implements with its SQLite, in-memory and key-value
//! backends. The core crate never depends on any specific storage technology.

pub mod agent;
pub mod box_store;
pub mod conversation;
pub mod deployment;

pub use agent::AgentRepository;
pub use box_store::BoxStore;
pub use conversation::ConversationRepository;
pub use deployment::DeploymentRepository;

/// The full persistence capability set: one backend serves every entity.
///
/// Blanket-implemented for anything implementing the three repository traits.
pub trait Store: AgentRepository + ConversationRepository + DeploymentRepository {}

impl<T> Store for T where T: AgentRepository + ConversationRepository + DeploymentRepository {}

#[cfg(test)]
pub(crate) mod fake;
