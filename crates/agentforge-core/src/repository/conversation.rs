//! Conversation repository trait definition.

use agentforge_types::conversation::Conversation;
use agentforge_types::error::RepositoryError;

/// Repository trait for conversation persistence.
pub trait ConversationRepository: Send + Sync {
    /// Any one conversation belonging to the agent.
    fn get_conversation_by_agent_id(
        &self,
        agent_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, RepositoryError>> + Send;

    /// Upsert by id. On an existing id only the messages are replaced and the
    /// stored record is returned.
    fn save_conversation(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<Conversation, RepositoryError>> + Send;

    /// Delete a conversation. Returns whether a record was removed.
    fn delete_conversation(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
