//! SQLite conversation repository implementation.

use agentforge_core::repository::ConversationRepository;
use agentforge_types::conversation::{Conversation, Message};
use agentforge_types::error::RepositoryError;
use sqlx::Row;

use super::{SqliteStore, format_datetime, is_unique_violation, parse_datetime, query_error};

struct ConversationRow {
    id: String,
    agent_id: String,
    messages: String,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            agent_id: row.try_get("agent_id")?,
            messages: row.try_get("messages")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_conversation(self) -> Result<Conversation, RepositoryError> {
        let messages: Vec<Message> = serde_json::from_str(&self.messages)
            .map_err(|e| RepositoryError::Query(format!("invalid messages JSON: {e}")))?;

        Ok(Conversation {
            id: self.id,
            agent_id: self.agent_id,
            messages,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation, RepositoryError> {
    ConversationRow::from_row(row)
        .map_err(query_error)?
        .into_conversation()
}

impl ConversationRepository for SqliteStore {
    async fn get_conversation_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE agent_id = ? LIMIT 1")
            .bind(agent_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(decode).transpose()
    }

    async fn save_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<Conversation, RepositoryError> {
        let messages_json = serde_json::to_string(&conversation.messages)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let updated = sqlx::query("UPDATE conversations SET messages = ? WHERE id = ?")
            .bind(&messages_json)
            .bind(&conversation.id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                "INSERT INTO conversations (id, agent_id, messages, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&conversation.id)
            .bind(&conversation.agent_id)
            .bind(&messages_json)
            .bind(format_datetime(&conversation.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict(format!("conversation '{}'", conversation.id))
                } else {
                    query_error(e)
                }
            })?;
        }

        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(&conversation.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;
        let stored = decode(&row)?;

        tx.commit().await.map_err(query_error)?;
        Ok(stored)
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
