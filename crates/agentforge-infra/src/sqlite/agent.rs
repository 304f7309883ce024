//! SQLite agent repository implementation.

use agentforge_core::repository::AgentRepository;
use agentforge_types::agent::{Agent, AgentPatch, Tool};
use agentforge_types::error::RepositoryError;
use sqlx::Row;

use super::{SqliteStore, format_datetime, is_unique_violation, parse_datetime, query_error};

/// Internal row type for mapping SQLite rows to domain Agent.
struct AgentRow {
    id: String,
    name: String,
    role: String,
    system_prompt: String,
    model: String,
    tools: String,
    temperature: f64,
    created_at: String,
    updated_at: String,
}

impl AgentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            role: row.try_get("role")?,
            system_prompt: row.try_get("system_prompt")?,
            model: row.try_get("model")?,
            tools: row.try_get("tools")?,
            temperature: row.try_get("temperature")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_agent(self) -> Result<Agent, RepositoryError> {
        let tools: Vec<Tool> = serde_json::from_str(&self.tools)
            .map_err(|e| RepositoryError::Query(format!("invalid tools JSON: {e}")))?;

        Ok(Agent {
            id: self.id,
            name: self.name,
            role: self.role,
            system_prompt: self.system_prompt,
            model: self.model,
            tools,
            temperature: self.temperature,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Agent, RepositoryError> {
    AgentRow::from_row(row).map_err(query_error)?.into_agent()
}

fn tools_json(agent: &Agent) -> Result<String, RepositoryError> {
    serde_json::to_string(&agent.tools).map_err(|e| RepositoryError::Query(e.to_string()))
}

impl AgentRepository for SqliteStore {
    async fn list_agents(&self) -> Result<Vec<Agent>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM agents ORDER BY updated_at DESC, id ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }

    async fn get_agent(&self, id: &str) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(decode).transpose()
    }

    async fn create_agent(&self, agent: &Agent) -> Result<Agent, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO agents (id, name, role, system_prompt, model, tools, temperature, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&agent.id)
        .bind(&agent.name)
        .bind(&agent.role)
        .bind(&agent.system_prompt)
        .bind(&agent.model)
        .bind(tools_json(agent)?)
        .bind(agent.temperature)
        .bind(format_datetime(&agent.created_at))
        .bind(format_datetime(&agent.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(agent.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "agent '{}' already exists",
                agent.id
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn update_agent(
        &self,
        id: &str,
        patch: &AgentPatch,
    ) -> Result<Option<Agent>, RepositoryError> {
        // Read-merge-write on the single writer connection so concurrent
        // updates of the same agent serialize.
        let mut tx = self.pool.writer.begin().await.map_err(query_error)?;

        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut agent = decode(&row)?;
        agent.apply_patch(patch.clone(), agentforge_types::time::now());

        sqlx::query(
            "UPDATE agents SET name = ?, role = ?, system_prompt = ?, model = ?, tools = ?, temperature = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&agent.name)
        .bind(&agent.role)
        .bind(&agent.system_prompt)
        .bind(&agent.model)
        .bind(tools_json(&agent)?)
        .bind(agent.temperature)
        .bind(format_datetime(&agent.updated_at))
        .bind(&agent.id)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(query_error)?;
        Ok(Some(agent))
    }

    async fn delete_agent(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
