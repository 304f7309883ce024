//! SQLite deployment repository implementation.

use agentforge_core::repository::DeploymentRepository;
use agentforge_types::deployment::Deployment;
use agentforge_types::error::RepositoryError;
use sqlx::Row;

use super::{SqliteStore, format_datetime, is_unique_violation, parse_datetime, query_error};

struct DeploymentRow {
    id: String,
    agent_id: String,
    api_key: String,
    is_active: bool,
    request_count: i64,
    created_at: String,
}

impl DeploymentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            agent_id: row.try_get("agent_id")?,
            api_key: row.try_get("api_key")?,
            is_active: row.try_get("is_active")?,
            request_count: row.try_get("request_count")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_deployment(self) -> Result<Deployment, RepositoryError> {
        Ok(Deployment {
            id: self.id,
            agent_id: self.agent_id,
            api_key: self.api_key,
            is_active: self.is_active,
            request_count: self.request_count,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl DeploymentRepository for SqliteStore {
    async fn get_deployment_by_agent_id(
        &self,
        agent_id: &str,
    ) -> Result<Option<Deployment>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM deployments WHERE agent_id = ? LIMIT 1")
            .bind(agent_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let dep_row = DeploymentRow::from_row(&row).map_err(query_error)?;
                Ok(Some(dep_row.into_deployment()?))
            }
            None => Ok(None),
        }
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<Deployment, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO deployments (id, agent_id, api_key, is_active, request_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&deployment.id)
        .bind(&deployment.agent_id)
        .bind(&deployment.api_key)
        .bind(deployment.is_active)
        .bind(deployment.request_count)
        .bind(format_datetime(&deployment.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(deployment.clone()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "deployment '{}' already exists",
                deployment.id
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn increment_request_count(&self, id: &str) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE deployments SET request_count = request_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(())
    }

    async fn set_deployment_active(&self, id: &str, is_active: bool) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE deployments SET is_active = ? WHERE id = ?")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(())
    }

    async fn delete_deployment(&self, id: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM deployments WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}
