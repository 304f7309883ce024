//! SQLite storage backend.
//!
//! [`SqliteStore`] implements every repository trait from `agentforge-core`
//! on top of a WAL-mode database with split read/write connection pools.

pub mod agent;
pub mod conversation;
pub mod deployment;
pub mod pool;

use agentforge_types::error::RepositoryError;
use chrono::{DateTime, SecondsFormat, Utc};

use self::pool::SqlitePools;

/// SQLite-backed implementation of the full store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePools,
}

impl SqliteStore {
    /// Create a new store backed by the given pools.
    pub fn new(pool: SqlitePools) -> Self {
        Self { pool }
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width format so that `ORDER BY` on the text column is chronological.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn query_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE"))
}

/// Fresh store in a temporary directory. The directory is removed when the
/// returned guard drops, so keep it alive for the whole test.
#[cfg(test)]
pub(crate) async fn test_store() -> (SqliteStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = pool::database_url_for(dir.path());
    let store = SqliteStore::new(SqlitePools::open(&url).await.unwrap());
    (store, dir)
}
