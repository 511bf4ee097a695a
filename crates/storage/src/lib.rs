mod cases;
mod clients;

use std::{str::FromStr, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;

pub use cases::{CaseError, CaseRepository};
pub use clients::{ClientError, ClientRepository};

/// SQLite extended result code for a violated `UNIQUE` constraint.
const SQLITE_CONSTRAINT_UNIQUE: &str = "2067";
/// SQLite extended result code for a violated foreign key.
const SQLITE_CONSTRAINT_FOREIGNKEY: &str = "787";

/// Top-level database handle that owns the SQLite connection pool.
///
/// Built once at startup and cloned into request handlers; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle for client records.
    pub fn clients(&self) -> ClientRepository {
        ClientRepository::new(self.pool.clone())
    }

    /// Returns a handle for recovery cases.
    pub fn cases(&self) -> CaseRepository {
        CaseRepository::new(self.pool.clone())
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Waits for checked-out connections to return and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn has_code(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(code),
        _ => false,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_code(err, SQLITE_CONSTRAINT_UNIQUE)
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_code(err, SQLITE_CONSTRAINT_FOREIGNKEY)
}


#[cfg(test)]
mod tests {
    use super::test_support::setup_db;

    #[tokio::test]
    async fn migrations_apply() {
        let db = setup_db().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('clients', 'cases') ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .expect("fetch tables");
        let names: Vec<_> = tables.into_iter().map(|(name,)| name).collect();
        assert_eq!(names, vec!["cases", "clients"]);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = setup_db().await;
        let enabled: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("pragma");
        assert_eq!(enabled.0, 1);
    }
}
