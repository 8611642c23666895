use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use thiserror::Error;

use crate::repository::{SnapshotRepository, Storage};

mod migrate;
mod snapshot_repo;

/// `SQLite` store for the quiz snapshot document.
///
/// The whole application state is one row, so the pool holds a single
/// connection and every load and save runs in order.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error("cannot open quiz database: {0}")]
    Open(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open the database at `database_url`, creating the file when missing,
    /// and apply any schema versions that have not run yet.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is malformed, the database cannot
    /// be opened, or a migration fails.
    pub async fn open(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// See `SqliteRepository::open`.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let snapshots: Arc<dyn SnapshotRepository> =
            Arc::new(SqliteRepository::open(database_url).await?);
        Ok(Self { snapshots })
    }
}
