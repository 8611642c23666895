use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use crate::repository::{SNAPSHOT_KEY, SnapshotRepository, StorageError};
use quiz_core::model::Snapshot;

use super::SqliteRepository;

#[async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn load_snapshot(&self) -> Result<Option<Snapshot>, StorageError> {
        let row = sqlx::query("SELECT body FROM snapshots WHERE key = ?1")
            .bind(SNAPSHOT_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let body: String = row
            .try_get("body")
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        Snapshot::from_json(&body)
            .map(Some)
            .map_err(|err| StorageError::Serialization(err.to_string()))
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let body = snapshot
            .to_json()
            .map_err(|err| StorageError::Serialization(err.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO snapshots (key, body, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            ",
        )
        .bind(SNAPSHOT_KEY)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreadable_body_is_a_serialization_error() {
        let repo = SqliteRepository::open("sqlite:file:memdb_corrupt?mode=memory&cache=shared")
            .await
            .unwrap();
        sqlx::query("INSERT INTO snapshots (key, body, updated_at) VALUES (?1, ?2, ?3)")
            .bind(SNAPSHOT_KEY)
            .bind("{not json")
            .bind(Utc::now())
            .execute(&repo.pool)
            .await
            .unwrap();

        let err = repo.load_snapshot().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
