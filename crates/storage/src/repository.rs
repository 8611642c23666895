use async_trait::async_trait;
use quiz_core::model::Snapshot;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Key under which the application state document is stored.
pub const SNAPSHOT_KEY: &str = "simple-quiz-data";

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the single persisted state document.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Load the stored snapshot, if one was ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored document is unreadable,
    /// or other storage errors.
    async fn load_snapshot(&self) -> Result<Option<Snapshot>, StorageError>;

    /// Replace the stored snapshot wholesale.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    document: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a raw JSON document, as if written by an earlier version.
    #[must_use]
    pub fn with_document(raw: impl Into<String>) -> Self {
        Self {
            document: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// Raw JSON currently held, for assertions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw_document(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .document
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn load_snapshot(&self) -> Result<Option<Snapshot>, StorageError> {
        let guard = self
            .document
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .as_deref()
            .map(Snapshot::from_json)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let raw = snapshot
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let mut guard = self
            .document
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(raw);
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub snapshots: Arc<dyn SnapshotRepository>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    #[tokio::test]
    async fn empty_repository_has_no_snapshot() {
        let repo = InMemoryRepository::new();
        assert!(repo.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn round_trips_snapshot_with_user_state() {
        let repo = InMemoryRepository::new();
        let mut snapshot = Snapshot::demo();
        snapshot
            .user_state
            .wrong_list
            .increment(&QuestionId::new("1"));

        repo.save_snapshot(&snapshot).await.unwrap();
        let loaded = repo.load_snapshot().await.unwrap().unwrap();

        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.user_state.wrong_list.count(&QuestionId::new("1")), 1);
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let repo = InMemoryRepository::with_document("{broken");
        let err = repo.load_snapshot().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
