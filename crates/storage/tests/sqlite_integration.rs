use quiz_core::model::{CategoryId, QuestionId, Snapshot};
use storage::repository::{SnapshotRepository, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_starts_empty_and_round_trips_snapshot() {
    let repo = SqliteRepository::open("sqlite:file:memdb_snapshot?mode=memory&cache=shared")
        .await
        .expect("open");

    assert!(repo.load_snapshot().await.unwrap().is_none());

    let mut snapshot = Snapshot::demo();
    snapshot
        .user_state
        .random_progress
        .mark_served(&CategoryId::new("default"), [&QuestionId::new("1")]);
    repo.save_snapshot(&snapshot).await.unwrap();

    let loaded = repo.load_snapshot().await.unwrap().expect("stored");
    assert_eq!(loaded, snapshot);
}

#[tokio::test]
async fn sqlite_save_overwrites_previous_document() {
    let repo = SqliteRepository::open("sqlite:file:memdb_overwrite?mode=memory&cache=shared")
        .await
        .expect("open");

    let first = Snapshot::demo();
    repo.save_snapshot(&first).await.unwrap();

    let mut second = first.clone();
    second.questions.truncate(1);
    repo.save_snapshot(&second).await.unwrap();

    let loaded = repo.load_snapshot().await.unwrap().expect("stored");
    assert_eq!(loaded.questions.len(), 1);
}

#[tokio::test]
async fn reopening_keeps_schema_and_document() {
    let url = "sqlite:file:memdb_reopen?mode=memory&cache=shared";
    let first = SqliteRepository::open(url).await.expect("first open");
    first.save_snapshot(&Snapshot::demo()).await.unwrap();

    let second = SqliteRepository::open(url).await.expect("second open");
    let loaded = second.load_snapshot().await.unwrap();
    assert_eq!(loaded, Some(Snapshot::demo()));
}

#[tokio::test]
async fn storage_facade_uses_sqlite_backend() {
    let storage = Storage::sqlite("sqlite:file:memdb_facade?mode=memory&cache=shared")
        .await
        .expect("storage");
    storage.snapshots.save_snapshot(&Snapshot::demo()).await.unwrap();
    let loaded = storage.snapshots.load_snapshot().await.unwrap();
    assert!(loaded.is_some());
}
