use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{CategoryId, QuestionId, Snapshot};
use quiz_core::time::fixed_clock;
use services::{
    ImportTarget, QuizContext, QuizError, QuizService, QuizSettings, RandomStart, SessionKind,
};
use storage::repository::{InMemoryRepository, SnapshotRepository, StorageError};

const THREE_QUESTIONS: &str = "\
1. 水的化学式是？
A. H2O
B. CO2
答案：A
2. 地球是圆的。
答案：对
3) 以下哪些是质数？
A. 2  B. 3  C. 4
答案：AB
";

async fn service_with_bank(repo: &InMemoryRepository) -> (QuizService, CategoryId) {
    let context = QuizContext::new(Snapshot::demo())
        .with_clock(fixed_clock())
        .with_rng_seed(9)
        .with_settings(QuizSettings::default().with_random_batch_size(2));
    let mut service = QuizService::new(context, Arc::new(repo.clone()));
    let report = service
        .import(THREE_QUESTIONS, ImportTarget::NewCategory("化学".into()))
        .await
        .unwrap();
    assert_eq!(report.imported, 3);
    (service, report.category_id)
}

fn started(start: RandomStart) -> services::QuizSession {
    match start {
        RandomStart::Started(session) => session,
        RandomStart::Exhausted { .. } => panic!("expected a session"),
    }
}

#[tokio::test]
async fn load_seeds_demo_bank_and_persists_it() {
    let repo = InMemoryRepository::new();
    let service = QuizService::load(
        Arc::new(repo.clone()),
        fixed_clock(),
        QuizSettings::default(),
    )
    .await
    .unwrap();

    assert_eq!(service.context().snapshot().questions.len(), 4);
    let stored = repo.load_snapshot().await.unwrap().expect("seed persisted");
    assert_eq!(&stored, service.context().snapshot());
}

#[tokio::test]
async fn load_tolerates_corrupt_document() {
    let repo = InMemoryRepository::with_document("not json");
    let service = QuizService::load(
        Arc::new(repo.clone()),
        fixed_clock(),
        QuizSettings::default(),
    )
    .await
    .unwrap();

    assert_eq!(service.context().snapshot(), &Snapshot::demo());
    assert_eq!(repo.raw_document().unwrap().as_deref(), Some("not json"));
}

#[tokio::test]
async fn load_upgrades_legacy_bookmarks() {
    let raw = r#"{"questions":[],"categories":[{"id":"c","name":"旧库"}],"userState":{"bookmarks":["q1","q2"],"wrongList":{"q1":2}}}"#;
    let repo = InMemoryRepository::with_document(raw);
    let service = QuizService::load(
        Arc::new(repo),
        fixed_clock(),
        QuizSettings::default(),
    )
    .await
    .unwrap();

    let state = &service.context().snapshot().user_state;
    assert_eq!(state.bookmark_folders.len(), 1);
    assert_eq!(state.bookmark_folders[0].question_ids.len(), 2);
    assert_eq!(state.wrong_list.count(&QuestionId::new("q1")), 2);
}

#[tokio::test]
async fn double_submit_counts_mistakes_once() {
    let repo = InMemoryRepository::new();
    let (mut service, category) = service_with_bank(&repo).await;

    let mut session = started(
        service
            .context_mut()
            .start_random_exam(&category, None)
            .unwrap(),
    );
    let first = service.submit(&mut session).await.unwrap();
    let second = service.submit(&mut session).await.unwrap();

    assert!(first.newly_submitted);
    assert!(!second.newly_submitted);
    assert_eq!(first.outcome.score, second.outcome.score);
    assert_eq!(first.outcome.wrong_ids, second.outcome.wrong_ids);

    let stored = repo.load_snapshot().await.unwrap().unwrap();
    for id in &first.outcome.wrong_ids {
        assert_eq!(stored.user_state.wrong_list.count(id), 1);
    }
    assert_eq!(stored.user_state.exam_history.len(), 1);
}

#[tokio::test]
async fn exhausted_category_is_fully_eligible_after_reset() {
    let repo = InMemoryRepository::new();
    let (mut service, category) = service_with_bank(&repo).await;

    let mut served = 0;
    loop {
        let start = service
            .context_mut()
            .start_random_exam(&category, None)
            .unwrap();
        let RandomStart::Started(mut session) = start else {
            break;
        };
        served += session.questions().len();
        service.submit(&mut session).await.unwrap();
    }
    assert_eq!(served, 3);

    let progress = service.context().category_progress(&category).unwrap();
    assert_eq!((progress.served, progress.total), (3, 3));

    service.reset_progress(&category).await.unwrap();
    let session = started(
        service
            .context_mut()
            .start_random_exam(&category, None)
            .unwrap(),
    );
    assert_eq!(session.title(), "化学 - 随机模考 (剩余3题)");
    let stored = repo.load_snapshot().await.unwrap().unwrap();
    assert_eq!(stored.user_state.random_progress.served_count(&category), 0);
}

#[tokio::test]
async fn restart_after_type_exhaustion_resets_whole_category() {
    let repo = InMemoryRepository::new();
    let (mut service, category) = service_with_bank(&repo).await;
    let judgment = Some(quiz_core::model::QuestionType::Judgment);

    let mut session = started(
        service
            .context_mut()
            .start_random_exam(&category, judgment)
            .unwrap(),
    );
    service.submit(&mut session).await.unwrap();
    let mut session = started(
        service
            .context_mut()
            .start_random_exam(&category, None)
            .unwrap(),
    );
    assert_eq!(session.questions().len(), 2);
    service.submit(&mut session).await.unwrap();

    let exhausted = service
        .context_mut()
        .start_random_exam(&category, judgment)
        .unwrap();
    assert!(matches!(exhausted, RandomStart::Exhausted { .. }));

    let session = service
        .restart_random_exam(&category, judgment)
        .await
        .unwrap();
    assert_eq!(session.title(), "化学 - 随机模考");
    assert_eq!(
        service.context().category_progress(&category).unwrap().served,
        0
    );
}

#[tokio::test]
async fn discarded_random_exam_leaves_progress_alone() {
    let repo = InMemoryRepository::new();
    let (mut service, category) = service_with_bank(&repo).await;
    let before = repo.raw_document().unwrap();

    let mut session = started(
        service
            .context_mut()
            .start_random_exam(&category, None)
            .unwrap(),
    );
    session.answer_current("A");
    assert!(session.discard(false).is_err());
    session.discard(true).unwrap();

    assert!(matches!(
        service.submit(&mut session).await,
        Err(QuizError::Session(_))
    ));
    assert_eq!(
        service.context().category_progress(&category).unwrap().served,
        0
    );
    assert_eq!(repo.raw_document().unwrap(), before);
}

#[tokio::test]
async fn study_sessions_never_touch_trackers() {
    let repo = InMemoryRepository::new();
    let (mut service, category) = service_with_bank(&repo).await;

    let mut session = service
        .context_mut()
        .start_grouped(
            &services::QuestionScope::Category(category),
            None,
            SessionKind::Study,
        )
        .unwrap();
    session.answer_current("B");
    assert!(session.is_revealed());
    assert!(service.submit(&mut session).await.is_err());
    assert!(service.context().snapshot().user_state.wrong_list.is_empty());
}

#[tokio::test]
async fn stored_document_uses_camel_case_fields() {
    let repo = InMemoryRepository::new();
    let (_service, _) = service_with_bank(&repo).await;

    let raw = repo.raw_document().unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(value["userState"]["wrongList"].is_object());
    assert!(value["userState"]["randomProgress"].is_object());
    assert_eq!(value["questions"][0]["type"], "single");
    assert_eq!(value["questions"][0]["categoryId"], "default");
}

struct FailingRepository;

#[async_trait]
impl SnapshotRepository for FailingRepository {
    async fn load_snapshot(&self) -> Result<Option<Snapshot>, StorageError> {
        Err(StorageError::Connection("offline".into()))
    }

    async fn save_snapshot(&self, _snapshot: &Snapshot) -> Result<(), StorageError> {
        Err(StorageError::Connection("offline".into()))
    }
}

#[tokio::test]
async fn connection_errors_propagate() {
    let err = QuizService::load(
        Arc::new(FailingRepository),
        fixed_clock(),
        QuizSettings::default(),
    )
    .await
    .err()
    .expect("load should fail");
    assert!(matches!(err, QuizError::Storage(StorageError::Connection(_))));

    let mut service = QuizService::new(QuizContext::new(Snapshot::demo()), Arc::new(FailingRepository));
    let err = service
        .import(THREE_QUESTIONS, ImportTarget::NewCategory("x".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, QuizError::Storage(_)));
}
