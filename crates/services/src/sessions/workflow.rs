use std::sync::Arc;

use tracing::{info, warn};

use quiz_core::model::{CategoryId, Question, QuestionId, QuestionType, Snapshot};
use storage::repository::{SnapshotRepository, StorageError};

use crate::context::{ImportReport, ImportTarget, QuizContext};
use crate::error::QuizError;
use crate::settings::QuizSettings;
use crate::Clock;

use super::service::{QuizSession, SubmitResult};

/// Orchestrates the quiz context and persists the snapshot after every mutation.
///
/// Session navigation and answering stay on `QuizSession` and touch no
/// stored state; only operations that change the bank or the trackers go
/// through here.
pub struct QuizService {
    context: QuizContext,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl QuizService {
    /// Wrap an already-built context.
    #[must_use]
    pub fn new(context: QuizContext, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        Self { context, snapshots }
    }

    /// Load the stored snapshot, or seed the demo bank when there is none.
    ///
    /// An unreadable document is logged and replaced by the demo bank in
    /// memory; it is only overwritten by the next mutation.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` for connection failures.
    pub async fn load(
        snapshots: Arc<dyn SnapshotRepository>,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, QuizError> {
        let (snapshot, seeded) = match snapshots.load_snapshot().await {
            Ok(Some(snapshot)) => (snapshot, false),
            Ok(None) => (Snapshot::demo(), true),
            Err(StorageError::Serialization(reason)) => {
                warn!(%reason, "stored snapshot unreadable, starting from demo bank");
                (Snapshot::demo(), false)
            }
            Err(err) => return Err(err.into()),
        };

        let context = QuizContext::new(snapshot)
            .with_clock(clock)
            .with_settings(settings);
        let service = Self::new(context, snapshots);
        if seeded {
            info!("no stored snapshot, seeding demo bank");
            service.persist().await?;
        }
        Ok(service)
    }

    #[must_use]
    pub fn context(&self) -> &QuizContext {
        &self.context
    }

    /// Mutable access for starting sessions and drawing batches.
    ///
    /// Changes made through this handle are not persisted until the next
    /// persisted operation or an explicit `persist`.
    pub fn context_mut(&mut self) -> &mut QuizContext {
        &mut self.context
    }

    /// Write the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the write fails.
    pub async fn persist(&self) -> Result<(), QuizError> {
        self.snapshots.save_snapshot(self.context.snapshot()).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// See `QuizContext::import`; also `QuizError::Storage`.
    pub async fn import(
        &mut self,
        text: &str,
        target: ImportTarget,
    ) -> Result<ImportReport, QuizError> {
        let report = self.context.import(text, target)?;
        self.persist().await?;
        Ok(report)
    }

    /// # Errors
    ///
    /// See `QuizContext::delete_category`; also `QuizError::Storage`.
    pub async fn delete_category(&mut self, id: &CategoryId) -> Result<usize, QuizError> {
        let removed = self.context.delete_category(id)?;
        self.persist().await?;
        Ok(removed)
    }

    /// # Errors
    ///
    /// See `QuizContext::delete_question`; also `QuizError::Storage`.
    pub async fn delete_question(&mut self, id: &QuestionId) -> Result<Question, QuizError> {
        let removed = self.context.delete_question(id)?;
        self.persist().await?;
        Ok(removed)
    }

    /// Submit an exam; tracker changes are persisted only on the first submit.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` or `QuizError::Storage`.
    pub async fn submit(&mut self, session: &mut QuizSession) -> Result<SubmitResult, QuizError> {
        let result = self.context.submit(session)?;
        if result.newly_submitted {
            self.persist().await?;
        }
        Ok(result)
    }

    /// Reset a category's random progress, then start a fresh random exam.
    ///
    /// # Errors
    ///
    /// See `QuizContext::restart_random_exam`; also `QuizError::Storage`.
    pub async fn restart_random_exam(
        &mut self,
        category: &CategoryId,
        type_filter: Option<QuestionType>,
    ) -> Result<QuizSession, QuizError> {
        let session = self.context.restart_random_exam(category, type_filter)?;
        self.persist().await?;
        Ok(session)
    }

    /// # Errors
    ///
    /// See `QuizContext::reset_progress`; also `QuizError::Storage`.
    pub async fn reset_progress(&mut self, category: &CategoryId) -> Result<(), QuizError> {
        self.context.reset_progress(category)?;
        self.persist().await
    }

    /// Returns whether the question was on the wrong list.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` if the write fails.
    pub async fn master_question(&mut self, id: &QuestionId) -> Result<bool, QuizError> {
        let removed = self.context.master_question(id);
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// See `QuizContext::clear_wrong`; also `QuizError::Storage`.
    pub async fn clear_wrong(
        &mut self,
        category: &CategoryId,
        question_type: Option<QuestionType>,
    ) -> Result<usize, QuizError> {
        let removed = self.context.clear_wrong(category, question_type)?;
        self.persist().await?;
        Ok(removed)
    }
}
