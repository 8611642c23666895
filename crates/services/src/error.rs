//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{CategoryId, QuestionId};
use storage::repository::StorageError;

/// Errors emitted by a quiz session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("only exam sessions can be submitted")]
    NotExam,
    #[error("leaving an unsubmitted exam loses its answers; confirmation required")]
    ConfirmationRequired,
    #[error("session was discarded")]
    Closed,
}

/// Errors emitted by `QuizContext` and `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no question text provided")]
    EmptyInput,
    #[error("unrecognized format: no questions found in the text")]
    UnrecognizedFormat,
    #[error("category name cannot be empty")]
    EmptyCategoryName,
    #[error("unknown category: {0}")]
    UnknownCategory(CategoryId),
    #[error("unknown question: {0}")]
    UnknownQuestion(QuestionId),
    #[error("no questions of the requested type in this category")]
    EmptyPool,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
