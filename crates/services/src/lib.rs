#![forbid(unsafe_code)]

pub mod context;
pub mod error;
pub mod mistakes;
pub mod sessions;
pub mod settings;

pub use quiz_core::Clock;
pub use sessions as session;

pub use context::{
    CategoryProgress, ImportReport, ImportTarget, QuestionScope, QuizContext, RandomStart,
    TypeGroup,
};
pub use error::{QuizError, SessionError};
pub use mistakes::{CategoryWrongCount, WrongStats};
pub use sessions::{
    DrawOutcome, OptionState, OptionView, QuestionView, QuizService, QuizSession, RandomDraw,
    SessionKind, SessionProgress, SessionState, SubmissionOutcome, SubmitResult,
};
pub use settings::QuizSettings;
