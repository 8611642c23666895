mod advance;
mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use advance::PendingAdvance;
pub use plan::{DrawOutcome, RandomDraw};
pub use progress::SessionProgress;
pub use service::{QuizSession, SessionKind, SessionState, SubmissionOutcome, SubmitResult};
pub use view::{JUDGMENT_CHOICES, OptionState, OptionView, QuestionView};
pub use workflow::QuizService;
