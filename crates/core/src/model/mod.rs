mod category;
mod exam;
mod ids;
mod question;
mod snapshot;
mod user_state;

pub use ids::{CategoryId, ExamRecordId, ParseIdError, QuestionId};

pub use category::{Category, CategoryError, DEFAULT_CATEGORY_ID};
pub use exam::{ExamMode, ExamRecord};
pub use question::{Question, QuestionType, UNSET_ANSWER};
pub use snapshot::{Snapshot, SnapshotError};
pub use user_state::{
    BookmarkFolder, FontSize, Note, NoteFolder, RandomProgress, ThemeMode, UserState, WrongList,
};
