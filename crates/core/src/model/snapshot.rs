use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::category::{Category, DEFAULT_CATEGORY_ID};
use crate::model::ids::{CategoryId, QuestionId};
use crate::model::question::{Question, QuestionType};
use crate::model::user_state::{BookmarkFolder, UserState};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("invalid snapshot document: {0}")]
    Json(#[from] serde_json::Error),
}

/// The whole persisted application state, stored as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default = "default_categories")]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub user_state: UserState,
}

fn default_categories() -> Vec<Category> {
    vec![Category::demo()]
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            questions: Vec::new(),
            categories: default_categories(),
            user_state: UserState::default(),
        }
    }
}

impl Snapshot {
    /// A fresh install: the demo category with a handful of sample questions.
    #[must_use]
    pub fn demo() -> Self {
        let cat = CategoryId::new(DEFAULT_CATEGORY_ID);
        let question = |id: &str, content: &str, options: &[&str], answer: &str, t| Question {
            id: QuestionId::new(id),
            content: content.to_owned(),
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            answer: answer.to_owned(),
            question_type: t,
            category_id: cat.clone(),
            explanation: None,
        };

        Self {
            questions: vec![
                question(
                    "1",
                    "《红楼梦》的作者是谁？",
                    &["A. 曹雪芹", "B. 罗贯中", "C. 施耐庵", "D. 吴承恩"],
                    "A",
                    QuestionType::Single,
                ),
                question("2", "光年是时间单位。", &[], "错误", QuestionType::Judgment),
                question(
                    "3",
                    "以下属于四大发明的有：",
                    &["A. 造纸术", "B. 指南针", "C. 蒸汽机", "D. 火药"],
                    "ABD",
                    QuestionType::Multiple,
                ),
                question(
                    "4",
                    "One apple a day, keeps the doctor ____.",
                    &[],
                    "away",
                    QuestionType::Fill,
                ),
            ],
            categories: default_categories(),
            user_state: UserState::default(),
        }
    }

    /// Parses a stored document, upgrading older layouts on the way in.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Json` if the document is not a valid snapshot.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let mut value: Value = serde_json::from_str(raw)?;
        upgrade_legacy_bookmarks(&mut value);
        let mut snapshot: Snapshot = serde_json::from_value(value)?;
        if snapshot.user_state.bookmark_folders.is_empty() {
            snapshot
                .user_state
                .bookmark_folders
                .push(BookmarkFolder::default_folder());
        }
        Ok(snapshot)
    }

    /// Serializes the snapshot as a compact JSON document.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    #[must_use]
    pub fn category(&self, id: &CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == id)
    }
}

/// Older documents stored a flat `bookmarks` id list instead of folders.
fn upgrade_legacy_bookmarks(value: &mut Value) {
    let Some(state) = value.get_mut("userState").and_then(Value::as_object_mut) else {
        return;
    };
    let Some(Value::Array(ids)) = state.remove("bookmarks") else {
        return;
    };
    let mut folder = BookmarkFolder::default_folder();
    folder.question_ids = ids
        .into_iter()
        .filter_map(|v| v.as_str().map(QuestionId::new))
        .collect();
    if let Ok(folders) = serde_json::to_value(vec![folder]) {
        state.insert("bookmarkFolders".to_owned(), folders);
    }
}
