use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::{CategoryId, QuestionId};

/// Marker stored as the answer when the source text carried no answer line.
pub const UNSET_ANSWER: &str = "未设置";

//
// ─── QUESTION TYPE ─────────────────────────────────────────────────────────────
//

/// The five question shapes the parser can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multiple,
    Judgment,
    Fill,
    Essay,
}

impl QuestionType {
    /// All types in display order.
    pub const ALL: [QuestionType; 5] = [
        QuestionType::Single,
        QuestionType::Multiple,
        QuestionType::Judgment,
        QuestionType::Fill,
        QuestionType::Essay,
    ];

    /// Short label shown next to a question and used in grouped session titles.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            QuestionType::Single => "单选题",
            QuestionType::Multiple => "多选题",
            QuestionType::Judgment => "判断题",
            QuestionType::Fill => "填空题",
            QuestionType::Essay => "简答题",
        }
    }

    /// Machine name, matching the serialized form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Judgment => "judgment",
            QuestionType::Fill => "fill",
            QuestionType::Essay => "essay",
        }
    }

    /// Parses the machine name (case-insensitive).
    #[must_use]
    pub fn from_name(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == lowered)
    }

    /// Whether the question is answered by picking option letters.
    #[must_use]
    pub fn has_options(self) -> bool {
        matches!(self, QuestionType::Single | QuestionType::Multiple)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single imported exam question.
///
/// Options keep their original label prefix (`"A. text"`). The answer is the raw
/// reference text as it appeared after the answer label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub content: String,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub category_id: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Returns true when no answer line was found at import time.
    #[must_use]
    pub fn answer_is_unset(&self) -> bool {
        self.answer == UNSET_ANSWER
    }

    /// Option letter for the option at `index` (`0 -> 'A'`).
    #[must_use]
    pub fn option_letter(index: usize) -> Option<char> {
        u8::try_from(index)
            .ok()
            .filter(|i| *i < 26)
            .map(|i| char::from(b'A' + i))
    }
}
