//! Freeform text → `Question` conversion.
//!
//! Input is flat, line-oriented text mixing Chinese and Latin punctuation:
//!
//! ```text
//! 1. 以下属于四大发明的有：
//! A. 造纸术  B. 指南针
//! C. 蒸汽机  D. 火药
//! [多选题]
//! 答案：ABD
//! ```
//!
//! Parsing never fails. Lines that fit nowhere are dropped, and a question with
//! empty content is never emitted.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{CategoryId, Question, QuestionId, QuestionType, UNSET_ANSWER};

static QUESTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+[.、)\s．]|\(\d+\))\s*").expect("question marker regex is invalid")
});

const OPTION_MARKER: &str = r"(?:[A-Z][.、)\s．]|\([A-Z]\))";

static OPTION_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(OPTION_MARKER).expect("option marker regex is invalid"));

static OPTION_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{OPTION_MARKER}")).expect("option start regex is invalid")
});

static ANSWER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:答案|Answer|Ans|参考答案|【答案】)[:：]?\s*")
        .expect("answer label regex is invalid")
});

static TYPE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(?:判断|选择|单选|多选|填空|问答|简答).{0,2}\]").expect("type tag regex is invalid")
});

/// Answer tokens that force a question to `judgment`, compared uppercased.
const JUDGMENT_TOKENS: [&str; 10] = ["对", "错", "正确", "错误", "T", "F", "√", "×", "TRUE", "FALSE"];

//
// ─── LINE CLASSIFICATION ───────────────────────────────────────────────────────
//

/// What a single trimmed, non-empty line contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Numbered line opening a new question; carries the text after the marker.
    QuestionStart(&'a str),
    /// Several options packed on one line.
    PackedOptions(Vec<&'a str>),
    SingleOption(&'a str),
    /// Text after the answer label (may be empty).
    Answer(&'a str),
    /// Bracketed type tag. `None` for tags like `[选择题]` that name no concrete type.
    TypeTag(Option<QuestionType>),
    Text(&'a str),
}

/// Classifies a line in the fixed priority order the scanner relies on.
#[must_use]
pub fn classify(line: &str) -> LineKind<'_> {
    if let Some(m) = QUESTION_MARKER.find(line) {
        return LineKind::QuestionStart(&line[m.end()..]);
    }
    if OPTION_START.is_match(line) {
        if OPTION_ANYWHERE.find_iter(line).count() > 1 {
            return LineKind::PackedOptions(split_packed_options(line));
        }
        return LineKind::SingleOption(line);
    }
    if let Some(m) = ANSWER_LABEL.find(line) {
        return LineKind::Answer(line[m.end()..].trim());
    }
    if TYPE_TAG.is_match(line) {
        return LineKind::TypeTag(tag_type(line));
    }
    LineKind::Text(line)
}

/// Splits `"A. x  B. y"` at whitespace runs that are directly followed by an option marker.
///
/// Known source of misparses: option text that itself contains a capital letter
/// followed by punctuation or a space (`"A. I. Newton B. ..."`) is split as well.
fn split_packed_options(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !c.is_whitespace() {
            continue;
        }
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if !next.is_whitespace() {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        if OPTION_START.is_match(&line[end..]) {
            parts.push(&line[start..i]);
            start = end;
        }
    }
    parts.push(&line[start..]);

    parts
        .into_iter()
        .filter(|part| OPTION_START.is_match(part))
        .collect()
}

fn tag_type(line: &str) -> Option<QuestionType> {
    if line.contains("判断") {
        Some(QuestionType::Judgment)
    } else if line.contains("填空") {
        Some(QuestionType::Fill)
    } else if line.contains("问答") || line.contains("简答") {
        Some(QuestionType::Essay)
    } else if line.contains("多选") {
        Some(QuestionType::Multiple)
    } else if line.contains("单选") {
        Some(QuestionType::Single)
    } else {
        None
    }
}

fn is_judgment_token(answer: &str) -> bool {
    let upper = answer.to_uppercase();
    JUDGMENT_TOKENS.contains(&upper.as_str())
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// A question still being accumulated by the scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub content: String,
    pub options: Vec<String>,
    pub answer: Option<String>,
    pub question_type: Option<QuestionType>,
}

impl Draft {
    #[must_use]
    pub fn open(content: &str) -> Self {
        Self {
            content: content.to_owned(),
            ..Self::default()
        }
    }

    /// Attributes a non-question-start line to this draft.
    fn absorb(&mut self, kind: LineKind<'_>) {
        match kind {
            LineKind::PackedOptions(parts) => {
                self.options.extend(parts.into_iter().map(str::to_owned));
            }
            LineKind::SingleOption(line) => self.options.push(line.to_owned()),
            LineKind::Answer(text) => {
                // An empty answer label counts as no answer at all.
                self.answer = (!text.is_empty()).then(|| text.to_owned());
                if is_judgment_token(text) {
                    self.question_type = Some(QuestionType::Judgment);
                }
            }
            LineKind::TypeTag(tagged) => {
                if tagged.is_some() {
                    self.question_type = tagged;
                }
            }
            LineKind::Text(line) => {
                if self.options.is_empty() && self.answer.is_none() {
                    if !self.content.is_empty() {
                        self.content.push('\n');
                    }
                    self.content.push_str(line);
                }
            }
            LineKind::QuestionStart(_) => {}
        }
    }

    /// Type the draft would get at finalization.
    #[must_use]
    pub fn resolved_type(&self) -> QuestionType {
        if let Some(t) = self.question_type {
            return t;
        }
        if self.options.is_empty() {
            return QuestionType::Essay;
        }
        let letters = leading_answer_letters(self.answer.as_deref().unwrap_or_default());
        if letters.len() > 1 {
            QuestionType::Multiple
        } else {
            QuestionType::Single
        }
    }

    /// Turns the draft into a `Question`, or `None` when it has no content.
    #[must_use]
    pub fn finalize(self, category_id: &CategoryId) -> Option<Question> {
        if self.content.is_empty() {
            return None;
        }
        let question_type = self.resolved_type();
        Some(Question {
            id: QuestionId::generate(),
            content: self.content,
            options: self.options,
            answer: self.answer.unwrap_or_else(|| UNSET_ANSWER.to_owned()),
            question_type,
            category_id: category_id.clone(),
            explanation: None,
        })
    }
}

/// Uppercased letters from the leading run of letters, whitespace and commas.
fn leading_answer_letters(answer: &str) -> String {
    answer
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || c.is_whitespace() || *c == ',')
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

//
// ─── SCAN ──────────────────────────────────────────────────────────────────────
//

/// Fold accumulator: the open draft plus every draft already closed.
#[derive(Debug, Default)]
struct Scan {
    open: Option<Draft>,
    closed: Vec<Draft>,
}

impl Scan {
    fn feed(mut self, line: &str) -> Self {
        match classify(line) {
            LineKind::QuestionStart(rest) => {
                if let Some(prev) = self.open.replace(Draft::open(rest)) {
                    self.closed.push(prev);
                }
            }
            other => {
                if let Some(draft) = self.open.as_mut() {
                    draft.absorb(other);
                }
            }
        }
        self
    }

    fn finish(mut self) -> Vec<Draft> {
        self.closed.extend(self.open);
        self.closed
    }
}

/// Splits raw text into drafts without assigning ids or defaults.
#[must_use]
pub fn scan_drafts(text: &str) -> Vec<Draft> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .fold(Scan::default(), Scan::feed)
        .finish()
}

/// Parses freeform text into questions belonging to `category_id`.
#[must_use]
pub fn parse(text: &str, category_id: &CategoryId) -> Vec<Question> {
    scan_drafts(text)
        .into_iter()
        .filter_map(|draft| draft.finalize(category_id))
        .collect()
}

/// Option text with its leading letter marker removed, for display.
#[must_use]
pub fn option_body(option: &str) -> &str {
    match OPTION_START.find(option) {
        Some(m) => option[m.end()..].trim(),
        None => option.trim(),
    }
}
