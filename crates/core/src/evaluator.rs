//! Answer checking.
//!
//! Judgment questions compare through two synonym sets. Every other type is
//! compared after reducing both sides to uppercase A–Z letters and CJK
//! ideographs, which makes `"A"`, `"a "` and `"A、"` equal. For essay answers
//! this is a lossy string match and only advisory.

use crate::model::{Question, QuestionType};

const TRUE_SET: [&str; 6] = ["对", "正确", "T", "TRUE", "√", "A"];
const FALSE_SET: [&str; 6] = ["错", "错误", "F", "FALSE", "×", "B"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    True,
    False,
}

fn judgment_verdict(normalized: &str) -> Option<Verdict> {
    if TRUE_SET.contains(&normalized) {
        Some(Verdict::True)
    } else if FALSE_SET.contains(&normalized) {
        Some(Verdict::False)
    } else {
        None
    }
}

/// Returns true when `user_answer` matches the question's reference answer.
#[must_use]
pub fn is_correct(question: &Question, user_answer: &str) -> bool {
    match question.question_type {
        QuestionType::Judgment => judgment_matches(user_answer, &question.answer),
        _ => comparable(user_answer) == comparable(&question.answer),
    }
}

fn judgment_matches(user: &str, reference: &str) -> bool {
    let user = user.trim().to_uppercase();
    let reference = reference.trim().to_uppercase();
    match (judgment_verdict(&user), judgment_verdict(&reference)) {
        (Some(a), Some(b)) if a == b => true,
        _ => user == reference,
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Uppercases and keeps only A–Z and CJK ideographs.
#[must_use]
pub fn comparable(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_ascii_uppercase() || is_cjk_ideograph(*c))
        .collect()
}

/// Whether the option at `index` is part of the reference answer.
///
/// Drives per-option coloring once an answer is revealed.
#[must_use]
pub fn option_is_correct(question: &Question, index: usize) -> bool {
    let Some(letter) = Question::option_letter(index) else {
        return false;
    };
    question
        .answer
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| ('A'..='F').contains(c))
        .any(|c| c == letter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CategoryId, QuestionId};

    fn question(question_type: QuestionType, answer: &str) -> Question {
        Question {
            id: QuestionId::new("q"),
            content: "Q".into(),
            options: Vec::new(),
            answer: answer.into(),
            question_type,
            category_id: CategoryId::new("c"),
            explanation: None,
        }
    }

    #[test]
    fn judgment_synonyms_match_across_sets() {
        let q = question(QuestionType::Judgment, "错");
        assert!(is_correct(&q, "×"));
        assert!(is_correct(&q, "B"));
        assert!(is_correct(&q, "false"));
        assert!(!is_correct(&q, "对"));
    }

    #[test]
    fn judgment_falls_back_to_case_insensitive_equality() {
        let q = question(QuestionType::Judgment, "Yes");
        assert!(is_correct(&q, " yes "));
        assert!(!is_correct(&q, "no"));
    }

    #[test]
    fn option_letters_ignore_case_and_punctuation() {
        let q = question(QuestionType::Single, "A、");
        assert!(is_correct(&q, "A"));
        assert!(is_correct(&q, "a "));
        assert!(!is_correct(&q, "B"));
    }

    #[test]
    fn multiple_requires_same_letter_sequence() {
        let q = question(QuestionType::Multiple, "A, B, D");
        assert!(is_correct(&q, "ABD"));
        assert!(!is_correct(&q, "AB"));
    }

    #[test]
    fn fill_compares_chinese_text() {
        let q = question(QuestionType::Fill, "光合作用");
        assert!(is_correct(&q, "光合作用。"));
        assert!(!is_correct(&q, "呼吸作用"));
    }

    #[test]
    fn comparable_strips_digits_and_symbols() {
        assert_eq!(comparable("H2O!"), "HO");
        assert_eq!(comparable("  ab 中文 "), "AB中文");
    }

    #[test]
    fn option_correctness_uses_reference_letters() {
        let q = question(QuestionType::Multiple, "abd");
        assert!(option_is_correct(&q, 0));
        assert!(option_is_correct(&q, 1));
        assert!(!option_is_correct(&q, 2));
        assert!(option_is_correct(&q, 3));
        assert!(!option_is_correct(&q, 30));
    }
}
