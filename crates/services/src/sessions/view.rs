use serde::Serialize;

use quiz_core::evaluator;
use quiz_core::model::{Question, QuestionId, QuestionType, WrongList};
use quiz_core::parser;

use super::service::QuizSession;

/// Display state of one answer choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionState {
    Neutral,
    Selected,
    /// Part of the reference answer, shown once answers are visible.
    Correct,
    /// Selected by the user but not part of the reference answer.
    Incorrect,
}

/// One selectable choice: a lettered option or a judgment button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    /// Value passed back to `record_answer` when the choice is picked.
    pub key: String,
    pub text: String,
    pub state: OptionState,
}

/// Presentation-agnostic snapshot of the current question.
///
/// No pre-formatted strings beyond what the domain already stores; a
/// front-end decides how to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub content: String,
    pub question_type: QuestionType,
    pub category_name: Option<String>,
    /// One-based position.
    pub position: usize,
    pub total: usize,
    pub choices: Vec<OptionView>,
    pub user_answer: Option<String>,
    pub show_answer: bool,
    /// Reference answer, present only while answers are visible.
    pub reference_answer: Option<String>,
    pub explanation: Option<String>,
    /// Set once answers are visible.
    pub is_correct: Option<bool>,
    pub wrong_count: u32,
}

/// Judgment questions are answered with these two values.
pub const JUDGMENT_CHOICES: [(&str, &str); 2] = [("正确", "√"), ("错误", "×")];

impl QuestionView {
    /// Builds the view of the session's current question.
    #[must_use]
    pub fn current(
        session: &QuizSession,
        wrong_list: &WrongList,
        category_name: Option<&str>,
    ) -> Option<Self> {
        let question = session.current_question()?;
        let show_answer = session.shows_answers();
        let user_answer = session.answer_for(&question.id).map(str::to_owned);

        Some(Self {
            id: question.id.clone(),
            content: question.content.clone(),
            question_type: question.question_type,
            category_name: category_name.map(str::to_owned),
            position: session.cursor() + 1,
            total: session.questions().len(),
            choices: choices(question, user_answer.as_deref(), show_answer),
            user_answer,
            show_answer,
            reference_answer: show_answer.then(|| question.answer.clone()),
            explanation: question.explanation.clone().filter(|_| show_answer),
            is_correct: show_answer.then(|| session.is_answer_correct(question)),
            wrong_count: wrong_list.count(&question.id),
        })
    }

    #[must_use]
    pub fn is_wrong_before(&self) -> bool {
        self.wrong_count > 0
    }
}

fn choices(question: &Question, user_answer: Option<&str>, show_answer: bool) -> Vec<OptionView> {
    let answer = user_answer.unwrap_or_default();
    match question.question_type {
        QuestionType::Single | QuestionType::Multiple => question
            .options
            .iter()
            .enumerate()
            .filter_map(|(idx, option)| {
                let letter = Question::option_letter(idx)?;
                let selected = if question.question_type == QuestionType::Multiple {
                    answer.contains(letter)
                } else {
                    answer.len() == 1 && answer.starts_with(letter)
                };
                let correct = show_answer && evaluator::option_is_correct(question, idx);
                Some(OptionView {
                    key: letter.to_string(),
                    text: parser::option_body(option).to_owned(),
                    state: option_state(selected, correct, show_answer),
                })
            })
            .collect(),
        QuestionType::Judgment => JUDGMENT_CHOICES
            .iter()
            .map(|(value, symbol)| {
                let correct = show_answer && evaluator::is_correct(question, value);
                OptionView {
                    key: (*value).to_owned(),
                    text: (*symbol).to_owned(),
                    state: option_state(answer == *value, correct, show_answer),
                }
            })
            .collect(),
        QuestionType::Fill | QuestionType::Essay => Vec::new(),
    }
}

fn option_state(selected: bool, correct: bool, show_answer: bool) -> OptionState {
    match (show_answer, correct, selected) {
        (true, true, _) => OptionState::Correct,
        (true, false, true) => OptionState::Incorrect,
        (false, _, true) => OptionState::Selected,
        _ => OptionState::Neutral,
    }
}
