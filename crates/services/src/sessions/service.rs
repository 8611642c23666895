use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use quiz_core::evaluator;
use quiz_core::model::{CategoryId, ExamMode, Question, QuestionId, QuestionType};

use super::advance::{AdvanceTimer, PendingAdvance};
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── KIND & STATE ──────────────────────────────────────────────────────────────
//

/// The three ways a question list can be worked through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Study,
    SequentialExam,
    RandomExam,
}

impl SessionKind {
    #[must_use]
    pub fn is_exam(self) -> bool {
        !matches!(self, SessionKind::Study)
    }

    /// History mode recorded for a submitted exam.
    #[must_use]
    pub fn exam_mode(self) -> Option<ExamMode> {
        match self {
            SessionKind::Study => None,
            SessionKind::SequentialExam => Some(ExamMode::Sequential),
            SessionKind::RandomExam => Some(ExamMode::Random),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Active,
    /// Terminal: answers are frozen and reference answers are shown.
    Submitted,
    /// Terminal: left without side effects.
    Discarded,
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// Scoring of a submitted exam. Computed once and cached on the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub kind: SessionKind,
    pub score: u32,
    pub total: u32,
    pub wrong_ids: Vec<QuestionId>,
    pub served_ids: Vec<QuestionId>,
    pub category_id: Option<CategoryId>,
}

/// Result of calling `submit`; `newly_submitted` is false on repeat calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    pub outcome: SubmissionOutcome,
    pub newly_submitted: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz run over a fixed, snapshotted list of questions.
///
/// Holds the cursor, the sparse answer map, the reveal flag and the single
/// pending-advance slot. Tracker side effects are not applied here; the
/// context applies them from the `SubmitResult` of the first `submit`.
pub struct QuizSession {
    title: String,
    kind: SessionKind,
    category_id: Option<CategoryId>,
    questions: Vec<Question>,
    cursor: usize,
    revealed: bool,
    answers: HashMap<QuestionId, String>,
    state: SessionState,
    advance: AdvanceTimer,
    outcome: Option<SubmissionOutcome>,
    started_at: DateTime<Utc>,
}

impl QuizSession {
    /// Start a session. Random exams are shuffled before storage.
    ///
    /// `category_id` is kept only for random exams, which are the only kind
    /// that feeds per-category progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `questions` is empty.
    pub fn start<R: Rng + ?Sized>(
        mut questions: Vec<Question>,
        title: impl Into<String>,
        kind: SessionKind,
        category_id: Option<CategoryId>,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }
        if kind == SessionKind::RandomExam {
            questions.shuffle(rng);
        }
        let category_id = category_id.filter(|_| kind == SessionKind::RandomExam);

        Ok(Self {
            title: title.into(),
            kind,
            category_id,
            questions,
            cursor: 0,
            revealed: false,
            answers: HashMap::new(),
            state: SessionState::Active,
            advance: AdvanceTimer::default(),
            outcome: None,
            started_at,
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    #[must_use]
    pub fn is_exam(&self) -> bool {
        self.kind.is_exam()
    }

    #[must_use]
    pub fn category_id(&self) -> Option<&CategoryId> {
        self.category_id.as_ref()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.state == SessionState::Submitted
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    #[must_use]
    pub fn answer_for(&self, id: &QuestionId) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn pending_advance(&self) -> Option<PendingAdvance> {
        self.advance.pending()
    }

    /// Reference answers are visible after a study reveal or once submitted.
    #[must_use]
    pub fn shows_answers(&self) -> bool {
        (!self.is_exam() && self.revealed) || self.is_submitted()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let answered = self
            .questions
            .iter()
            .filter(|q| self.answers.get(&q.id).is_some_and(|a| !a.trim().is_empty()))
            .count();
        SessionProgress {
            total: self.questions.len(),
            answered,
            position: self.cursor + 1,
            is_submitted: self.is_submitted(),
        }
    }

    fn accepts_input(&self) -> bool {
        self.state == SessionState::Active
    }

    //
    // ─── ANSWERS ───────────────────────────────────────────────────────────────
    //

    /// Record an answer for a question in this session.
    ///
    /// Multiple-choice answers toggle each given letter in or out of the stored
    /// answer, which stays sorted. Other types replace the stored answer. In
    /// study sessions a non-multiple answer reveals immediately.
    ///
    /// Returns false (and changes nothing) once the session is closed or when
    /// the id is not part of the session.
    pub fn record_answer(&mut self, id: &QuestionId, value: &str) -> bool {
        if !self.accepts_input() {
            return false;
        }
        let Some(question_type) = self
            .questions
            .iter()
            .find(|q| &q.id == id)
            .map(|q| q.question_type)
        else {
            return false;
        };

        if question_type == QuestionType::Multiple {
            let current = self.answers.remove(id).unwrap_or_default();
            self.answers.insert(id.clone(), toggle_letters(&current, value));
        } else {
            let value = value.trim();
            let value = if question_type == QuestionType::Single {
                value.to_ascii_uppercase()
            } else {
                value.to_owned()
            };
            self.answers.insert(id.clone(), value);
            if !self.is_exam() {
                self.revealed = true;
            }
        }
        true
    }

    /// Record an answer for the question under the cursor.
    pub fn answer_current(&mut self, value: &str) -> bool {
        let Some(id) = self.current_question().map(|q| q.id.clone()) else {
            return false;
        };
        self.record_answer(&id, value)
    }

    /// Show the reference answer for the current question.
    pub fn reveal(&mut self) -> bool {
        if !self.accepts_input() && !self.is_submitted() {
            return false;
        }
        self.revealed = true;
        true
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move forward now, cancelling any pending delayed advance.
    pub fn advance(&mut self) -> bool {
        self.advance.cancel();
        self.step_forward()
    }

    /// Schedule a forward move at `due_at`, replacing any pending one.
    pub fn schedule_advance(&mut self, due_at: DateTime<Utc>) -> bool {
        if self.state == SessionState::Discarded {
            return false;
        }
        if self.advance.schedule(due_at) {
            debug!(title = %self.title, "pending advance replaced");
        }
        true
    }

    /// Apply the pending advance if its deadline has passed.
    pub fn fire_due_advance(&mut self, now: DateTime<Utc>) -> bool {
        if self.advance.take_due(now) {
            return self.step_forward();
        }
        false
    }

    /// Move back one question. Also cancels a pending advance.
    pub fn retreat(&mut self) -> bool {
        self.advance.cancel();
        if self.state == SessionState::Discarded || self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.revealed = false;
        true
    }

    fn step_forward(&mut self) -> bool {
        if self.state == SessionState::Discarded || self.is_last() {
            return false;
        }
        self.cursor += 1;
        self.revealed = false;
        true
    }

    //
    // ─── TERMINAL TRANSITIONS ──────────────────────────────────────────────────
    //

    /// Score the exam and freeze it.
    ///
    /// Repeated calls return the cached outcome with `newly_submitted = false`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotExam` for study sessions and
    /// `SessionError::Closed` for discarded sessions.
    pub fn submit(&mut self) -> Result<SubmitResult, SessionError> {
        if !self.is_exam() {
            return Err(SessionError::NotExam);
        }
        match self.state {
            SessionState::Discarded => return Err(SessionError::Closed),
            SessionState::Submitted => {
                let outcome = self.outcome.clone().ok_or(SessionError::Closed)?;
                return Ok(SubmitResult {
                    outcome,
                    newly_submitted: false,
                });
            }
            SessionState::Active => {}
        }

        let outcome = self.score();
        self.advance.cancel();
        self.state = SessionState::Submitted;
        self.outcome = Some(outcome.clone());

        Ok(SubmitResult {
            outcome,
            newly_submitted: true,
        })
    }

    /// Whether the question's recorded answer is correct.
    ///
    /// An absent or blank answer only counts when the reference answer is unset too.
    #[must_use]
    pub fn is_answer_correct(&self, question: &Question) -> bool {
        match self.answers.get(&question.id).filter(|a| !a.trim().is_empty()) {
            Some(answer) => evaluator::is_correct(question, answer),
            None => question.answer_is_unset(),
        }
    }

    fn score(&self) -> SubmissionOutcome {
        let mut score = 0_u32;
        let mut wrong_ids = Vec::new();
        for question in &self.questions {
            if self.is_answer_correct(question) {
                score = score.saturating_add(1);
            } else {
                wrong_ids.push(question.id.clone());
            }
        }

        SubmissionOutcome {
            kind: self.kind,
            score,
            total: u32::try_from(self.questions.len()).unwrap_or(u32::MAX),
            wrong_ids,
            served_ids: self.questions.iter().map(|q| q.id.clone()).collect(),
            category_id: self.category_id.clone(),
        }
    }

    /// True when leaving would silently lose exam answers.
    #[must_use]
    pub fn needs_discard_confirmation(&self) -> bool {
        self.is_exam() && self.state == SessionState::Active
    }

    /// Leave the session without side effects.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ConfirmationRequired` for an unsubmitted exam
    /// unless `confirmed` is set.
    pub fn discard(&mut self, confirmed: bool) -> Result<(), SessionError> {
        if self.needs_discard_confirmation() && !confirmed {
            return Err(SessionError::ConfirmationRequired);
        }
        self.advance.cancel();
        self.state = SessionState::Discarded;
        Ok(())
    }
}

/// Toggles each letter of `value` in `current`, returning a sorted letter string.
///
/// Anything other than an ASCII letter is ignored.
fn toggle_letters(current: &str, value: &str) -> String {
    let mut letters: Vec<char> = current.chars().collect();
    for letter in value
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
    {
        if let Some(pos) = letters.iter().position(|c| *c == letter) {
            letters.remove(pos);
        } else {
            letters.push(letter);
        }
    }
    letters.sort_unstable();
    letters.into_iter().collect()
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("title", &self.title)
            .field("kind", &self.kind)
            .field("category_id", &self.category_id)
            .field("questions_len", &self.questions.len())
            .field("cursor", &self.cursor)
            .field("answers_len", &self.answers.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::UNSET_ANSWER;
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn q(id: &str, t: QuestionType, answer: &str) -> Question {
        let options = if t.has_options() {
            vec!["A. x".into(), "B. y".into(), "C. z".into()]
        } else {
            Vec::new()
        };
        Question {
            id: QuestionId::new(id),
            content: format!("Q{id}"),
            options,
            answer: answer.into(),
            question_type: t,
            category_id: CategoryId::new("c"),
            explanation: None,
        }
    }

    fn start(kind: SessionKind, questions: Vec<Question>) -> QuizSession {
        let mut rng = StdRng::seed_from_u64(7);
        QuizSession::start(
            questions,
            "T",
            kind,
            Some(CategoryId::new("c")),
            fixed_now(),
            &mut rng,
        )
        .unwrap()
    }

    fn mixed() -> Vec<Question> {
        vec![
            q("1", QuestionType::Single, "A"),
            q("2", QuestionType::Multiple, "AC"),
            q("3", QuestionType::Judgment, "错"),
        ]
    }

    #[test]
    fn empty_list_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = QuizSession::start(
            Vec::new(),
            "T",
            SessionKind::Study,
            None,
            fixed_now(),
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(err, SessionError::Empty);
    }

    #[test]
    fn category_is_kept_only_for_random_exams() {
        assert!(start(SessionKind::SequentialExam, mixed()).category_id().is_none());
        assert!(start(SessionKind::RandomExam, mixed()).category_id().is_some());
    }

    #[test]
    fn random_exam_keeps_same_questions() {
        let session = start(SessionKind::RandomExam, mixed());
        let mut ids: Vec<_> = session.questions().iter().map(|q| q.id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec![QuestionId::new("1"), QuestionId::new("2"), QuestionId::new("3")]);
    }

    #[test]
    fn study_answer_reveals_immediately_except_multiple() {
        let mut session = start(SessionKind::Study, mixed());
        assert!(session.answer_current("B"));
        assert!(session.is_revealed());
        assert!(session.shows_answers());

        session.advance();
        assert!(!session.is_revealed());
        session.answer_current("A");
        assert!(!session.is_revealed());
        session.reveal();
        assert!(session.is_revealed());
    }

    #[test]
    fn exam_answers_do_not_reveal() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        session.answer_current("A");
        assert!(!session.is_revealed());
        assert!(!session.shows_answers());
    }

    #[test]
    fn multiple_answers_toggle_and_stay_sorted() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        let id = QuestionId::new("2");
        session.record_answer(&id, "C");
        session.record_answer(&id, "A");
        assert_eq!(session.answer_for(&id), Some("AC"));
        session.record_answer(&id, "c");
        assert_eq!(session.answer_for(&id), Some("A"));
    }

    #[test]
    fn multiple_toggle_skips_separators() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        let id = QuestionId::new("2");
        session.record_answer(&id, "A, c");
        assert_eq!(session.answer_for(&id), Some("AC"));
        session.record_answer(&id, " a ");
        assert_eq!(session.answer_for(&id), Some("C"));
    }

    #[test]
    fn single_answer_is_stored_uppercase() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        session.record_answer(&QuestionId::new("1"), " a ");
        assert_eq!(session.answer_for(&QuestionId::new("1")), Some("A"));
    }

    #[test]
    fn unknown_question_id_is_ignored() {
        let mut session = start(SessionKind::Study, mixed());
        assert!(!session.record_answer(&QuestionId::new("nope"), "A"));
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut session = start(SessionKind::Study, mixed());
        assert!(!session.retreat());
        assert!(session.advance());
        assert!(session.advance());
        assert!(!session.advance());
        assert_eq!(session.cursor(), 2);
        assert!(session.retreat());
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn delayed_advance_is_debounced() {
        let mut session = start(SessionKind::Study, mixed());
        let now = fixed_now();
        session.schedule_advance(now + Duration::milliseconds(500));
        session.schedule_advance(now + Duration::milliseconds(800));

        assert!(!session.fire_due_advance(now + Duration::milliseconds(600)));
        assert_eq!(session.cursor(), 0);
        assert!(session.fire_due_advance(now + Duration::milliseconds(800)));
        assert_eq!(session.cursor(), 1);
        assert!(!session.fire_due_advance(now + Duration::milliseconds(2_000)));
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn retreat_cancels_pending_advance() {
        let mut session = start(SessionKind::Study, mixed());
        session.advance();
        session.schedule_advance(fixed_now() + Duration::milliseconds(100));
        session.retreat();
        assert!(session.pending_advance().is_none());
        assert!(!session.fire_due_advance(fixed_now() + Duration::seconds(1)));
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn submit_scores_every_question() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        session.record_answer(&QuestionId::new("1"), "A");
        session.record_answer(&QuestionId::new("2"), "A");
        session.record_answer(&QuestionId::new("3"), "×");

        let result = session.submit().unwrap();
        assert!(result.newly_submitted);
        assert_eq!(result.outcome.score, 2);
        assert_eq!(result.outcome.total, 3);
        assert_eq!(result.outcome.wrong_ids, vec![QuestionId::new("2")]);
        assert!(session.shows_answers());
    }

    #[test]
    fn repeat_submit_returns_same_outcome() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        session.record_answer(&QuestionId::new("1"), "A");
        let first = session.submit().unwrap();
        let second = session.submit().unwrap();
        assert!(!second.newly_submitted);
        assert_eq!(first.outcome, second.outcome);
    }

    #[test]
    fn answers_are_frozen_after_submit() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        session.submit().unwrap();
        assert!(!session.record_answer(&QuestionId::new("1"), "A"));
        assert_eq!(session.answer_for(&QuestionId::new("1")), None);
    }

    #[test]
    fn missing_answer_is_wrong_unless_reference_unset() {
        let mut session = start(
            SessionKind::SequentialExam,
            vec![
                q("1", QuestionType::Essay, UNSET_ANSWER),
                q("2", QuestionType::Fill, "away"),
            ],
        );
        let outcome = session.submit().unwrap().outcome;
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.wrong_ids, vec![QuestionId::new("2")]);
    }

    #[test]
    fn study_sessions_cannot_submit() {
        let mut session = start(SessionKind::Study, mixed());
        assert_eq!(session.submit().unwrap_err(), SessionError::NotExam);
    }

    #[test]
    fn discarding_unsubmitted_exam_needs_confirmation() {
        let mut session = start(SessionKind::RandomExam, mixed());
        assert_eq!(
            session.discard(false).unwrap_err(),
            SessionError::ConfirmationRequired
        );
        assert_eq!(session.state(), SessionState::Active);
        session.discard(true).unwrap();
        assert_eq!(session.state(), SessionState::Discarded);
        assert_eq!(session.submit().unwrap_err(), SessionError::Closed);
    }

    #[test]
    fn study_and_submitted_sessions_discard_freely() {
        let mut study = start(SessionKind::Study, mixed());
        study.discard(false).unwrap();

        let mut exam = start(SessionKind::SequentialExam, mixed());
        exam.submit().unwrap();
        exam.discard(false).unwrap();
    }

    #[test]
    fn progress_counts_answered_questions() {
        let mut session = start(SessionKind::SequentialExam, mixed());
        session.answer_current("A");
        let progress = session.progress();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.position, 1);
        assert!(!progress.is_submitted);
    }
}
