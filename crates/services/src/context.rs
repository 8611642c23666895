use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info};

use quiz_core::Clock;
use quiz_core::model::{
    Category, CategoryId, ExamRecord, Question, QuestionId, QuestionType, Snapshot,
};
use quiz_core::parser;

use crate::error::QuizError;
use crate::mistakes::{self, WrongStats};
use crate::sessions::{
    DrawOutcome, QuestionView, QuizSession, RandomDraw, SessionKind, SubmitResult,
};
use crate::settings::QuizSettings;

//
// ─── REQUEST & RESULT TYPES ────────────────────────────────────────────────────
//

/// Where imported questions go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// Create a category with this name, or merge into one that already has it.
    NewCategory(String),
    Existing(CategoryId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub category_id: CategoryId,
    pub category_name: String,
    pub imported: usize,
    /// True when a new-category import landed in an existing category.
    pub merged: bool,
}

/// Questions a session can be built over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionScope {
    Library,
    Category(CategoryId),
}

/// One question type present in a list, with its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeGroup {
    pub question_type: QuestionType,
    pub label: &'static str,
    pub count: usize,
}

impl TypeGroup {
    /// Types present in `questions`, in canonical type order.
    #[must_use]
    pub fn collect(questions: &[Question]) -> Vec<Self> {
        QuestionType::ALL
            .iter()
            .map(|t| TypeGroup {
                question_type: *t,
                label: t.label(),
                count: questions.iter().filter(|q| q.question_type == *t).count(),
            })
            .filter(|g| g.count > 0)
            .collect()
    }
}

/// Result of asking for the next random exam of a category.
#[derive(Debug)]
pub enum RandomStart {
    Started(QuizSession),
    /// Nothing left to draw; `reset_progress` and `restart_random_exam` continue.
    Exhausted {
        category_id: CategoryId,
        category_name: String,
    },
}

/// Served versus total questions of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryProgress {
    pub category_id: CategoryId,
    pub name: String,
    pub served: usize,
    pub total: usize,
}

impl CategoryProgress {
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.served)
    }
}

pub const WRONG_ALL_TITLE: &str = "错题本 (全部)";
pub const SEARCH_TITLE: &str = "搜索结果";
pub const LIBRARY_TITLE: &str = "全库";
pub const FULL_MOCK_TITLE: &str = "全真模拟";

//
// ─── CONTEXT ───────────────────────────────────────────────────────────────────
//

/// Single owner of the question bank and all tracker state.
///
/// Every mutation goes through this type, in call order. It performs no I/O;
/// `QuizService` wraps it to persist after each change.
pub struct QuizContext {
    snapshot: Snapshot,
    clock: Clock,
    settings: QuizSettings,
    rng: StdRng,
}

impl QuizContext {
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            clock: Clock::default(),
            settings: QuizSettings::default(),
            rng: StdRng::from_os_rng(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: QuizSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Makes every shuffle reproducible.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.snapshot.categories
    }

    /// Questions of one category, in import order.
    #[must_use]
    pub fn questions_in(&self, category: &CategoryId) -> Vec<Question> {
        self.snapshot
            .questions
            .iter()
            .filter(|q| &q.category_id == category)
            .cloned()
            .collect()
    }

    fn require_category(&self, id: &CategoryId) -> Result<&Category, QuizError> {
        self.snapshot
            .category(id)
            .ok_or_else(|| QuizError::UnknownCategory(id.clone()))
    }

    //
    // ─── BANK EDITING ──────────────────────────────────────────────────────────
    //

    /// Parses `text` and appends the questions to the target category.
    ///
    /// Text is parsed before any category is created, so a failed import
    /// leaves the bank untouched.
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput`, `EmptyCategoryName`, `UnknownCategory` or
    /// `UnrecognizedFormat`; no state changes on error.
    pub fn import(&mut self, text: &str, target: ImportTarget) -> Result<ImportReport, QuizError> {
        if text.trim().is_empty() {
            return Err(QuizError::EmptyInput);
        }

        let (category_id, pending_category, merged) = match target {
            ImportTarget::NewCategory(name) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(QuizError::EmptyCategoryName);
                }
                match self.snapshot.categories.iter().find(|c| c.name == name) {
                    Some(existing) => (existing.id.clone(), None, true),
                    None => {
                        let category = Category::new(CategoryId::generate(), name)
                            .map_err(|_| QuizError::EmptyCategoryName)?;
                        (category.id.clone(), Some(category), false)
                    }
                }
            }
            ImportTarget::Existing(id) => {
                self.require_category(&id)?;
                (id, None, false)
            }
        };

        let questions = parser::parse(text, &category_id);
        if questions.is_empty() {
            return Err(QuizError::UnrecognizedFormat);
        }

        if let Some(category) = pending_category {
            self.snapshot.categories.push(category);
        }
        let category_name = self.require_category(&category_id)?.name.clone();
        let imported = questions.len();
        self.snapshot.questions.extend(questions);

        info!(category = %category_id, imported, merged, "questions imported");
        Ok(ImportReport {
            category_id,
            category_name,
            imported,
            merged,
        })
    }

    /// Removes a category with all its questions and their tracker entries.
    ///
    /// Returns how many questions were removed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` if the id does not exist.
    pub fn delete_category(&mut self, id: &CategoryId) -> Result<usize, QuizError> {
        self.require_category(id)?;

        let (doomed, kept): (Vec<Question>, Vec<Question>) = std::mem::take(&mut self.snapshot.questions)
            .into_iter()
            .partition(|q| &q.category_id == id);
        self.snapshot.questions = kept;
        self.snapshot.categories.retain(|c| &c.id != id);

        let state = &mut self.snapshot.user_state;
        for question in &doomed {
            state.forget_question(&question.id);
        }
        state.random_progress.forget(id);

        info!(category = %id, removed = doomed.len(), "category deleted");
        Ok(doomed.len())
    }

    /// Removes one question and every trace of it in the trackers.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownQuestion` if the id does not exist.
    pub fn delete_question(&mut self, id: &QuestionId) -> Result<Question, QuizError> {
        let index = self
            .snapshot
            .questions
            .iter()
            .position(|q| &q.id == id)
            .ok_or_else(|| QuizError::UnknownQuestion(id.clone()))?;
        let removed = self.snapshot.questions.remove(index);
        self.snapshot.user_state.forget_question(id);
        info!(question = %id, "question deleted");
        Ok(removed)
    }

    //
    // ─── SESSIONS ──────────────────────────────────────────────────────────────
    //

    /// Starts a session over an explicit list.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session(SessionError::Empty)` for an empty list.
    pub fn start_session(
        &mut self,
        questions: Vec<Question>,
        title: impl Into<String>,
        kind: SessionKind,
        category_id: Option<CategoryId>,
    ) -> Result<QuizSession, QuizError> {
        let session = QuizSession::start(
            questions,
            title,
            kind,
            category_id,
            self.clock.now(),
            &mut self.rng,
        )?;
        info!(
            title = session.title(),
            kind = ?session.kind(),
            questions = session.questions().len(),
            "session started"
        );
        Ok(session)
    }

    /// Questions in a scope, in import order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` for a missing category.
    pub fn scope_questions(&self, scope: &QuestionScope) -> Result<Vec<Question>, QuizError> {
        match scope {
            QuestionScope::Library => Ok(self.snapshot.questions.clone()),
            QuestionScope::Category(id) => {
                self.require_category(id)?;
                Ok(self.questions_in(id))
            }
        }
    }

    /// Types present in a scope, for picking a group.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` for a missing category.
    pub fn type_groups(&self, scope: &QuestionScope) -> Result<Vec<TypeGroup>, QuizError> {
        Ok(TypeGroup::collect(&self.scope_questions(scope)?))
    }

    fn scope_title(&self, scope: &QuestionScope) -> Result<String, QuizError> {
        match scope {
            QuestionScope::Library => Ok(LIBRARY_TITLE.to_owned()),
            QuestionScope::Category(id) => Ok(self.require_category(id)?.name.clone()),
        }
    }

    /// Starts a study or sequential session over a scope, optionally one type only.
    ///
    /// The title is `"<scope> - <type label>"` when a type is given.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory`, or `Session(Empty)` when nothing matches.
    pub fn start_grouped(
        &mut self,
        scope: &QuestionScope,
        question_type: Option<QuestionType>,
        kind: SessionKind,
    ) -> Result<QuizSession, QuizError> {
        let base = self.scope_title(scope)?;
        let mut questions = self.scope_questions(scope)?;
        let title = match question_type {
            Some(t) => {
                questions.retain(|q| q.question_type == t);
                format!("{base} - {}", t.label())
            }
            None => base,
        };
        self.start_session(questions, title, kind, None)
    }

    /// Moves forward using the configured delay; zero moves immediately.
    pub fn next(&self, session: &mut QuizSession) -> bool {
        match self.settings.advance_delay_ms() {
            0 => session.advance(),
            delay => session.schedule_advance(self.clock.deadline_after(delay)),
        }
    }

    /// Applies a delayed advance whose deadline has passed.
    pub fn tick(&self, session: &mut QuizSession) -> bool {
        session.fire_due_advance(self.clock.now())
    }

    //
    // ─── RANDOM EXAMS ──────────────────────────────────────────────────────────
    //

    /// Draws the next unserved batch of a category and starts a random exam.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory`, or `EmptyPool` when the category has no
    /// questions of the requested type.
    pub fn start_random_exam(
        &mut self,
        category: &CategoryId,
        type_filter: Option<QuestionType>,
    ) -> Result<RandomStart, QuizError> {
        let name = self.require_category(category)?.name.clone();
        let outcome = RandomDraw::new(category)
            .with_type_filter(type_filter)
            .with_batch_size(self.settings.random_batch_size())
            .draw(
                &self.snapshot.questions,
                &self.snapshot.user_state.random_progress,
                &mut self.rng,
            )?;

        match outcome {
            DrawOutcome::Exhausted => {
                debug!(category = %category, ?type_filter, "random pool exhausted");
                Ok(RandomStart::Exhausted {
                    category_id: category.clone(),
                    category_name: name,
                })
            }
            DrawOutcome::Batch {
                questions,
                available,
            } => {
                debug!(category = %category, available, drawn = questions.len(), "random batch drawn");
                let title = format!("{name} - 随机模考 (剩余{available}题)");
                self.start_session(
                    questions,
                    title,
                    SessionKind::RandomExam,
                    Some(category.clone()),
                )
                .map(RandomStart::Started)
            }
        }
    }

    /// Resets the whole category's progress, then starts a fresh random exam.
    ///
    /// # Errors
    ///
    /// Same as `start_random_exam`.
    pub fn restart_random_exam(
        &mut self,
        category: &CategoryId,
        type_filter: Option<QuestionType>,
    ) -> Result<QuizSession, QuizError> {
        let name = self.require_category(category)?.name.clone();
        let draw = RandomDraw::new(category)
            .with_type_filter(type_filter)
            .with_batch_size(self.settings.random_batch_size());
        if !self.snapshot.questions.iter().any(|q| draw.in_pool(q)) {
            return Err(QuizError::EmptyPool);
        }

        self.reset_progress(category)?;
        match draw.draw(
            &self.snapshot.questions,
            &self.snapshot.user_state.random_progress,
            &mut self.rng,
        )? {
            DrawOutcome::Batch { questions, .. } => self.start_session(
                questions,
                format!("{name} - 随机模考"),
                SessionKind::RandomExam,
                Some(category.clone()),
            ),
            DrawOutcome::Exhausted => Err(QuizError::EmptyPool),
        }
    }

    /// Clears every served id of a category, whatever type filter was in use.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` if the id does not exist.
    pub fn reset_progress(&mut self, category: &CategoryId) -> Result<(), QuizError> {
        self.require_category(category)?;
        self.snapshot.user_state.random_progress.reset(category);
        info!(category = %category, "random progress reset");
        Ok(())
    }

    /// A random exam over the whole library, capped at the batch size.
    ///
    /// Not tied to a category, so it never feeds progress.
    ///
    /// # Errors
    ///
    /// Returns `Session(Empty)` when the library is empty.
    pub fn start_full_mock_exam(&mut self) -> Result<QuizSession, QuizError> {
        let mut questions = self.snapshot.questions.clone();
        questions.shuffle(&mut self.rng);
        questions.truncate(self.settings.random_batch_size());
        self.start_session(questions, FULL_MOCK_TITLE, SessionKind::RandomExam, None)
    }

    /// Served versus total for one category.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` if the id does not exist.
    pub fn category_progress(&self, category: &CategoryId) -> Result<CategoryProgress, QuizError> {
        let name = self.require_category(category)?.name.clone();
        let progress = &self.snapshot.user_state.random_progress;
        let (mut served, mut total) = (0, 0);
        for question in self.snapshot.questions.iter().filter(|q| &q.category_id == category) {
            total += 1;
            if progress.is_served(category, &question.id) {
                served += 1;
            }
        }
        Ok(CategoryProgress {
            category_id: category.clone(),
            name,
            served,
            total,
        })
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// Submits an exam and applies tracker side effects the first time only.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Session` when the session cannot be submitted.
    pub fn submit(&mut self, session: &mut QuizSession) -> Result<SubmitResult, QuizError> {
        let result = session.submit()?;
        if !result.newly_submitted {
            return Ok(result);
        }

        let outcome = &result.outcome;
        let state = &mut self.snapshot.user_state;
        mistakes::record(&mut state.wrong_list, &outcome.wrong_ids);
        if let Some(category) = &outcome.category_id {
            state
                .random_progress
                .mark_served(category, outcome.served_ids.iter());
        }
        if let Some(mode) = outcome.kind.exam_mode() {
            state
                .exam_history
                .push(ExamRecord::new(self.clock.now(), outcome.score, outcome.total, mode));
        }

        info!(
            title = session.title(),
            score = outcome.score,
            total = outcome.total,
            wrong = outcome.wrong_ids.len(),
            "exam submitted"
        );
        Ok(result)
    }

    //
    // ─── MISTAKES ──────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn wrong_stats(&self) -> WrongStats {
        WrongStats::collect(
            &self.snapshot.questions,
            &self.snapshot.categories,
            &self.snapshot.user_state.wrong_list,
        )
    }

    /// Study session over wrong questions, all or one category.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCategory`, or `Session(Empty)` with no wrong questions.
    pub fn start_wrong_review(&mut self, category: Option<&CategoryId>) -> Result<QuizSession, QuizError> {
        let stats = self.wrong_stats();
        let (questions, title) = match category {
            Some(id) => {
                let name = self.require_category(id)?.name.clone();
                (stats.in_category(id), format!("错题本 - {name}"))
            }
            None => (stats.all_wrong, WRONG_ALL_TITLE.to_owned()),
        };
        self.start_session(questions, title, SessionKind::Study, None)
    }

    /// Marks a question as mastered, dropping it from the wrong list.
    pub fn master_question(&mut self, id: &QuestionId) -> bool {
        mistakes::master(&mut self.snapshot.user_state.wrong_list, id)
    }

    /// Clears wrong entries of a category, optionally one type only.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownCategory` if the id does not exist.
    pub fn clear_wrong(
        &mut self,
        category: &CategoryId,
        question_type: Option<QuestionType>,
    ) -> Result<usize, QuizError> {
        self.require_category(category)?;
        let removed = mistakes::clear(
            &mut self.snapshot.user_state.wrong_list,
            &self.snapshot.questions,
            category,
            question_type,
        );
        info!(category = %category, ?question_type, removed, "wrong entries cleared");
        Ok(removed)
    }

    //
    // ─── READ-ONLY VIEWS ───────────────────────────────────────────────────────
    //

    /// Questions whose content contains `query`. A blank query matches nothing.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Question> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.snapshot
            .questions
            .iter()
            .filter(|q| q.content.contains(query))
            .cloned()
            .collect()
    }

    /// Study session over search results.
    ///
    /// # Errors
    ///
    /// Returns `Session(Empty)` when nothing matches.
    pub fn start_search_study(&mut self, query: &str) -> Result<QuizSession, QuizError> {
        let questions = self.search(query);
        self.start_session(questions, SEARCH_TITLE, SessionKind::Study, None)
    }

    /// Submitted exams, oldest first.
    #[must_use]
    pub fn exam_history(&self) -> &[ExamRecord] {
        &self.snapshot.user_state.exam_history
    }

    /// Display state of the session's current question.
    #[must_use]
    pub fn view(&self, session: &QuizSession) -> Option<QuestionView> {
        let category_name = session
            .current_question()
            .and_then(|q| self.snapshot.category(&q.category_id))
            .map(|c| c.name.as_str());
        QuestionView::current(session, &self.snapshot.user_state.wrong_list, category_name)
    }
}
