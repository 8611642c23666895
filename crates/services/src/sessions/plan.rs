use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{CategoryId, Question, QuestionType, RandomProgress};

use crate::error::QuizError;
use crate::settings::DEFAULT_RANDOM_BATCH_SIZE;

/// Result of drawing a random-exam batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    Batch {
        questions: Vec<Question>,
        /// Unserved questions in the pool before this draw.
        available: usize,
    },
    /// Every question in the pool has been served; reset progress to continue.
    Exhausted,
}

impl DrawOutcome {
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, DrawOutcome::Exhausted)
    }
}

/// Picks a batch of not-yet-served questions from one category.
///
/// Drawing never marks anything as served; that happens only when the
/// resulting exam is submitted.
pub struct RandomDraw<'a> {
    category: &'a CategoryId,
    type_filter: Option<QuestionType>,
    batch_size: usize,
}

impl<'a> RandomDraw<'a> {
    #[must_use]
    pub fn new(category: &'a CategoryId) -> Self {
        Self {
            category,
            type_filter: None,
            batch_size: DEFAULT_RANDOM_BATCH_SIZE,
        }
    }

    /// Restrict the pool to a single question type.
    #[must_use]
    pub fn with_type_filter(mut self, filter: Option<QuestionType>) -> Self {
        self.type_filter = filter;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Whether a question belongs to the filtered pool.
    #[must_use]
    pub fn in_pool(&self, question: &Question) -> bool {
        &question.category_id == self.category
            && self.type_filter.is_none_or(|t| question.question_type == t)
    }

    /// Draw up to `batch_size` unserved questions via shuffle-and-take.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyPool` when the filtered pool has no questions at all.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        questions: &[Question],
        progress: &RandomProgress,
        rng: &mut R,
    ) -> Result<DrawOutcome, QuizError> {
        let mut pool_len = 0_usize;
        let mut available: Vec<&Question> = Vec::new();
        for question in questions.iter().filter(|q| self.in_pool(q)) {
            pool_len += 1;
            if !progress.is_served(self.category, &question.id) {
                available.push(question);
            }
        }

        if pool_len == 0 {
            return Err(QuizError::EmptyPool);
        }
        if available.is_empty() {
            return Ok(DrawOutcome::Exhausted);
        }

        let available_len = available.len();
        available.shuffle(rng);
        let batch = available
            .into_iter()
            .take(self.batch_size)
            .cloned()
            .collect();

        Ok(DrawOutcome::Batch {
            questions: batch,
            available: available_len,
        })
    }
}
