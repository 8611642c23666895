//! Wrong-answer bookkeeping over the persisted `WrongList`.

use serde::Serialize;

use quiz_core::model::{Category, CategoryId, Question, QuestionId, QuestionType, WrongList};

/// Wrong-question count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWrongCount {
    pub category_id: CategoryId,
    pub name: String,
    pub count: usize,
}

/// Wrong questions overall and grouped by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongStats {
    pub all_wrong: Vec<Question>,
    /// Only categories with at least one wrong question, in category order.
    pub by_category: Vec<CategoryWrongCount>,
}

impl WrongStats {
    #[must_use]
    pub fn collect(questions: &[Question], categories: &[Category], wrong: &WrongList) -> Self {
        let all_wrong: Vec<Question> = questions
            .iter()
            .filter(|q| wrong.contains(&q.id))
            .cloned()
            .collect();
        let by_category = categories
            .iter()
            .map(|cat| CategoryWrongCount {
                category_id: cat.id.clone(),
                name: cat.name.clone(),
                count: all_wrong.iter().filter(|q| q.category_id == cat.id).count(),
            })
            .filter(|c| c.count > 0)
            .collect();
        Self {
            all_wrong,
            by_category,
        }
    }

    #[must_use]
    pub fn in_category(&self, category: &CategoryId) -> Vec<Question> {
        self.all_wrong
            .iter()
            .filter(|q| &q.category_id == category)
            .cloned()
            .collect()
    }
}

/// Bumps the counter of every id in `wrong_ids`.
pub fn record(wrong: &mut WrongList, wrong_ids: &[QuestionId]) {
    for id in wrong_ids {
        wrong.increment(id);
    }
}

/// Drops one question from the wrong list. Returns true if it was there.
pub fn master(wrong: &mut WrongList, id: &QuestionId) -> bool {
    wrong.remove(id)
}

/// Drops every wrong entry of a category, optionally limited to one type.
///
/// Returns how many entries were removed.
pub fn clear(
    wrong: &mut WrongList,
    questions: &[Question],
    category: &CategoryId,
    question_type: Option<QuestionType>,
) -> usize {
    let before = wrong.len();
    let doomed: Vec<&QuestionId> = questions
        .iter()
        .filter(|q| &q.category_id == category)
        .filter(|q| question_type.is_none_or(|t| q.question_type == t))
        .map(|q| &q.id)
        .collect();
    wrong.retain(|id| !doomed.contains(&id));
    before - wrong.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, cat: &str, t: QuestionType) -> Question {
        Question {
            id: QuestionId::new(id),
            content: id.into(),
            options: Vec::new(),
            answer: "A".into(),
            question_type: t,
            category_id: CategoryId::new(cat),
            explanation: None,
        }
    }

    fn fixture() -> (Vec<Question>, Vec<Category>, WrongList) {
        let questions = vec![
            question("1", "a", QuestionType::Single),
            question("2", "a", QuestionType::Judgment),
            question("3", "b", QuestionType::Single),
            question("4", "b", QuestionType::Fill),
        ];
        let categories = vec![
            Category::new(CategoryId::new("a"), "Alpha").unwrap(),
            Category::new(CategoryId::new("b"), "Beta").unwrap(),
            Category::new(CategoryId::new("c"), "Gamma").unwrap(),
        ];
        let mut wrong = WrongList::new();
        record(
            &mut wrong,
            &[QuestionId::new("1"), QuestionId::new("2"), QuestionId::new("3")],
        );
        (questions, categories, wrong)
    }

    #[test]
    fn stats_group_by_category_and_skip_empty() {
        let (questions, categories, wrong) = fixture();
        let stats = WrongStats::collect(&questions, &categories, &wrong);

        assert_eq!(stats.all_wrong.len(), 3);
        let counts: Vec<_> = stats
            .by_category
            .iter()
            .map(|c| (c.name.as_str(), c.count))
            .collect();
        assert_eq!(counts, vec![("Alpha", 2), ("Beta", 1)]);
        assert_eq!(stats.in_category(&CategoryId::new("b")).len(), 1);
    }

    #[test]
    fn record_accumulates_counts() {
        let (_, _, mut wrong) = fixture();
        record(&mut wrong, &[QuestionId::new("1")]);
        assert_eq!(wrong.count(&QuestionId::new("1")), 2);
    }

    #[test]
    fn master_removes_single_entry() {
        let (_, _, mut wrong) = fixture();
        assert!(master(&mut wrong, &QuestionId::new("1")));
        assert!(!master(&mut wrong, &QuestionId::new("1")));
        assert_eq!(wrong.len(), 2);
    }

    #[test]
    fn clear_by_category_and_type() {
        let (questions, _, mut wrong) = fixture();
        let removed = clear(
            &mut wrong,
            &questions,
            &CategoryId::new("a"),
            Some(QuestionType::Judgment),
        );
        assert_eq!(removed, 1);
        assert!(wrong.contains(&QuestionId::new("1")));

        let removed = clear(&mut wrong, &questions, &CategoryId::new("a"), None);
        assert_eq!(removed, 1);
        assert_eq!(wrong.len(), 1);
    }
}
