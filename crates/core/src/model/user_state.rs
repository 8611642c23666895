use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::exam::ExamRecord;
use crate::model::ids::{CategoryId, QuestionId};

//
// ─── WRONG LIST ────────────────────────────────────────────────────────────────
//

/// Per-question wrong-attempt counters. Entries are always positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WrongList(BTreeMap<QuestionId, u32>);

impl WrongList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrong-attempt count for a question, zero if absent.
    #[must_use]
    pub fn count(&self, id: &QuestionId) -> u32 {
        self.0.get(id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.0.contains_key(id)
    }

    /// Adds one wrong attempt, creating the entry if needed. Returns the new count.
    pub fn increment(&mut self, id: &QuestionId) -> u32 {
        let entry = self.0.entry(id.clone()).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }

    /// Drops the entry for a question. Returns true if one existed.
    pub fn remove(&mut self, id: &QuestionId) -> bool {
        self.0.remove(id).is_some()
    }

    /// Keeps only entries whose id satisfies the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&QuestionId) -> bool) {
        self.0.retain(|id, _| keep(id));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, u32)> {
        self.0.iter().map(|(id, count)| (id, *count))
    }
}

//
// ─── RANDOM PROGRESS ───────────────────────────────────────────────────────────
//

/// Per-category sets of question ids already served by submitted random exams.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RandomProgress(BTreeMap<CategoryId, BTreeSet<QuestionId>>);

impl RandomProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Served ids for a category, if any were recorded.
    #[must_use]
    pub fn served(&self, category: &CategoryId) -> Option<&BTreeSet<QuestionId>> {
        self.0.get(category)
    }

    #[must_use]
    pub fn is_served(&self, category: &CategoryId, id: &QuestionId) -> bool {
        self.0.get(category).is_some_and(|set| set.contains(id))
    }

    #[must_use]
    pub fn served_count(&self, category: &CategoryId) -> usize {
        self.0.get(category).map_or(0, BTreeSet::len)
    }

    /// Unions ids into the category's served set.
    pub fn mark_served<'a>(
        &mut self,
        category: &CategoryId,
        ids: impl IntoIterator<Item = &'a QuestionId>,
    ) {
        let set = self.0.entry(category.clone()).or_default();
        set.extend(ids.into_iter().cloned());
    }

    /// Clears the whole served set of a category.
    pub fn reset(&mut self, category: &CategoryId) {
        self.0.insert(category.clone(), BTreeSet::new());
    }

    /// Removes the category entry entirely.
    pub fn forget(&mut self, category: &CategoryId) {
        self.0.remove(category);
    }

    /// Drops one question id from every category.
    pub fn forget_question(&mut self, id: &QuestionId) {
        for set in self.0.values_mut() {
            set.remove(id);
        }
    }
}

//
// ─── EXTERNAL STATE CONTAINERS ─────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkFolder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub question_ids: Vec<QuestionId>,
}

impl BookmarkFolder {
    #[must_use]
    pub fn default_folder() -> Self {
        Self {
            id: "fav_default".to_owned(),
            name: "默认收藏".to_owned(),
            question_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFolder {
    pub id: String,
    pub name: String,
}

impl NoteFolder {
    #[must_use]
    pub fn default_folder() -> Self {
        Self {
            id: "default".to_owned(),
            name: "默认笔记本".to_owned(),
        }
    }
}

/// Rich-text note. The body is opaque HTML owned by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub folder_id: String,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Normal,
    Large,
    Xlarge,
}

fn default_bookmark_folders() -> Vec<BookmarkFolder> {
    vec![BookmarkFolder::default_folder()]
}

fn default_note_folders() -> Vec<NoteFolder> {
    vec![NoteFolder::default_folder()]
}

//
// ─── USER STATE ────────────────────────────────────────────────────────────────
//

/// Everything the user accumulates besides questions and categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default = "default_bookmark_folders")]
    pub bookmark_folders: Vec<BookmarkFolder>,
    #[serde(default)]
    pub wrong_list: WrongList,
    #[serde(default)]
    pub highlights: BTreeMap<QuestionId, u8>,
    #[serde(default)]
    pub exam_history: Vec<ExamRecord>,
    #[serde(default)]
    pub random_progress: RandomProgress,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default = "default_note_folders")]
    pub note_folders: Vec<NoteFolder>,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default)]
    pub font_size: FontSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_image: Option<String>,
}

impl Default for UserState {
    fn default() -> Self {
        Self {
            bookmark_folders: default_bookmark_folders(),
            wrong_list: WrongList::new(),
            highlights: BTreeMap::new(),
            exam_history: Vec::new(),
            random_progress: RandomProgress::new(),
            notes: Vec::new(),
            note_folders: default_note_folders(),
            theme: ThemeMode::default(),
            font_size: FontSize::default(),
            bg_image: None,
        }
    }
}

impl UserState {
    /// Removes every trace of a question id from the per-question maps.
    pub fn forget_question(&mut self, id: &QuestionId) {
        self.wrong_list.remove(id);
        self.highlights.remove(id);
        self.random_progress.forget_question(id);
        for folder in &mut self.bookmark_folders {
            folder.question_ids.retain(|q| q != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_list_increments_and_removes() {
        let mut list = WrongList::new();
        let id = QuestionId::new("q1");
        assert_eq!(list.increment(&id), 1);
        assert_eq!(list.increment(&id), 2);
        assert_eq!(list.count(&id), 2);
        assert!(list.remove(&id));
        assert!(!list.contains(&id));
        assert!(!list.remove(&id));
    }

    #[test]
    fn progress_union_is_idempotent() {
        let mut progress = RandomProgress::new();
        let cat = CategoryId::new("c");
        let ids = [QuestionId::new("a"), QuestionId::new("b")];
        progress.mark_served(&cat, &ids);
        progress.mark_served(&cat, &ids);
        assert_eq!(progress.served_count(&cat), 2);

        progress.reset(&cat);
        assert_eq!(progress.served_count(&cat), 0);
    }

    #[test]
    fn empty_document_gets_defaults() {
        let state: UserState = serde_json::from_str("{}").unwrap();
        assert_eq!(state.bookmark_folders, vec![BookmarkFolder::default_folder()]);
        assert_eq!(state.note_folders, vec![NoteFolder::default_folder()]);
        assert_eq!(state.theme, ThemeMode::Light);
        assert_eq!(state.font_size, FontSize::Normal);
    }

    #[test]
    fn forget_question_clears_all_maps() {
        let mut state = UserState::default();
        let id = QuestionId::new("q");
        state.wrong_list.increment(&id);
        state.highlights.insert(id.clone(), 2);
        state.random_progress.mark_served(&CategoryId::new("c"), [&id]);
        state.bookmark_folders[0].question_ids.push(id.clone());

        state.forget_question(&id);

        assert!(state.wrong_list.is_empty());
        assert!(state.highlights.is_empty());
        assert!(!state.random_progress.is_served(&CategoryId::new("c"), &id));
        assert!(state.bookmark_folders[0].question_ids.is_empty());
    }
}
