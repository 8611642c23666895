use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::CategoryId;

/// Id of the demo category seeded into a fresh install.
pub const DEFAULT_CATEGORY_ID: &str = "default";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CategoryError {
    #[error("category name cannot be empty")]
    EmptyName,
}

/// A named bucket of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Creates a category with a trimmed, non-empty name.
    ///
    /// # Errors
    ///
    /// Returns `CategoryError::EmptyName` if the name is blank.
    pub fn new(id: CategoryId, name: impl Into<String>) -> Result<Self, CategoryError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(CategoryError::EmptyName);
        }
        Ok(Self { id, name })
    }

    /// The pre-seeded demo category.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            id: CategoryId::new(DEFAULT_CATEGORY_ID),
            name: "演示题库".to_owned(),
        }
    }
}
