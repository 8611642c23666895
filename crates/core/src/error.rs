use thiserror::Error;

use crate::model::{CategoryError, ParseIdError, SnapshotError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
