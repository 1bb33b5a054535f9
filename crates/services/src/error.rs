//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::ProgressError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the progress stores and the quiz controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no quiz session has been set up")]
    NoSession,
    #[error("quiz is not waiting for an answer")]
    NotAwaitingAnswer,
    #[error("quiz is not showing feedback")]
    NotAwaitingProceed,
    #[error("option {index} is out of range for {options} options")]
    InvalidSelection { index: usize, options: usize },
    #[error("answer kind does not match the current question")]
    WrongAnswerKind,
    #[error("set has {0} items, more than a session can track")]
    SetTooLarge(usize),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

/// Errors emitted while bootstrapping quiz services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
