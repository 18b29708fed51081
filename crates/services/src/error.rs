//! Shared error types for the services crate.

use thiserror::Error;

use campus_core::grader::GradeError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressApi`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("remote API is not configured")]
    Disabled,
    #[error("remote API returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("remote API reported failure")]
    Rejected,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
