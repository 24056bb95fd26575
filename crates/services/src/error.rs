//! Shared error types for the services crate.

use thiserror::Error;

use signplay_core::model::{DigitError, GameResultError, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by a `GestureClassifier`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClassifierError {
    #[error("classifier request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("classifier reply did not contain a prediction")]
    MissingPrediction,
    #[error(transparent)]
    InvalidDigit(#[from] DigitError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while grabbing and classifying one frame.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("no frame available: {0}")]
    NoFrame(String),
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
}

/// Errors emitted by a `ResultRecorder`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    #[error("save rejected with status {status}: {message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Stats(#[from] StatsError),
}

/// Errors emitted by `GameLoopService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GameError {
    #[error("answer already has every digit, check it first")]
    CaptureClosed,
    #[error("answer is missing digits")]
    AnswerIncomplete,
    #[error("answer already checked")]
    AlreadyChecked,
    #[error("no failed save to retry")]
    NothingToRetry,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    GameResult(#[from] GameResultError),
}

/// Errors emitted by `StatisticsService` and `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error("missing or invalid access token")]
    Unauthorized,
    #[error("user not found")]
    UnknownUser,
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    GameResult(#[from] GameResultError),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for StatsError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => StatsError::UnknownUser,
            other => StatsError::Storage(other),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
