//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, QuestionId, QuizDraftError};

/// Errors emitted by quiz backend clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("quiz backend returned status {status}")]
    Status { status: u16 },
    #[error("quiz backend response could not be decoded: {0}")]
    Decode(String),
    #[error("invalid quiz backend url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the quiz session subsystem.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz has no questions")]
    Empty,
    #[error("question {0} already has an answer")]
    DuplicateAnswer(QuestionId),
    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("session player has stopped")]
    PlayerClosed,
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error(transparent)]
    Draft(#[from] QuizDraftError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
