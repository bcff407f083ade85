#![forbid(unsafe_code)]

pub mod api;
pub mod catalog_service;
pub mod error;
pub mod sessions;

pub use quiz_core::Clock;

pub use api::{ApiConfig, HttpQuizClient, QuizApi, QuizCatalogApi};
pub use catalog_service::{CatalogService, NewQuestion};
pub use error::{ApiError, CatalogError, SessionError};

pub use sessions::{
    AudioError, AudioPlayer, PlayerCommand, PlayerHandle, PlayerSettings, QuizPlayer,
    QuizSession, SessionPhase, SessionSnapshot, SilentPlayer,
};
