use std::sync::Arc;

use quiz_core::model::{OptionKind, QuestionId, Quiz, QuizDraft, QuizId, QuizOption, QuestionDraft};
use tracing::info;

use crate::api::QuizCatalogApi;
use crate::error::CatalogError;

/// Raw admin input for a new question, validated before it is sent.
#[derive(Debug, Clone, Default)]
pub struct NewQuestion {
    pub text: String,
    pub option_kind: OptionKind,
    pub options: Vec<QuizOption>,
    pub correct_answer: String,
    pub audio_url: Option<String>,
}

/// Quiz listing plus admin authoring calls.
#[derive(Clone)]
pub struct CatalogService {
    api: Arc<dyn QuizCatalogApi>,
}

impl CatalogService {
    #[must_use]
    pub fn new(api: Arc<dyn QuizCatalogApi>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Api` if the backend call fails.
    pub async fn list_quizzes(&self) -> Result<Vec<Quiz>, CatalogError> {
        Ok(self.api.list_quizzes().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Draft` for a blank title, `CatalogError::Api` for
    /// backend failures.
    pub async fn create_quiz(&self, title: &str) -> Result<Quiz, CatalogError> {
        let draft = QuizDraft::new(title)?;
        let quiz = self.api.create_quiz(&draft).await?;
        info!(quiz_id = %quiz.id(), title = quiz.title(), "created quiz");
        Ok(quiz)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Draft` when the input fails validation (nothing is
    /// sent in that case), `CatalogError::Api` for backend failures.
    pub async fn add_question(
        &self,
        quiz_id: QuizId,
        input: NewQuestion,
    ) -> Result<QuestionId, CatalogError> {
        let draft = QuestionDraft::validate(
            &input.text,
            input.option_kind,
            input.options,
            &input.correct_answer,
            input.audio_url.as_deref(),
        )?;
        let created = self.api.add_question(quiz_id, &draft).await?;
        info!(%quiz_id, question_id = %created.id, "added question");
        Ok(created.id)
    }
}
