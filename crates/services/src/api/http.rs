use std::env;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use quiz_core::model::{
    AnswerRecord, Difficulty, Question, QuestionDraft, QuestionId, Quiz, QuizDraft, QuizId,
};

use super::{
    CheckAnswerRequest, CheckAnswerResponse, CreatedQuestion, QuizApi, QuizCatalogApi, QuizResult,
};
use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Where the quiz backend lives and how to authenticate against it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            token: None,
        }
    }
}

impl ApiConfig {
    /// Reads `QUIZ_API_BASE_URL` and `QUIZ_API_TOKEN`.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("QUIZ_API_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let token = env::var("QUIZ_API_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self { base_url, token }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|value| !value.trim().is_empty());
        self
    }

    fn quizzes_url(&self) -> String {
        format!("{}/api/quizzes", self.base_url.trim_end_matches('/'))
    }
}

/// `reqwest`-backed client for the quiz REST API.
#[derive(Clone)]
pub struct HttpQuizClient {
    client: Client,
    config: ApiConfig,
}

impl HttpQuizClient {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidUrl` if the base url is not absolute http(s).
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let base = config.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(config.base_url));
        }
        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
        });
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
}

#[async_trait]
impl QuizApi for HttpQuizClient {
    async fn fetch_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, ApiError> {
        let url = format!("{}/{quiz_id}/questions", self.config.quizzes_url());
        debug!(%quiz_id, "fetching questions");
        let response = self.authorized(self.client.get(url)).send().await?;
        decode(response).await
    }

    async fn check_answer(
        &self,
        quiz_id: QuizId,
        question_id: QuestionId,
        request: &CheckAnswerRequest,
        difficulty: Difficulty,
    ) -> Result<CheckAnswerResponse, ApiError> {
        let url = format!(
            "{}/{quiz_id}/questions/{question_id}/check",
            self.config.quizzes_url()
        );
        debug!(%quiz_id, %question_id, "checking answer");
        let response = self
            .authorized(self.client.post(url))
            .query(&[("difficulty", difficulty.as_str())])
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        answers: &[AnswerRecord],
        difficulty: Difficulty,
    ) -> Result<QuizResult, ApiError> {
        let url = format!("{}/{quiz_id}/submit", self.config.quizzes_url());
        debug!(%quiz_id, answers = answers.len(), "submitting quiz");
        let response = self
            .authorized(self.client.post(url))
            .query(&[("difficulty", difficulty.as_str())])
            .json(answers)
            .send()
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl QuizCatalogApi for HttpQuizClient {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, ApiError> {
        let response = self
            .authorized(self.client.get(self.config.quizzes_url()))
            .send()
            .await?;
        decode(response).await
    }

    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, ApiError> {
        let response = self
            .authorized(self.client.post(self.config.quizzes_url()))
            .json(draft)
            .send()
            .await?;
        decode(response).await
    }

    async fn add_question(
        &self,
        quiz_id: QuizId,
        draft: &QuestionDraft,
    ) -> Result<CreatedQuestion, ApiError> {
        let url = format!("{}/{quiz_id}/questions", self.config.quizzes_url());
        let response = self
            .authorized(self.client.post(url))
            .json(draft)
            .send()
            .await?;
        decode(response).await
    }
}
