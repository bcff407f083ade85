//! Contracts for the quiz backend and the types exchanged with it.

mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quiz_core::Timestamp;
use quiz_core::model::{
    AnswerRecord, Difficulty, Question, QuestionDraft, QuestionId, Quiz, QuizDraft, QuizId,
};

use crate::error::ApiError;

pub use http::{ApiConfig, HttpQuizClient};

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

/// Body of a per-question check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerRequest {
    pub selected_option: String,
    pub served_at: Timestamp,
    pub answered_at: Timestamp,
}

/// Backend verdict for a single question.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAnswerResponse {
    #[serde(default)]
    pub correct: bool,
    pub correct_answer: String,
    #[serde(default)]
    pub time_taken_seconds: i64,
    #[serde(default)]
    pub score_earned: i64,
}

/// Final result of a submitted quiz. The backend must answer with
/// `{"totalScore": n}`; any other shape is a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub total_score: i64,
}

/// Reply to `add_question`; only the assigned id is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CreatedQuestion {
    pub id: QuestionId,
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// The three capabilities a quiz session consumes.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// Ordered questions for a quiz. Called once per quiz selection.
    async fn fetch_questions(&self, quiz_id: QuizId) -> Result<Vec<Question>, ApiError>;

    /// Verdict for one resolved question.
    async fn check_answer(
        &self,
        quiz_id: QuizId,
        question_id: QuestionId,
        request: &CheckAnswerRequest,
        difficulty: Difficulty,
    ) -> Result<CheckAnswerResponse, ApiError>;

    /// Submit the full answer log once the last question resolves.
    async fn submit_quiz(
        &self,
        quiz_id: QuizId,
        answers: &[AnswerRecord],
        difficulty: Difficulty,
    ) -> Result<QuizResult, ApiError>;
}

/// Listing and admin operations.
#[async_trait]
pub trait QuizCatalogApi: Send + Sync {
    async fn list_quizzes(&self) -> Result<Vec<Quiz>, ApiError>;

    async fn create_quiz(&self, draft: &QuizDraft) -> Result<Quiz, ApiError>;

    async fn add_question(
        &self,
        quiz_id: QuizId,
        draft: &QuestionDraft,
    ) -> Result<CreatedQuestion, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::{fixed_after, fixed_now};

    #[test]
    fn check_request_uses_backend_field_names() {
        let request = CheckAnswerRequest {
            selected_option: "Paris".into(),
            served_at: fixed_now(),
            answered_at: fixed_after(2),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["selectedOption"], "Paris");
        assert_eq!(json["servedAt"], "2023-11-14T22:13:20.000Z");
        assert_eq!(json["answeredAt"], "2023-11-14T22:13:22.000Z");
    }

    #[test]
    fn check_response_tolerates_missing_extras() {
        let resp: CheckAnswerResponse =
            serde_json::from_str(r#"{"correctAnswer": "Paris"}"#).unwrap();
        assert_eq!(resp.correct_answer, "Paris");
        assert!(!resp.correct);
        assert_eq!(resp.score_earned, 0);
    }

    #[test]
    fn quiz_result_requires_total_score_object() {
        let ok: QuizResult = serde_json::from_str(r#"{"totalScore": 1200}"#).unwrap();
        assert_eq!(ok.total_score, 1200);
        assert!(serde_json::from_str::<QuizResult>("1200").is_err());
    }
}
