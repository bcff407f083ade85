use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::time::Timestamp;

/// The finalised answer for one question.
///
/// An empty `selected_option` means the question was skipped or timed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    question_id: QuestionId,
    selected_option: String,
    served_at: Timestamp,
    answered_at: Timestamp,
}

impl AnswerRecord {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        selected_option: impl Into<String>,
        served_at: Timestamp,
        answered_at: Timestamp,
    ) -> Self {
        Self {
            question_id,
            selected_option: selected_option.into(),
            served_at,
            answered_at,
        }
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    #[must_use]
    pub fn selected_option(&self) -> &str {
        &self.selected_option
    }

    #[must_use]
    pub fn served_at(&self) -> Timestamp {
        self.served_at
    }

    #[must_use]
    pub fn answered_at(&self) -> Timestamp {
        self.answered_at
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.selected_option.is_empty()
    }
}
