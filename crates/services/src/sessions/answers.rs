use quiz_core::model::{AnswerRecord, QuestionId};

use crate::error::SessionError;

/// Append-only log of resolved questions, in resolution order.
///
/// The slice it exposes is exactly what gets submitted at the end of a quiz.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerLog {
    records: Vec<AnswerRecord>,
}

impl AnswerLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DuplicateAnswer` if the question already has one.
    pub fn push(&mut self, record: AnswerRecord) -> Result<&AnswerRecord, SessionError> {
        if self.contains(record.question_id()) {
            return Err(SessionError::DuplicateAnswer(record.question_id()));
        }
        let index = self.records.len();
        self.records.push(record);
        Ok(&self.records[index])
    }

    #[must_use]
    pub fn contains(&self, question_id: QuestionId) -> bool {
        self.records.iter().any(|r| r.question_id() == question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[AnswerRecord] {
        &self.records
    }

    #[must_use]
    pub fn last(&self) -> Option<&AnswerRecord> {
        self.records.last()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<AnswerRecord> {
        self.records.clone()
    }
}
