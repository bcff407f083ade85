use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::QuizId;
use crate::model::question::{OptionKind, QuizOption};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizDraftError {
    #[error("quiz title is required")]
    EmptyTitle,

    #[error("question text is required")]
    EmptyText,

    #[error("please provide at least two options")]
    TooFewOptions,

    #[error("option label {0:?} appears more than once")]
    DuplicateLabel(String),

    #[error("correct answer {0:?} is not one of the options")]
    UnknownCorrectAnswer(String),

    #[error("image questions need an image url for option {0:?}")]
    MissingImage(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A quiz as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    id: QuizId,
    title: String,
}

impl Quiz {
    #[must_use]
    pub fn new(id: QuizId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Payload for creating a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizDraft {
    title: String,
}

impl QuizDraft {
    /// # Errors
    ///
    /// Returns `QuizDraftError::EmptyTitle` if the title is blank.
    pub fn new(title: impl Into<String>) -> Result<Self, QuizDraftError> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(QuizDraftError::EmptyTitle);
        }
        Ok(Self {
            title: trimmed.to_string(),
        })
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

//
// ─── QUESTION DRAFT ────────────────────────────────────────────────────────────
//

/// Payload for adding a question to an existing quiz.
///
/// Built through [`QuestionDraft::validate`] so every draft that reaches the
/// backend has trimmed text, at least two distinct options and a correct
/// answer drawn from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    text: String,
    audio_url: Option<String>,
    option_type: OptionKind,
    correct_answer: String,
    options: Vec<QuizOption>,
}

impl QuestionDraft {
    /// Validate raw admin input.
    ///
    /// Blank options (no label and no image) are dropped before counting.
    ///
    /// # Errors
    ///
    /// Returns `QuizDraftError` describing the first problem found.
    pub fn validate(
        text: &str,
        option_kind: OptionKind,
        options: Vec<QuizOption>,
        correct_answer: &str,
        audio_url: Option<&str>,
    ) -> Result<Self, QuizDraftError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(QuizDraftError::EmptyText);
        }

        let options: Vec<QuizOption> = options
            .into_iter()
            .map(|opt| {
                let label = opt.label().trim().to_string();
                match opt.image_url().map(str::trim).filter(|url| !url.is_empty()) {
                    Some(url) => QuizOption::image(label, url),
                    None => QuizOption::text(label),
                }
            })
            .filter(|opt| !opt.label().is_empty() || opt.image_url().is_some())
            .collect();
        if options.len() < 2 {
            return Err(QuizDraftError::TooFewOptions);
        }

        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.label()) {
                return Err(QuizDraftError::DuplicateLabel(option.label().to_string()));
            }
            if let Some(url) = option.image_url() {
                parse_url(url)?;
            } else if option_kind == OptionKind::Image {
                return Err(QuizDraftError::MissingImage(option.label().to_string()));
            }
        }

        let correct_answer = correct_answer.trim();
        if !options.iter().any(|opt| opt.label() == correct_answer) {
            return Err(QuizDraftError::UnknownCorrectAnswer(correct_answer.to_string()));
        }

        let audio_url = match audio_url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => {
                parse_url(url)?;
                Some(url.to_string())
            }
            None => None,
        };

        Ok(Self {
            text: text.to_string(),
            audio_url,
            option_type: option_kind,
            correct_answer: correct_answer.to_string(),
            options,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref()
    }
}

fn parse_url(raw: &str) -> Result<Url, QuizDraftError> {
    Url::parse(raw).map_err(|_| QuizDraftError::InvalidUrl(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_options(labels: &[&str]) -> Vec<QuizOption> {
        labels.iter().map(|l| QuizOption::text(*l)).collect()
    }

    #[test]
    fn quiz_draft_trims_title() {
        assert_eq!(QuizDraft::new("  Movies ").unwrap().title(), "Movies");
        assert_eq!(QuizDraft::new("   "), Err(QuizDraftError::EmptyTitle));
    }

    #[test]
    fn question_draft_drops_blank_options() {
        let draft = QuestionDraft::validate(
            " Capital of France? ",
            OptionKind::Text,
            text_options(&["Paris", " ", "Rome"]),
            "Paris",
            Some(""),
        )
        .unwrap();
        assert_eq!(draft.text(), "Capital of France?");
        assert_eq!(draft.options().len(), 2);
        assert_eq!(draft.audio_url(), None);
    }

    #[test]
    fn question_draft_requires_known_correct_answer() {
        let err = QuestionDraft::validate(
            "Q",
            OptionKind::Text,
            text_options(&["A", "B"]),
            "C",
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuizDraftError::UnknownCorrectAnswer("C".into()));
    }

    #[test]
    fn question_draft_rejects_duplicates_and_bad_urls() {
        assert_eq!(
            QuestionDraft::validate("Q", OptionKind::Text, text_options(&["A", "A"]), "A", None),
            Err(QuizDraftError::DuplicateLabel("A".into()))
        );
        assert!(matches!(
            QuestionDraft::validate(
                "Q",
                OptionKind::Text,
                text_options(&["A", "B"]),
                "A",
                Some("not a url"),
            ),
            Err(QuizDraftError::InvalidUrl(_))
        ));
    }

    #[test]
    fn image_questions_need_images() {
        let err = QuestionDraft::validate(
            "Q",
            OptionKind::Image,
            vec![
                QuizOption::image("A", "https://cdn.example/a.png"),
                QuizOption::text("B"),
            ],
            "A",
            None,
        )
        .unwrap_err();
        assert_eq!(err, QuizDraftError::MissingImage("B".into()));
    }

    #[test]
    fn question_draft_serializes_camel_case() {
        let draft = QuestionDraft::validate(
            "Q",
            OptionKind::Text,
            text_options(&["A", "B"]),
            "B",
            Some("https://cdn.example/a.mp3"),
        )
        .unwrap();
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["optionType"], "TEXT");
        assert_eq!(json["correctAnswer"], "B");
        assert_eq!(json["audioUrl"], "https://cdn.example/a.mp3");
        assert_eq!(json["options"][0], serde_json::json!({"label": "A"}));
    }
}
