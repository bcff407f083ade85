use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::time::Timestamp;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {id} repeats option label {label:?}")]
    DuplicateLabel { id: QuestionId, label: String },
}

//
// ─── OPTIONS ───────────────────────────────────────────────────────────────────
//

/// How a question's options are presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionKind {
    #[default]
    Text,
    Image,
}

/// A selectable answer. The label doubles as the value sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawOption", rename_all = "camelCase")]
pub struct QuizOption {
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

// Older backends send options as bare strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Label(String),
    Full {
        label: String,
        #[serde(default, rename = "imageUrl")]
        image_url: Option<String>,
    },
}

impl From<RawOption> for QuizOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Label(label) => Self::text(label),
            RawOption::Full { label, image_url } => Self {
                label,
                image_url: image_url.filter(|url| !url.trim().is_empty()),
            },
        }
    }
}

impl QuizOption {
    #[must_use]
    pub fn text(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            image_url: None,
        }
    }

    #[must_use]
    pub fn image(label: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            image_url: Some(image_url.into()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

// The backend sends `null` for fields it never filled in.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A question as served to the player.
///
/// `served_at` is recorded by the client the first time the question is shown;
/// any stamp the backend attaches to the fetched batch is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    id: QuestionId,
    text: String,
    #[serde(default, rename = "optionType", deserialize_with = "null_as_default")]
    option_kind: OptionKind,
    #[serde(default, deserialize_with = "null_as_default")]
    options: Vec<QuizOption>,
    #[serde(default)]
    audio_url: Option<String>,
    #[serde(skip)]
    served_at: Option<Timestamp>,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, text: impl Into<String>, options: Vec<QuizOption>) -> Self {
        let option_kind = if options.iter().any(|opt| opt.image_url.is_some()) {
            OptionKind::Image
        } else {
            OptionKind::Text
        };
        Self {
            id,
            text: text.into(),
            option_kind,
            options,
            audio_url: None,
            served_at: None,
        }
    }

    #[must_use]
    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = Some(url.into());
        self
    }

    /// Check the invariants the session relies on.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if there are no options or a label repeats.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.options.is_empty() {
            return Err(QuestionError::NoOptions(self.id));
        }
        let mut seen = HashSet::new();
        for option in &self.options {
            if !seen.insert(option.label.as_str()) {
                return Err(QuestionError::DuplicateLabel {
                    id: self.id,
                    label: option.label.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn option_kind(&self) -> OptionKind {
        self.option_kind
    }

    #[must_use]
    pub fn options(&self) -> &[QuizOption] {
        &self.options
    }

    #[must_use]
    pub fn has_option(&self, label: &str) -> bool {
        self.options.iter().any(|opt| opt.label == label)
    }

    /// Audio cue URL, ignoring blank values.
    #[must_use]
    pub fn audio_url(&self) -> Option<&str> {
        self.audio_url.as_deref().filter(|url| !url.trim().is_empty())
    }

    #[must_use]
    pub fn served_at(&self) -> Option<Timestamp> {
        self.served_at
    }

    /// Stamp the first display. Later calls leave the original stamp in place.
    ///
    /// Returns `true` if this call recorded the stamp.
    pub fn mark_served(&mut self, at: Timestamp) -> bool {
        if self.served_at.is_some() {
            return false;
        }
        self.served_at = Some(at);
        true
    }
}
