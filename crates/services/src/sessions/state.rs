use std::time::Duration;

use quiz_core::model::{AnswerRecord, Difficulty, Question, QuestionId, QuizId, SessionId};

use crate::api::{CheckAnswerRequest, CheckAnswerResponse};

//
// ─── TOKENS ────────────────────────────────────────────────────────────────────
//

/// Addresses an asynchronous completion to one question of one session.
///
/// Anything that arrives with a token not matching the live session and
/// question is stale and gets dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepToken {
    pub session: SessionId,
    pub index: usize,
}

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Correctness feedback returned by the backend for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub correct_option: String,
    pub correct: bool,
    pub score_earned: i64,
    pub time_taken_secs: i64,
}

impl From<CheckAnswerResponse> for Feedback {
    fn from(resp: CheckAnswerResponse) -> Self {
        Self {
            correct_option: resp.correct_answer,
            correct: resp.correct,
            score_earned: resp.score_earned,
            time_taken_secs: resp.time_taken_seconds,
        }
    }
}

/// What the feedback window shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The check call has not come back yet.
    Pending,
    Confirmed(Feedback),
    /// The check call failed; nothing is highlighted.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Presenting { index: usize },
    AwaitingFeedback { index: usize, verdict: Verdict },
    Submitting,
    Completed { score: i64 },
    Faulted { message: String },
}

/// Discriminant of [`SessionPhase`] for callers that only branch on the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTag {
    Loading,
    Presenting,
    AwaitingFeedback,
    Submitting,
    Completed,
    Faulted,
}

impl SessionPhase {
    #[must_use]
    pub fn tag(&self) -> PhaseTag {
        match self {
            SessionPhase::Loading => PhaseTag::Loading,
            SessionPhase::Presenting { .. } => PhaseTag::Presenting,
            SessionPhase::AwaitingFeedback { .. } => PhaseTag::AwaitingFeedback,
            SessionPhase::Submitting => PhaseTag::Submitting,
            SessionPhase::Completed { .. } => PhaseTag::Completed,
            SessionPhase::Faulted { .. } => PhaseTag::Faulted,
        }
    }

    /// Index of the question on screen, if any.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            SessionPhase::Presenting { index } | SessionPhase::AwaitingFeedback { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionPhase::Completed { .. } | SessionPhase::Faulted { .. }
        )
    }
}

//
// ─── EFFECTS ───────────────────────────────────────────────────────────────────
//

/// Work the session asks its driver to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEffect {
    FetchQuestions {
        session: SessionId,
        quiz_id: QuizId,
    },
    /// Replace any running ticker with one addressed to `token`.
    StartTicker(StepToken),
    StopTicker,
    CheckAnswer {
        token: StepToken,
        quiz_id: QuizId,
        question_id: QuestionId,
        request: CheckAnswerRequest,
        difficulty: Difficulty,
    },
    /// Report `feedback_elapsed(token)` after `delay`.
    ScheduleFeedbackEnd { token: StepToken, delay: Duration },
    SubmitQuiz {
        session: SessionId,
        quiz_id: QuizId,
        answers: Vec<AnswerRecord>,
        difficulty: Difficulty,
    },
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// How an option should be highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Plain,
    Selected,
    Correct,
    WrongSelected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub label: String,
    pub image_url: Option<String>,
    pub mark: OptionMark,
}

/// Everything a presentation layer needs to draw the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session: SessionId,
    pub quiz_id: QuizId,
    pub difficulty: Difficulty,
    pub phase: SessionPhase,
    pub index: Option<usize>,
    pub total: usize,
    pub question: Option<Question>,
    pub options: Vec<OptionView>,
    pub selection: Option<String>,
    pub time_remaining: u32,
    pub time_budget: u32,
    pub time_ratio: f32,
    pub answered: usize,
    pub load_error: Option<String>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn tag(&self) -> PhaseTag {
        self.phase.tag()
    }

    #[must_use]
    pub fn feedback_showing(&self) -> bool {
        matches!(self.phase, SessionPhase::AwaitingFeedback { .. })
    }

    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        match &self.phase {
            SessionPhase::AwaitingFeedback {
                verdict: Verdict::Confirmed(feedback),
                ..
            } => Some(feedback),
            _ => None,
        }
    }

    #[must_use]
    pub fn score(&self) -> Option<i64> {
        match self.phase {
            SessionPhase::Completed { score } => Some(score),
            _ => None,
        }
    }

    /// Whether a manual "next" would be accepted right now.
    #[must_use]
    pub fn can_advance(&self) -> bool {
        matches!(self.phase, SessionPhase::Presenting { .. }) && self.selection.is_some()
    }
}
