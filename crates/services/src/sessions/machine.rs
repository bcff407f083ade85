use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use quiz_core::Timestamp;
use quiz_core::model::{AnswerRecord, Difficulty, Question, QuizId, SessionId};

use super::answers::AnswerLog;
use super::audio::{AudioPlayer, CueGuard};
use super::state::{
    Feedback, OptionMark, OptionView, SessionEffect, SessionPhase, SessionSnapshot, StepToken,
    Verdict,
};
use super::timer::{Countdown, TickOutcome};
use crate::api::{CheckAnswerRequest, CheckAnswerResponse, QuizResult};
use crate::error::{ApiError, SessionError};

/// How long the verdict stays on screen before the session moves on.
pub const FEEDBACK_WINDOW: Duration = Duration::from_millis(1_000);

/// One play-through of a quiz.
///
/// A synchronous state machine: every input is a method call carrying `now`
/// from the driver's clock, and every method returns the effects the driver
/// must run. The phase doubles as the re-entrancy guard, so a timeout that
/// lands after a manual "next" (or the reverse) finds the session already out
/// of `Presenting` and does nothing.
pub struct QuizSession {
    id: SessionId,
    quiz_id: QuizId,
    difficulty: Difficulty,
    questions: Vec<Question>,
    phase: SessionPhase,
    selection: Option<String>,
    answers: AnswerLog,
    countdown: Countdown,
    load_error: Option<String>,
    feedback_window: Duration,
    audio: Arc<dyn AudioPlayer>,
    cue: Option<CueGuard>,
}

impl QuizSession {
    #[must_use]
    pub fn new(
        id: SessionId,
        quiz_id: QuizId,
        difficulty: Difficulty,
        audio: Arc<dyn AudioPlayer>,
    ) -> Self {
        Self {
            id,
            quiz_id,
            difficulty,
            questions: Vec::new(),
            phase: SessionPhase::Loading,
            selection: None,
            answers: AnswerLog::new(),
            countdown: Countdown::new(difficulty.time_budget_secs()),
            load_error: None,
            feedback_window: FEEDBACK_WINDOW,
            audio,
            cue: None,
        }
    }

    #[must_use]
    pub fn with_feedback_window(mut self, window: Duration) -> Self {
        self.feedback_window = window;
        self
    }

    /// Effects that kick off the session: the question fetch.
    #[must_use]
    pub fn start(&self) -> Vec<SessionEffect> {
        info!(session = %self.id, quiz_id = %self.quiz_id, difficulty = %self.difficulty, "starting quiz session");
        vec![SessionEffect::FetchQuestions {
            session: self.id,
            quiz_id: self.quiz_id,
        }]
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.phase.index().and_then(|index| self.questions.get(index))
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerLog {
        &self.answers
    }

    #[must_use]
    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    #[must_use]
    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    #[must_use]
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn token(&self, index: usize) -> StepToken {
        StepToken {
            session: self.id,
            index,
        }
    }

    fn presenting_token(&self) -> Option<StepToken> {
        match self.phase {
            SessionPhase::Presenting { index } => Some(self.token(index)),
            _ => None,
        }
    }

    //
    // ─── INPUTS ────────────────────────────────────────────────────────────────
    //

    /// Question data arrived (or failed to).
    ///
    /// A failure, an empty quiz or an invalid question keeps the session in
    /// `Loading` with `load_error` set.
    pub fn questions_loaded(
        &mut self,
        session: SessionId,
        result: Result<Vec<Question>, ApiError>,
        now: Timestamp,
    ) -> Vec<SessionEffect> {
        if session != self.id || self.phase != SessionPhase::Loading {
            debug!(session = %session, live = %self.id, "ignoring stale question load");
            return Vec::new();
        }

        match validate_questions(result) {
            Ok(questions) => {
                info!(session = %self.id, count = questions.len(), "questions loaded");
                self.questions = questions;
                self.answers = AnswerLog::new();
                self.load_error = None;
                self.present(0, now)
            }
            Err(err) => {
                warn!(session = %self.id, error = %err, "could not load questions");
                self.load_error = Some(err.to_string());
                Vec::new()
            }
        }
    }

    /// Choose an option on the current question.
    ///
    /// Returns `false` (and changes nothing) outside `Presenting` or for a label
    /// the question does not offer.
    pub fn select(&mut self, label: &str) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        if self.presenting_token().is_none() || !question.has_option(label) {
            return false;
        }
        self.selection = Some(label.to_string());
        true
    }

    /// Manual "next". Needs a selection; otherwise a no-op.
    pub fn advance(&mut self, now: Timestamp) -> Vec<SessionEffect> {
        if self.presenting_token().is_none() || self.selection.is_none() {
            return Vec::new();
        }
        self.resolve(now)
    }

    /// One second passed on the ticker addressed to `token`.
    pub fn tick(&mut self, token: StepToken, now: Timestamp) -> Vec<SessionEffect> {
        if self.presenting_token() != Some(token) {
            return Vec::new();
        }
        match self.countdown.tick() {
            TickOutcome::Expired => {
                debug!(session = %self.id, index = token.index, "countdown expired");
                self.resolve(now)
            }
            TickOutcome::Running(_) | TickOutcome::Idle => Vec::new(),
        }
    }

    /// The check-answer call for `token` completed.
    pub fn answer_checked(
        &mut self,
        token: StepToken,
        result: Result<CheckAnswerResponse, ApiError>,
    ) -> Vec<SessionEffect> {
        if token.session != self.id {
            return Vec::new();
        }
        let SessionPhase::AwaitingFeedback { index, verdict } = &mut self.phase else {
            return Vec::new();
        };
        if *index != token.index || *verdict != Verdict::Pending {
            return Vec::new();
        }

        *verdict = match result {
            Ok(resp) => Verdict::Confirmed(Feedback::from(resp)),
            Err(err) => {
                warn!(session = %token.session, index = token.index, error = %err, "answer check failed; continuing without feedback");
                Verdict::Unavailable
            }
        };
        vec![SessionEffect::ScheduleFeedbackEnd {
            token,
            delay: self.feedback_window,
        }]
    }

    /// The feedback window for `token` closed.
    pub fn feedback_elapsed(&mut self, token: StepToken, now: Timestamp) -> Vec<SessionEffect> {
        if token.session != self.id {
            return Vec::new();
        }
        let SessionPhase::AwaitingFeedback { index, verdict } = &self.phase else {
            return Vec::new();
        };
        if *index != token.index || *verdict == Verdict::Pending {
            return Vec::new();
        }

        let next = token.index + 1;
        if next < self.questions.len() {
            return self.present(next, now);
        }

        self.cue = None;
        self.phase = SessionPhase::Submitting;
        debug!(session = %self.id, answers = self.answers.len(), "submitting quiz");
        vec![SessionEffect::SubmitQuiz {
            session: self.id,
            quiz_id: self.quiz_id,
            answers: self.answers.to_vec(),
            difficulty: self.difficulty,
        }]
    }

    /// The final submission for `session` completed.
    pub fn quiz_submitted(
        &mut self,
        session: SessionId,
        result: Result<QuizResult, ApiError>,
    ) -> Vec<SessionEffect> {
        if session != self.id || self.phase != SessionPhase::Submitting {
            return Vec::new();
        }
        self.phase = match result {
            Ok(result) => {
                info!(session = %self.id, score = result.total_score, "quiz completed");
                SessionPhase::Completed {
                    score: result.total_score,
                }
            }
            Err(err) => {
                error!(session = %self.id, error = %err, "quiz submission failed");
                SessionPhase::Faulted {
                    message: err.to_string(),
                }
            }
        };
        Vec::new()
    }

    /// The view is going away: silence the cue and stop the ticker.
    pub fn teardown(&mut self) -> Vec<SessionEffect> {
        self.cue = None;
        vec![SessionEffect::StopTicker]
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    fn present(&mut self, index: usize, now: Timestamp) -> Vec<SessionEffect> {
        self.selection = None;
        self.countdown.reset();
        self.phase = SessionPhase::Presenting { index };

        let mut audio_url = None;
        if let Some(question) = self.questions.get_mut(index) {
            question.mark_served(now);
            audio_url = question.audio_url().map(str::to_owned);
        }

        // The previous cue must be silent before the next one starts.
        self.cue = None;
        if let Some(url) = audio_url {
            self.cue = Some(CueGuard::start(Arc::clone(&self.audio), &url));
        }

        debug!(session = %self.id, index, budget = self.countdown.budget(), "presenting question");
        vec![SessionEffect::StartTicker(self.token(index))]
    }

    fn resolve(&mut self, now: Timestamp) -> Vec<SessionEffect> {
        let Some(token) = self.presenting_token() else {
            return Vec::new();
        };
        let Some(question) = self.questions.get(token.index) else {
            return Vec::new();
        };

        let question_id = question.id();
        let served_at = question.served_at().unwrap_or(now);
        let selected = self.selection.clone().unwrap_or_default();
        let record = AnswerRecord::new(question_id, selected.clone(), served_at, now);
        if let Err(err) = self.answers.push(record) {
            error!(session = %self.id, error = %err, "refusing to resolve question twice");
            return Vec::new();
        }

        self.phase = SessionPhase::AwaitingFeedback {
            index: token.index,
            verdict: Verdict::Pending,
        };
        debug!(session = %self.id, index = token.index, skipped = selected.is_empty(), "question resolved");

        vec![
            SessionEffect::StopTicker,
            SessionEffect::CheckAnswer {
                token,
                quiz_id: self.quiz_id,
                question_id,
                request: CheckAnswerRequest {
                    selected_option: selected,
                    served_at,
                    answered_at: now,
                },
                difficulty: self.difficulty,
            },
        ]
    }

    //
    // ─── OUTPUT ────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let question = self.current_question().cloned();
        let correct_option = match &self.phase {
            SessionPhase::AwaitingFeedback {
                verdict: Verdict::Confirmed(feedback),
                ..
            } => Some(feedback.correct_option.as_str()),
            _ => None,
        };
        let options = question
            .as_ref()
            .map(|q| {
                q.options()
                    .iter()
                    .map(|opt| {
                        let selected = self.selection.as_deref() == Some(opt.label());
                        let mark = match correct_option {
                            Some(correct) if opt.label() == correct => OptionMark::Correct,
                            Some(_) if selected => OptionMark::WrongSelected,
                            Some(_) => OptionMark::Plain,
                            None if selected => OptionMark::Selected,
                            None => OptionMark::Plain,
                        };
                        OptionView {
                            label: opt.label().to_string(),
                            image_url: opt.image_url().map(str::to_owned),
                            mark,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        SessionSnapshot {
            session: self.id,
            quiz_id: self.quiz_id,
            difficulty: self.difficulty,
            phase: self.phase.clone(),
            index: self.phase.index(),
            total: self.questions.len(),
            question,
            options,
            selection: self.selection.clone(),
            time_remaining: self.countdown.remaining(),
            time_budget: self.countdown.budget(),
            time_ratio: self.countdown.ratio(),
            answered: self.answers.len(),
            load_error: self.load_error.clone(),
        }
    }
}

fn validate_questions(
    result: Result<Vec<Question>, ApiError>,
) -> Result<Vec<Question>, SessionError> {
    let questions = result?;
    if questions.is_empty() {
        return Err(SessionError::Empty);
    }
    let mut seen = HashSet::new();
    for question in &questions {
        question.validate()?;
        if !seen.insert(question.id()) {
            return Err(SessionError::DuplicateQuestion(question.id()));
        }
    }
    Ok(questions)
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("quiz_id", &self.quiz_id)
            .field("difficulty", &self.difficulty)
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("answers_len", &self.answers.len())
            .field("remaining", &self.countdown.remaining())
            .field("cue", &self.cue)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
