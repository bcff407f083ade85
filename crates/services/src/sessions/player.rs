use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::debug;

use quiz_core::Clock;
use quiz_core::model::{Difficulty, Question, QuizId, SessionId};

use super::audio::AudioPlayer;
use super::machine::{FEEDBACK_WINDOW, QuizSession};
use super::state::{SessionEffect, SessionSnapshot, StepToken};
use super::timer::Ticker;
use crate::api::{CheckAnswerResponse, QuizApi, QuizResult};
use crate::error::{ApiError, SessionError};

/// Timing knobs for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSettings {
    pub feedback_window: Duration,
    pub tick_interval: Duration,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            feedback_window: FEEDBACK_WINDOW,
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Intents accepted from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Begin a quiz, replacing any session in progress.
    Start {
        quiz_id: QuizId,
        difficulty: Difficulty,
    },
    Select(String),
    Advance,
    /// Leave the quiz view.
    Leave,
}

/// Completions fed back into the loop by tickers and network tasks.
#[derive(Debug)]
enum SessionEvent {
    QuestionsLoaded {
        session: SessionId,
        result: Result<Vec<Question>, ApiError>,
    },
    Tick(StepToken),
    AnswerChecked {
        token: StepToken,
        result: Result<CheckAnswerResponse, ApiError>,
    },
    FeedbackElapsed(StepToken),
    Submitted {
        session: SessionId,
        result: Result<QuizResult, ApiError>,
    },
}

/// Runs quiz sessions against a backend.
///
/// All commands and completions are handled one at a time by a single task,
/// so the session is never touched concurrently. Network calls are the only
/// work done off that task.
pub struct QuizPlayer {
    api: Arc<dyn QuizApi>,
    audio: Arc<dyn AudioPlayer>,
    clock: Clock,
    settings: PlayerSettings,
}

impl QuizPlayer {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>, audio: Arc<dyn AudioPlayer>) -> Self {
        Self {
            api,
            audio,
            clock: Clock::default(),
            settings: PlayerSettings::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: PlayerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Start the player loop on the current tokio runtime.
    #[must_use]
    pub fn spawn(self) -> PlayerHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(None);

        let state = PlayerLoop {
            api: self.api,
            audio: self.audio,
            clock: self.clock,
            settings: self.settings,
            next_id: SessionId::new(1),
            session: None,
            ticker: None,
            tasks: JoinSet::new(),
            events: events_tx,
            snapshots: snapshots_tx,
        };
        let task = tokio::spawn(state.run(commands_rx, events_rx));

        PlayerHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
            task,
        }
    }
}

/// Presentation-side handle to a running [`QuizPlayer`].
pub struct PlayerHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    snapshots: watch::Receiver<Option<SessionSnapshot>>,
    task: JoinHandle<()>,
}

impl PlayerHandle {
    /// # Errors
    ///
    /// Returns `SessionError::PlayerClosed` if the loop has stopped.
    pub fn send(&self, command: PlayerCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::PlayerClosed)
    }

    /// # Errors
    ///
    /// Returns `SessionError::PlayerClosed` if the loop has stopped.
    pub fn start(&self, quiz_id: QuizId, difficulty: Difficulty) -> Result<(), SessionError> {
        self.send(PlayerCommand::Start {
            quiz_id,
            difficulty,
        })
    }

    /// # Errors
    ///
    /// Returns `SessionError::PlayerClosed` if the loop has stopped.
    pub fn select(&self, label: impl Into<String>) -> Result<(), SessionError> {
        self.send(PlayerCommand::Select(label.into()))
    }

    /// # Errors
    ///
    /// Returns `SessionError::PlayerClosed` if the loop has stopped.
    pub fn advance(&self) -> Result<(), SessionError> {
        self.send(PlayerCommand::Advance)
    }

    /// # Errors
    ///
    /// Returns `SessionError::PlayerClosed` if the loop has stopped.
    pub fn leave(&self) -> Result<(), SessionError> {
        self.send(PlayerCommand::Leave)
    }

    /// Latest published state; `None` when no session is active.
    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.snapshots.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<SessionSnapshot>> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::PlayerClosed` if the loop stops first.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&SessionSnapshot) -> bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut rx = self.snapshots.clone();
        let current = rx
            .wait_for(|snapshot| snapshot.as_ref().is_some_and(|s| predicate(s)))
            .await
            .map_err(|_| SessionError::PlayerClosed)?;
        current.clone().ok_or(SessionError::PlayerClosed)
    }

    /// Stop the loop and wait for it to release the session.
    pub async fn shutdown(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(err) = task.await {
            debug!(error = %err, "player loop ended abnormally");
        }
    }
}

//
// ─── LOOP ──────────────────────────────────────────────────────────────────────
//

struct PlayerLoop {
    api: Arc<dyn QuizApi>,
    audio: Arc<dyn AudioPlayer>,
    clock: Clock,
    settings: PlayerSettings,
    next_id: SessionId,
    session: Option<QuizSession>,
    ticker: Option<Ticker>,
    // Network calls and delays for the live session; replaced (and so aborted)
    // whenever the session ends.
    tasks: JoinSet<()>,
    events: mpsc::UnboundedSender<SessionEvent>,
    snapshots: watch::Sender<Option<SessionSnapshot>>,
}

impl PlayerLoop {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<PlayerCommand>,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                Some(event) = events.recv() => self.on_event(event),
                Some(_) = self.tasks.join_next(), if !self.tasks.is_empty() => continue,
            }
            self.publish();
        }
        self.end_session();
        self.publish();
    }

    fn on_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Start {
                quiz_id,
                difficulty,
            } => {
                self.end_session();
                let id = self.next_id;
                self.next_id = id.next();
                let session = QuizSession::new(id, quiz_id, difficulty, Arc::clone(&self.audio))
                    .with_feedback_window(self.settings.feedback_window);
                let effects = session.start();
                self.session = Some(session);
                self.run_effects(effects);
            }
            PlayerCommand::Select(label) => {
                if let Some(session) = self.session.as_mut()
                    && !session.select(&label)
                {
                    debug!(label = %label, "selection rejected");
                }
            }
            PlayerCommand::Advance => {
                let now = self.clock.now();
                if let Some(session) = self.session.as_mut() {
                    let effects = session.advance(now);
                    self.run_effects(effects);
                }
            }
            PlayerCommand::Leave => self.end_session(),
        }
    }

    fn on_event(&mut self, event: SessionEvent) {
        let now = self.clock.now();
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let effects = match event {
            SessionEvent::QuestionsLoaded { session: id, result } => {
                session.questions_loaded(id, result, now)
            }
            SessionEvent::Tick(token) => session.tick(token, now),
            SessionEvent::AnswerChecked { token, result } => session.answer_checked(token, result),
            SessionEvent::FeedbackElapsed(token) => session.feedback_elapsed(token, now),
            SessionEvent::Submitted { session: id, result } => session.quiz_submitted(id, result),
        };
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            match effect {
                SessionEffect::FetchQuestions { session, quiz_id } => {
                    let api = Arc::clone(&self.api);
                    let events = self.events.clone();
                    self.tasks.spawn(async move {
                        let result = api.fetch_questions(quiz_id).await;
                        let _ = events.send(SessionEvent::QuestionsLoaded { session, result });
                    });
                }
                SessionEffect::StartTicker(token) => {
                    self.ticker = None;
                    self.ticker = Some(Ticker::start(
                        self.settings.tick_interval,
                        self.events.clone(),
                        move || SessionEvent::Tick(token),
                    ));
                }
                SessionEffect::StopTicker => self.ticker = None,
                SessionEffect::CheckAnswer {
                    token,
                    quiz_id,
                    question_id,
                    request,
                    difficulty,
                } => {
                    let api = Arc::clone(&self.api);
                    let events = self.events.clone();
                    self.tasks.spawn(async move {
                        let result = api
                            .check_answer(quiz_id, question_id, &request, difficulty)
                            .await;
                        let _ = events.send(SessionEvent::AnswerChecked { token, result });
                    });
                }
                SessionEffect::ScheduleFeedbackEnd { token, delay } => {
                    let events = self.events.clone();
                    self.tasks.spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = events.send(SessionEvent::FeedbackElapsed(token));
                    });
                }
                SessionEffect::SubmitQuiz {
                    session,
                    quiz_id,
                    answers,
                    difficulty,
                } => {
                    let api = Arc::clone(&self.api);
                    let events = self.events.clone();
                    self.tasks.spawn(async move {
                        let result = api.submit_quiz(quiz_id, &answers, difficulty).await;
                        let _ = events.send(SessionEvent::Submitted { session, result });
                    });
                }
            }
        }
    }

    /// Release everything owned by the live session.
    fn end_session(&mut self) {
        self.ticker = None;
        drop(std::mem::take(&mut self.tasks));
        if let Some(mut session) = self.session.take() {
            debug!(session = %session.id(), "ending quiz session");
            let _ = session.teardown();
        }
    }

    fn publish(&self) {
        let next = self.session.as_ref().map(QuizSession::snapshot);
        self.snapshots.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
