mod answers;
mod audio;
mod machine;
mod player;
mod state;
mod timer;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use answers::AnswerLog;
pub use audio::{AudioError, AudioPlayer, CueGuard, SilentPlayer};
pub use machine::{FEEDBACK_WINDOW, QuizSession};
pub use player::{PlayerCommand, PlayerHandle, PlayerSettings, QuizPlayer};
pub use state::{
    Feedback, OptionMark, OptionView, PhaseTag, SessionEffect, SessionPhase, SessionSnapshot,
    StepToken, Verdict,
};
pub use timer::{Countdown, TickOutcome, Ticker};
