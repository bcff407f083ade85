//! Audio cues attached to questions.
//!
//! Playback is best-effort: hosts may refuse to play (no output device,
//! blocked codec, unreachable url) and the session carries on regardless.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("audio cue could not be played: {0}")]
    Playback(String),
}

/// Something that can play one audio cue at a time.
pub trait AudioPlayer: Send + Sync {
    /// Start playing `url`, replacing whatever was playing.
    ///
    /// # Errors
    ///
    /// Returns `AudioError` if playback could not start.
    fn play(&self, url: &str) -> Result<(), AudioError>;

    /// Stop and rewind the current cue, if any.
    fn stop(&self);
}

/// Player that never makes a sound.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentPlayer;

impl AudioPlayer for SilentPlayer {
    fn play(&self, _url: &str) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&self) {}
}

/// Playback scoped to one presented question. Dropping the guard stops it.
pub struct CueGuard {
    player: Arc<dyn AudioPlayer>,
    url: String,
}

impl CueGuard {
    /// Start `url` on `player`.
    ///
    /// A refused start is logged and still yields a guard, so the stop on drop
    /// runs either way.
    #[must_use]
    pub fn start(player: Arc<dyn AudioPlayer>, url: &str) -> Self {
        match player.play(url) {
            Ok(()) => debug!(url, "audio cue started"),
            Err(err) => warn!(url, error = %err, "audio cue blocked"),
        }
        Self {
            player,
            url: url.to_string(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for CueGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CueGuard")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl Drop for CueGuard {
    fn drop(&mut self) {
        self.player.stop();
        debug!(url = %self.url, "audio cue stopped");
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{AudioCall, RecordingPlayer};
    use super::*;

    #[test]
    fn dropping_guard_stops_playback() {
        let player = Arc::new(RecordingPlayer::default());
        let guard = CueGuard::start(player.clone(), "https://cdn.example/a.mp3");
        assert_eq!(guard.url(), "https://cdn.example/a.mp3");
        drop(guard);
        assert_eq!(
            player.calls(),
            vec![AudioCall::Play("https://cdn.example/a.mp3".into()), AudioCall::Stop]
        );
    }

    #[test]
    fn refused_playback_is_swallowed() {
        let player = Arc::new(RecordingPlayer {
            refuse: true,
            ..RecordingPlayer::default()
        });
        drop(CueGuard::start(player.clone(), "https://cdn.example/a.mp3"));
        assert_eq!(player.calls().last(), Some(&AudioCall::Stop));
    }
}
