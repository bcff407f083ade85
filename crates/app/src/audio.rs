//! Audio cue playback through the default output device.
//!
//! `rodio` output streams are not `Send`, so one dedicated thread owns the
//! stream and the current sink. Cues are downloaded on that thread and played
//! one at a time; a new command always silences the previous cue first.

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use services::{AudioError, AudioPlayer};
use tracing::{debug, warn};

#[derive(Debug)]
enum Cue {
    Play(String),
    Stop,
}

/// [`AudioPlayer`] backed by a `rodio` sink on a background thread.
#[derive(Debug)]
pub struct RodioPlayer {
    commands: mpsc::Sender<Cue>,
}

impl RodioPlayer {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// Returns `AudioError::Unavailable` when there is no usable output device.
    pub fn spawn() -> Result<Self, AudioError> {
        let (commands, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        thread::Builder::new()
            .name("quiz-audio".into())
            .spawn(move || run(rx, ready_tx))
            .map_err(|err| AudioError::Unavailable(err.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| AudioError::Unavailable("audio thread exited".into()))??;
        Ok(Self { commands })
    }

    fn send(&self, cue: Cue) -> Result<(), AudioError> {
        self.commands
            .send(cue)
            .map_err(|_| AudioError::Unavailable("audio thread exited".into()))
    }
}

impl AudioPlayer for RodioPlayer {
    fn play(&self, url: &str) -> Result<(), AudioError> {
        self.send(Cue::Play(url.to_string()))
    }

    fn stop(&self) {
        let _ = self.send(Cue::Stop);
    }
}

fn run(commands: mpsc::Receiver<Cue>, ready: mpsc::Sender<Result<(), AudioError>>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(pair) => {
            let _ = ready.send(Ok(()));
            pair
        }
        Err(err) => {
            let _ = ready.send(Err(AudioError::Unavailable(err.to_string())));
            return;
        }
    };

    let mut current: Option<Sink> = None;
    while let Ok(cue) = commands.recv() {
        if let Some(sink) = current.take() {
            sink.stop();
        }
        match cue {
            Cue::Stop => {}
            Cue::Play(url) => match load(&handle, &url) {
                Ok(sink) => {
                    debug!(url = %url, "playing audio cue");
                    current = Some(sink);
                }
                Err(err) => warn!(url = %url, error = %err, "audio cue could not be played"),
            },
        }
    }
}

fn load(handle: &OutputStreamHandle, url: &str) -> Result<Sink, AudioError> {
    let bytes = reqwest::blocking::get(url)
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::bytes)
        .map_err(|err| AudioError::Playback(err.to_string()))?;
    let source = Decoder::new(Cursor::new(bytes.to_vec()))
        .map_err(|err| AudioError::Playback(err.to_string()))?;
    let sink = Sink::try_new(handle).map_err(|err| AudioError::Playback(err.to_string()))?;
    sink.append(source);
    Ok(sink)
}
