use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

/// Result of feeding one tick into a [`Countdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting; carries the seconds left.
    Running(u32),
    /// Reached zero on this tick. Reported once per reset.
    Expired,
    /// Already expired; the tick changes nothing.
    Idle,
}

/// Per-question countdown in whole seconds.
///
/// Pure bookkeeping: something else delivers the ticks, and the session only
/// feeds them in while a question is being presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    budget: u32,
    remaining: u32,
    expired: bool,
}

impl Countdown {
    #[must_use]
    pub fn new(budget: u32) -> Self {
        Self {
            budget,
            remaining: budget,
            expired: false,
        }
    }

    /// Restore the full budget and re-arm expiry.
    pub fn reset(&mut self) {
        self.remaining = self.budget;
        self.expired = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.expired {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }

    #[must_use]
    pub fn budget(&self) -> u32 {
        self.budget
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Fraction of the budget left, in `0.0..=1.0`.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.budget == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.remaining as f32 / self.budget as f32;
        ratio.clamp(0.0, 1.0)
    }
}

//
// ─── TICKER ────────────────────────────────────────────────────────────────────
//

/// Background task that sends an event every `period`.
///
/// The first event arrives one full period after start. Dropping the ticker
/// aborts the task, so no tick is sent after the owner lets go of it.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn start<E, F>(period: Duration, events: UnboundedSender<E>, make_event: F) -> Self
    where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if events.send(make_event()).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
