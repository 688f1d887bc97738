//! Wall-clock derived playback position.
//!
//! Backends disagree about position (the subprocess player has none at all),
//! so the engine keeps its own clock: a base offset plus the time since the
//! clock last started running. Pause freezes it, seek rebases it.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct PositionClock {
    base: Duration,
    started_at: Option<Instant>,
}

impl PositionClock {
    pub fn new() -> Self {
        Self {
            base: Duration::ZERO,
            started_at: None,
        }
    }

    /// Restart from zero, running.
    pub fn start(&mut self) {
        self.base = Duration::ZERO;
        self.started_at = Some(Instant::now());
    }

    /// Freeze the current position.
    pub fn pause(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.base += started.elapsed();
        }
    }

    /// Continue from the frozen position.
    pub fn resume(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    /// Rebase to `pos`, keeping the running/paused state.
    pub fn set(&mut self, pos: Duration) {
        self.base = pos;
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => self.base + started.elapsed(),
            None => self.base,
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Fires at most once per interval; drives periodic progress output.
pub struct Ticker {
    interval: Duration,
    last: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn due(&mut self) -> bool {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
