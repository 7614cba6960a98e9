//! # Mode timer
//!
//! Measures how long the current mode has been running, excluding any time spent paused.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::{Duration, Instant};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct ModeTimer {
    /// Time the current mode began, shifted forward by every pause since.
    mode_start: Instant,

    /// Time the timer was paused, `None` while running.
    paused_at: Option<Instant>,

    /// True once the timer has been resumed since it was created.
    started: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ModeTimer {
    /// Create a timer which is paused with nothing elapsed.
    pub fn new(now: Instant) -> Self {
        Self {
            mode_start: now,
            paused_at: Some(now),
            started: false,
        }
    }

    /// Begin timing a new mode. A paused timer stays paused.
    pub fn restart(&mut self, now: Instant) {
        self.mode_start = now;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
    }

    /// Freeze the elapsed time. Pausing an already paused timer does nothing.
    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Continue timing, discounting the time spent paused.
    pub fn resume(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.mode_start += now.saturating_duration_since(paused_at);
        }
        self.started = true;
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Time spent in the current mode while not paused.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.paused_at
            .unwrap_or(now)
            .saturating_duration_since(self.mode_start)
    }
}
