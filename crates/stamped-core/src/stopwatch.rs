//! Elapsed-time stopwatch
//!
//! Counts whole seconds while running. The one-second cadence is a deadline
//! owned by the stopwatch itself: the event loop asks for
//! [`Stopwatch::next_deadline`], sleeps until then, and calls
//! [`Stopwatch::poll`]. Stopping or resetting clears the deadline, and
//! dropping the stopwatch drops it with it, so no tick can land after the
//! owning session is gone.

use std::time::{Duration, Instant};

/// Interval between ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Running state of a stopwatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopwatchState {
    #[default]
    Stopped,
    Running,
}

/// Stopwatch counting elapsed seconds for a document session
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    state: StopwatchState,
    elapsed_seconds: u64,
    /// When the next tick is due; `Some` only while running
    next_tick: Option<Instant>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StopwatchState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == StopwatchState::Running
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Start or resume counting. No-op if already running.
    pub fn start(&mut self, now: Instant) {
        if self.is_running() {
            return;
        }
        self.state = StopwatchState::Running;
        self.next_tick = Some(now + TICK_INTERVAL);
        tracing::debug!(elapsed = self.elapsed_seconds, "Stopwatch started");
    }

    /// Freeze the count. No-op if already stopped.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state = StopwatchState::Stopped;
        self.next_tick = None;
        tracing::debug!(elapsed = self.elapsed_seconds, "Stopwatch stopped");
    }

    /// Start if stopped, stop if running
    pub fn toggle(&mut self, now: Instant) {
        if self.is_running() {
            self.stop();
        } else {
            self.start(now);
        }
    }

    /// Stop and clear the count
    pub fn reset(&mut self) {
        self.state = StopwatchState::Stopped;
        self.elapsed_seconds = 0;
        self.next_tick = None;
    }

    /// Advance by one second. Ignored unless running.
    pub fn tick(&mut self) {
        if self.is_running() {
            self.elapsed_seconds += 1;
        }
    }

    /// Fire every tick due at `now`, returning how many fired
    ///
    /// A late caller catches up: each missed second is counted once.
    pub fn poll(&mut self, now: Instant) -> u64 {
        let mut fired = 0;
        while let Some(due) = self.next_tick {
            if due > now {
                break;
            }
            self.tick();
            self.next_tick = Some(due + TICK_INTERVAL);
            fired += 1;
        }
        fired
    }

    /// When the next tick is due, if running
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    /// Elapsed time as `HH:MM:SS`
    pub fn format(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }

    /// Label for the start/stop control
    pub fn label(&self) -> String {
        match self.state {
            StopwatchState::Running => self.format(),
            StopwatchState::Stopped if self.elapsed_seconds == 0 => "Start Timer".to_string(),
            StopwatchState::Stopped => "Resume Timer".to_string(),
        }
    }
}

/// Render seconds as zero-padded `HH:MM:SS`
///
/// Hours are not capped; past 99 they take as many digits as needed.
pub fn format_elapsed(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}
