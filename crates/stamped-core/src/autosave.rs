//! Autosave scheduling
//!
//! Every content change re-arms a single countdown; the save fires only
//! after a full quiescence window passes with no further change. Manual
//! saves happen outside the scheduler and leave the countdown alone.

use std::time::{Duration, Instant};

/// Debounced save countdown for one document
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    delay: Duration,
    /// At most one pending save
    deadline: Option<Instant>,
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a content change at `now`, replacing any pending countdown
    pub fn content_changed(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop the pending countdown, if any
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the countdown has run out at `now`
    ///
    /// Returns true at most once per armed countdown; the caller persists
    /// the current snapshot when it does.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(due) if due <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
