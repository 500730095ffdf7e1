//! Debounced scheduling
//!
//! Rapid filter-control changes are coalesced behind a short window
//! before a recompute runs. The timer is explicit and cancellable; the
//! caller drives it by passing the current instant into `trigger` and
//! `poll`, which keeps tests deterministic.

use std::time::{Duration, Instant};

/// Default coalescing window for filter-control changes
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(80);

/// A trailing-edge debouncer: each trigger pushes the deadline out, and
/// `poll` fires once after the window has been quiet.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record a trigger at `now`, extending the deadline
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Whether a fire is scheduled
    pub fn pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// The instant the debouncer will next fire, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fire if the deadline has passed; clears the schedule on fire
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any scheduled fire
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
