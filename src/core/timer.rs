//! Cancellable one-shot timer.
//!
//! The timer only holds a deadline. Whoever owns it decides what happens on
//! expiry, so dropping or cancelling the timer means no expiry action can run
//! afterwards.

use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};

/// A one-shot deadline that can be armed, cancelled and polled.
#[derive(Debug, Clone, Default)]
pub struct CancellableTimer {
    deadline: Option<Instant>,
}

impl CancellableTimer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm the timer to fire `duration` after `now`, replacing any deadline.
    pub fn arm(&mut self, now: Instant, duration: Duration) {
        self.deadline = Some(now + duration);
    }

    /// Disarm the timer. A cancelled timer never fires.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the expiry if the deadline has passed at `now`.
    ///
    /// Returns `true` exactly once per arming.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// A channel that becomes ready at the deadline, for use in
    /// `crossbeam_channel::select!`. Never ready while disarmed.
    pub fn receiver(&self) -> Receiver<Instant> {
        match self.deadline {
            Some(deadline) => crossbeam_channel::at(deadline),
            None => crossbeam_channel::never(),
        }
    }
}
