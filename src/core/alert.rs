//! Debounced fidgeting alert.
//!
//! The presenter is the only writer of the alert text. A detected-movement
//! signal raises the alert and arms a cooldown; signals during the cooldown
//! are ignored (no refresh, no re-arm). When the cooldown expires the alert
//! clears and the next signal can raise it again.

use crate::core::movement::MovementSignal;
use crate::core::timer::CancellableTimer;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Text shown while the alert is active.
pub const ALERT_MESSAGE: &str = "ALERT! Fidgeting Detected";

/// How long an alert stays visible and blocks new alerts.
pub const ALERT_COOLDOWN: Duration = Duration::from_millis(1000);

/// User-visible alert state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertState {
    pub active: bool,
    pub message: String,
    /// Remaining cooldown when armed
    #[serde(skip)]
    pub armed_until: Option<Instant>,
}

/// State change produced by the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTransition {
    Raised,
    Cleared,
}

/// Converts movement signals into a time-bounded alert.
#[derive(Debug)]
pub struct AlertPresenter {
    state: AlertState,
    cooldown: Duration,
    timer: CancellableTimer,
}

impl Default for AlertPresenter {
    fn default() -> Self {
        Self::new(ALERT_COOLDOWN)
    }
}

impl AlertPresenter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: AlertState::default(),
            cooldown,
            timer: CancellableTimer::new(),
        }
    }

    /// Handle a movement signal received at `now`.
    pub fn on_signal(&mut self, signal: &MovementSignal, now: Instant) -> Option<AlertTransition> {
        if !signal.is_detected() || self.timer.is_armed() {
            return None;
        }

        self.timer.arm(now, self.cooldown);
        self.state = AlertState {
            active: true,
            message: ALERT_MESSAGE.to_string(),
            armed_until: self.timer.deadline(),
        };
        tracing::info!("{}", ALERT_MESSAGE);
        Some(AlertTransition::Raised)
    }

    /// Clear the alert if its cooldown has run out at `now`.
    pub fn poll_expiry(&mut self, now: Instant) -> Option<AlertTransition> {
        if !self.timer.fire_if_due(now) {
            return None;
        }
        self.state = AlertState::default();
        tracing::debug!("Alert cleared");
        Some(AlertTransition::Cleared)
    }

    /// The cooldown timer, for waiting on its expiry.
    pub fn timer(&self) -> &CancellableTimer {
        &self.timer
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Cancel any pending cooldown and clear the alert without notifying.
    pub fn teardown(&mut self) {
        self.timer.cancel();
        self.state = AlertState::default();
    }
}

impl Drop for AlertPresenter {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}
