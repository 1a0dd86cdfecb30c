//! Core temporal logic of the movement path.
//!
//! This module contains:
//! - The windowed movement-change detector over the shoulder landmarks
//! - The debounced alert presenter
//! - The cancellable timer backing the alert cooldown

pub mod alert;
pub mod movement;
pub mod timer;

// Re-export commonly used types
pub use alert::{AlertPresenter, AlertState, AlertTransition, ALERT_COOLDOWN, ALERT_MESSAGE};
pub use movement::{
    Displacement, MovementDetector, MovementHistory, MovementSample, MovementSignal,
    HISTORY_CAPACITY, SENSITIVITY,
};
pub use timer::CancellableTimer;
