//! Live-session counters.
//!
//! Nothing here outlives the process; the counters exist only for the
//! shutdown summary and for diagnosing a quiet display.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Counters for the current session.
#[derive(Debug)]
pub struct SessionStats {
    /// Pose results received from the landmark source
    pose_frames: AtomicU64,
    /// Pose results without usable shoulders
    pose_frames_ignored: AtomicU64,
    /// Observations that produced a movement-detected signal
    movement_signals: AtomicU64,
    /// Alerts raised
    alerts_raised: AtomicU64,
    /// Face-pipeline ticks that sent a request
    ticks_dispatched: AtomicU64,
    /// Ticks skipped because the source or detector was not ready
    ticks_skipped: AtomicU64,
    /// Predictions applied to the display
    predictions_applied: AtomicU64,
    /// Predictions dropped (failed or malformed replies)
    predictions_dropped: AtomicU64,
    /// Session identifier
    session_id: Uuid,
    /// Session start time
    session_start: DateTime<Utc>,
}

impl SessionStats {
    /// Create a new set of counters.
    pub fn new() -> Self {
        Self {
            pose_frames: AtomicU64::new(0),
            pose_frames_ignored: AtomicU64::new(0),
            movement_signals: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
            ticks_dispatched: AtomicU64::new(0),
            ticks_skipped: AtomicU64::new(0),
            predictions_applied: AtomicU64::new(0),
            predictions_dropped: AtomicU64::new(0),
            session_id: Uuid::new_v4(),
            session_start: Utc::now(),
        }
    }

    pub fn record_pose_frame(&self) {
        self.pose_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pose_frame_ignored(&self) {
        self.pose_frames_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_movement_signal(&self) {
        self.movement_signals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_raised(&self) {
        self.alerts_raised.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_dispatched(&self) {
        self.ticks_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction_applied(&self) {
        self.predictions_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_prediction_dropped(&self) {
        self.predictions_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Get the current counters.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            pose_frames: self.pose_frames.load(Ordering::Relaxed),
            pose_frames_ignored: self.pose_frames_ignored.load(Ordering::Relaxed),
            movement_signals: self.movement_signals.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            ticks_dispatched: self.ticks_dispatched.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            predictions_applied: self.predictions_applied.load(Ordering::Relaxed),
            predictions_dropped: self.predictions_dropped.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn report(&self) -> String {
        let s = self.summary();
        format!(
            "Session {}:\n\
             - Pose results processed: {} ({} without usable shoulders)\n\
             - Movement detected: {} times\n\
             - Fidgeting alerts raised: {}\n\
             - Emotion requests sent: {} ({} ticks skipped)\n\
             - Predictions shown: {} ({} dropped)\n\
             - Session duration: {} seconds",
            s.session_id,
            s.pose_frames,
            s.pose_frames_ignored,
            s.movement_signals,
            s.alerts_raised,
            s.ticks_dispatched,
            s.ticks_skipped,
            s.predictions_applied,
            s.predictions_dropped,
            s.session_duration_secs
        )
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the session counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub pose_frames: u64,
    pub pose_frames_ignored: u64,
    pub movement_signals: u64,
    pub alerts_raised: u64,
    pub ticks_dispatched: u64,
    pub ticks_skipped: u64,
    pub predictions_applied: u64,
    pub predictions_dropped: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Thread-safe wrapper for the session counters.
pub type SharedSessionStats = Arc<SessionStats>;

/// Create a new shared set of counters.
pub fn create_shared_stats() -> SharedSessionStats {
    Arc::new(SessionStats::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = SessionStats::new();
        stats.record_pose_frame();
        stats.record_pose_frame();
        stats.record_pose_frame_ignored();
        stats.record_alert_raised();
        stats.record_prediction_dropped();

        let summary = stats.summary();
        assert_eq!(summary.pose_frames, 2);
        assert_eq!(summary.pose_frames_ignored, 1);
        assert_eq!(summary.alerts_raised, 1);
        assert_eq!(summary.predictions_dropped, 1);
        assert_eq!(summary.predictions_applied, 0);
    }

    #[test]
    fn test_report_mentions_counts() {
        let stats = create_shared_stats();
        stats.record_tick_dispatched();
        stats.record_tick_skipped();
        let report = stats.report();
        assert!(report.contains("Emotion requests sent: 1 (1 ticks skipped)"));
        assert!(report.contains(&stats.session_id().to_string()));
    }
}
