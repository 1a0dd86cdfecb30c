//! Windowed movement-change detection on the shoulder landmarks.
//!
//! Each pose result appends one sample to a short fixed-capacity history.
//! The newest sample is compared against the oldest retained one, so
//! single-frame jitter that returns to where it started does not count as
//! movement while sustained drift does.

use crate::source::types::Landmark;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Displacement (normalized coordinate units) that counts as movement.
pub const SENSITIVITY: f64 = 0.03;

/// Number of samples retained in the movement history.
pub const HISTORY_CAPACITY: usize = 5;

/// Both tracked shoulders for one processed pose result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSample {
    pub left: Landmark,
    pub right: Landmark,
    pub timestamp: DateTime<Utc>,
}

/// Fixed-capacity, oldest-evicted history of movement samples.
///
/// Timestamps are kept non-decreasing: a sample stamped earlier than the
/// newest entry is recorded at the newest entry's time.
#[derive(Debug, Clone)]
pub struct MovementHistory {
    samples: VecDeque<MovementSample>,
    capacity: usize,
}

impl MovementHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full.
    pub fn push(&mut self, mut sample: MovementSample) {
        if let Some(newest) = self.samples.back() {
            if sample.timestamp < newest.timestamp {
                sample.timestamp = newest.timestamp;
            }
        }
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<&MovementSample> {
        self.samples.front()
    }

    pub fn newest(&self) -> Option<&MovementSample> {
        self.samples.back()
    }

    /// Iterate from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &MovementSample> {
        self.samples.iter()
    }
}

/// Per-shoulder displacement over the retained window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub left: f64,
    pub right: f64,
}

/// Outcome of one observation with enough history to compare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementSignal {
    /// At least one shoulder moved more than the sensitivity
    Detected(Displacement),
    /// Neither shoulder moved more than the sensitivity
    Still(Displacement),
}

impl MovementSignal {
    pub fn is_detected(&self) -> bool {
        matches!(self, MovementSignal::Detected(_))
    }

    pub fn displacement(&self) -> Displacement {
        match self {
            MovementSignal::Detected(d) | MovementSignal::Still(d) => *d,
        }
    }
}

/// Turns consecutive shoulder positions into movement signals.
#[derive(Debug, Clone)]
pub struct MovementDetector {
    history: MovementHistory,
    sensitivity: f64,
}

impl Default for MovementDetector {
    fn default() -> Self {
        Self::new(SENSITIVITY, HISTORY_CAPACITY)
    }
}

impl MovementDetector {
    pub fn new(sensitivity: f64, capacity: usize) -> Self {
        Self {
            history: MovementHistory::new(capacity),
            sensitivity,
        }
    }

    /// Record the shoulder positions at `timestamp` and compare the window.
    ///
    /// Returns `None` while fewer than two samples are held, or when either
    /// landmark has non-finite coordinates (the call is then a no-op).
    pub fn observe(
        &mut self,
        left: Landmark,
        right: Landmark,
        timestamp: DateTime<Utc>,
    ) -> Option<MovementSignal> {
        if !left.is_finite() || !right.is_finite() {
            tracing::debug!("Ignoring non-finite shoulder landmarks");
            return None;
        }

        self.history.push(MovementSample {
            left,
            right,
            timestamp,
        });

        if self.history.len() < 2 {
            return None;
        }

        let oldest = self.history.oldest()?;
        let newest = self.history.newest()?;
        let displacement = Displacement {
            left: newest.left.distance(&oldest.left),
            right: newest.right.distance(&oldest.right),
        };

        if displacement.left > self.sensitivity || displacement.right > self.sensitivity {
            Some(MovementSignal::Detected(displacement))
        } else {
            Some(MovementSignal::Still(displacement))
        }
    }

    /// `observe` stamped with the current time.
    pub fn observe_now(&mut self, left: Landmark, right: Landmark) -> Option<MovementSignal> {
        self.observe(left, right, Utc::now())
    }

    pub fn history(&self) -> &MovementHistory {
        &self.history
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(start: DateTime<Utc>, ms: i64) -> DateTime<Utc> {
        start + Duration::milliseconds(ms)
    }

    #[test]
    fn test_single_sample_gives_no_signal() {
        let mut detector = MovementDetector::default();
        let signal = detector.observe_now(Landmark::new(0.4, 0.5), Landmark::new(0.6, 0.5));
        assert!(signal.is_none());
        assert_eq!(detector.history().len(), 1);
    }

    #[test]
    fn test_history_never_exceeds_capacity() {
        let start = Utc::now();
        let mut detector = MovementDetector::default();

        for i in 0..12 {
            let x = 0.1 + i as f64 * 0.001;
            detector.observe(Landmark::new(x, 0.5), Landmark::new(0.6, 0.5), at(start, i * 33));
            assert!(detector.history().len() <= HISTORY_CAPACITY);
        }
        assert_eq!(detector.history().len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_sixth_observation_evicts_first() {
        let start = Utc::now();
        let mut detector = MovementDetector::default();

        for i in 0..6 {
            let x = 0.1 + i as f64 * 0.001;
            detector.observe(Landmark::new(x, 0.5), Landmark::new(0.6, 0.5), at(start, i * 33));
        }

        let history = detector.history();
        assert!(history.iter().all(|s| s.timestamp != start));
        assert_eq!(history.oldest().unwrap().timestamp, at(start, 33));
        assert!((history.oldest().unwrap().left.x - 0.101).abs() < 1e-12);
    }

    #[test]
    fn test_timestamps_stay_ordered() {
        let start = Utc::now();
        let mut detector = MovementDetector::default();
        detector.observe(Landmark::new(0.4, 0.5), Landmark::new(0.6, 0.5), at(start, 100));
        detector.observe(Landmark::new(0.4, 0.5), Landmark::new(0.6, 0.5), at(start, 50));

        let stamps: Vec<_> = detector.history().iter().map(|s| s.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut detector = MovementDetector::default();
        detector.observe_now(Landmark::new(0.0, 0.0), Landmark::new(0.6, 0.5));
        let signal = detector
            .observe_now(Landmark::new(0.03, 0.0), Landmark::new(0.6, 0.5))
            .unwrap();
        assert!(!signal.is_detected());

        let mut detector = MovementDetector::default();
        detector.observe_now(Landmark::new(0.0, 0.0), Landmark::new(0.6, 0.5));
        let signal = detector
            .observe_now(Landmark::new(0.0301, 0.0), Landmark::new(0.6, 0.5))
            .unwrap();
        assert!(signal.is_detected());
    }

    #[test]
    fn test_threshold_compares_raw_float_distance() {
        // 0.43 - 0.40 is 0.030000000000000027 in f64, so it counts as movement.
        let mut detector = MovementDetector::default();
        let right = Landmark::new(0.6, 0.5);
        detector.observe_now(Landmark::new(0.40, 0.5), right);
        let signal = detector.observe_now(Landmark::new(0.43, 0.5), right).unwrap();
        assert!(signal.displacement().left > SENSITIVITY);
        assert!(signal.is_detected());
    }

    #[test]
    fn test_left_shoulder_drift_detected() {
        let mut detector = MovementDetector::default();
        let right = Landmark::new(0.60, 0.50);

        for _ in 0..4 {
            let signal = detector.observe_now(Landmark::new(0.40, 0.50), right);
            assert!(signal.map_or(true, |s| !s.is_detected()));
        }
        let signal = detector
            .observe_now(Landmark::new(0.44, 0.50), right)
            .unwrap();
        assert!(signal.is_detected());
        assert!((signal.displacement().left - 0.04).abs() < 1e-9);
        assert_eq!(signal.displacement().right, 0.0);
    }

    #[test]
    fn test_right_shoulder_alone_triggers() {
        let mut detector = MovementDetector::default();
        let left = Landmark::new(0.40, 0.50);
        detector.observe_now(left, Landmark::new(0.60, 0.50));
        let signal = detector
            .observe_now(left, Landmark::new(0.60, 0.55))
            .unwrap();
        assert!(signal.is_detected());
    }

    #[test]
    fn test_jitter_within_window_is_still() {
        // Alternating 0.02 steps: endpoints never differ by more than 0.02.
        let mut detector = MovementDetector::default();
        for i in 0..10 {
            let x = if i % 2 == 0 { 0.40 } else { 0.42 };
            let signal = detector.observe_now(Landmark::new(x, 0.5), Landmark::new(x + 0.2, 0.5));
            assert!(signal.map_or(true, |s| !s.is_detected()), "sample {i}");
        }
    }

    #[test]
    fn test_steady_drift_compares_endpoints() {
        // 0.02 per sample: the second sample is 0.02 from the oldest, the
        // third is 0.04 from it.
        let mut detector = MovementDetector::default();
        let right = Landmark::new(0.6, 0.5);
        assert!(detector.observe_now(Landmark::new(0.0, 0.5), right).is_none());
        let second = detector.observe_now(Landmark::new(0.02, 0.5), right).unwrap();
        assert!(!second.is_detected());
        let third = detector.observe_now(Landmark::new(0.04, 0.5), right).unwrap();
        assert!(third.is_detected());
    }

    #[test]
    fn test_non_finite_landmark_is_noop() {
        let mut detector = MovementDetector::default();
        detector.observe_now(Landmark::new(0.4, 0.5), Landmark::new(0.6, 0.5));
        let signal = detector.observe_now(Landmark::new(f64::NAN, 0.5), Landmark::new(0.6, 0.5));
        assert!(signal.is_none());
        assert_eq!(detector.history().len(), 1);
    }
}
