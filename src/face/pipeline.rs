//! Fixed-interval face and emotion pipeline.
//!
//! Every tick captures a frame, runs the face detector on it and sends the
//! snapshot to the emotion service. Each tick gets its own request; responses
//! come back as `PredictionResponse` messages and are applied in arrival
//! order, so the last one to arrive wins.
//!
//! ```text
//! Idle ─▶ Capturing ─▶ Detecting ─▶ AwaitingPrediction ─▶ Rendering ─▶ Idle
//!            │ source not ready                 │ failed/malformed reply
//!            ▼                                  ▼
//!          Idle                          dropped (display keeps last values)
//! ```

use crate::display::{DisplayUpdate, Overlay};
use crate::emotion_client::EmotionError;
use crate::face::detector::{FaceBox, FaceDetector};
use crate::face::emotion::EmotionPrediction;
use crate::source::FrameSource;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Interval between pipeline ticks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on ticks awaiting a prediction. Beyond it the oldest tick is
/// forgotten and its reply, if any, is ignored.
pub const MAX_IN_FLIGHT: usize = 128;

/// Stage of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    Idle,
    Capturing,
    Detecting,
    AwaitingPrediction,
    Rendering,
}

/// Snapshot sent to the emotion service for one tick.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub tick_id: u64,
    /// Frame encoded as a `data:` URL
    pub image: String,
}

/// Result of one tick's remote request.
#[derive(Debug)]
pub struct PredictionResponse {
    pub tick_id: u64,
    pub result: Result<EmotionPrediction, EmotionError>,
}

/// Sends prediction requests without waiting for them.
///
/// Implementations must eventually deliver exactly one `PredictionResponse`
/// per request back to the loop, or none at all if the loop is gone.
pub trait PredictionDispatcher {
    fn dispatch(&self, request: PredictionRequest);
}

/// Why a tick did not send a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Stopped,
    DetectorNotReady,
    SourceNotReady,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Dispatched { tick_id: u64, faces: usize },
}

/// What happened to a prediction response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    /// Display values and overlay to apply
    Applied(DisplayUpdate),
    /// Failed or malformed reply; the display keeps its last values
    Dropped,
    /// Reply for a tick that is no longer tracked (pipeline stopped, or
    /// the tick was evicted)
    Stale,
}

#[derive(Debug)]
struct PendingTick {
    width: u32,
    height: u32,
    faces: Vec<FaceBox>,
    dispatched_at: Instant,
}

/// Face/emotion pipeline state owned by the fusion loop.
pub struct FacePipeline<F, D, P> {
    frames: F,
    detector: D,
    dispatcher: P,
    next_tick_id: u64,
    pending: BTreeMap<u64, PendingTick>,
    stopped: bool,
}

impl<F, D, P> FacePipeline<F, D, P>
where
    F: FrameSource,
    D: FaceDetector,
    P: PredictionDispatcher,
{
    pub fn new(frames: F, detector: D, dispatcher: P) -> Self {
        Self {
            frames,
            detector,
            dispatcher,
            next_tick_id: 0,
            pending: BTreeMap::new(),
            stopped: false,
        }
    }

    /// Run one tick up to sending the request.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stopped {
            return TickOutcome::Skipped(SkipReason::Stopped);
        }
        if !self.detector.is_ready() {
            return TickOutcome::Skipped(SkipReason::DetectorNotReady);
        }

        let tick_id = self.next_tick_id;
        trace_phase(tick_id, TickPhase::Capturing);
        let Some(frame) = self.frames.capture() else {
            trace_phase(tick_id, TickPhase::Idle);
            return TickOutcome::Skipped(SkipReason::SourceNotReady);
        };
        self.next_tick_id += 1;

        trace_phase(tick_id, TickPhase::Detecting);
        let faces = self.detector.estimate_faces(&frame);
        let face_count = faces.len();

        trace_phase(tick_id, TickPhase::AwaitingPrediction);
        if self.pending.len() >= MAX_IN_FLIGHT {
            if let Some((evicted, _)) = self.pending.pop_first() {
                tracing::debug!("Tick {} evicted while awaiting prediction", evicted);
            }
        }
        self.pending.insert(
            tick_id,
            PendingTick {
                width: frame.width,
                height: frame.height,
                faces,
                dispatched_at: Instant::now(),
            },
        );
        self.dispatcher.dispatch(PredictionRequest {
            tick_id,
            image: frame.to_data_url(),
        });

        TickOutcome::Dispatched {
            tick_id,
            faces: face_count,
        }
    }

    /// Apply a prediction response.
    pub fn on_response(&mut self, response: PredictionResponse) -> ResponseOutcome {
        let tick_id = response.tick_id;
        let Some(pending) = self.pending.remove(&tick_id) else {
            tracing::debug!("Ignoring reply for untracked tick {}", tick_id);
            return ResponseOutcome::Stale;
        };
        if self.stopped {
            return ResponseOutcome::Stale;
        }

        let prediction = match response.result {
            Ok(prediction) if prediction.predictions.is_finite() => prediction,
            Ok(_) => {
                tracing::debug!("Dropping tick {}: non-finite scores", tick_id);
                trace_phase(tick_id, TickPhase::Idle);
                return ResponseOutcome::Dropped;
            }
            Err(e) => {
                tracing::debug!("Dropping tick {}: {}", tick_id, e);
                trace_phase(tick_id, TickPhase::Idle);
                return ResponseOutcome::Dropped;
            }
        };

        trace_phase(tick_id, TickPhase::Rendering);
        tracing::debug!(
            "Tick {} prediction '{}' after {:?}",
            tick_id,
            prediction.emotion,
            pending.dispatched_at.elapsed()
        );

        // Fall back to the top score when the service names no emotion.
        let label = if prediction.emotion.trim().is_empty() {
            prediction.predictions.dominant().key().to_string()
        } else {
            prediction.emotion
        };

        let update = DisplayUpdate {
            percentages: prediction.predictions.percentages(),
            label: label.clone(),
            overlay: Overlay {
                tick_id,
                width: pending.width,
                height: pending.height,
                faces: pending.faces,
                label,
                predictions: prediction.predictions,
            },
        };
        trace_phase(tick_id, TickPhase::Idle);
        ResponseOutcome::Applied(update)
    }

    /// Stop scheduling ticks. Replies that arrive afterwards are ignored.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.pending.clear();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Number of ticks awaiting a prediction.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Phase of a tick, `Idle` once it is finished or unknown.
    pub fn phase_of(&self, tick_id: u64) -> TickPhase {
        if self.pending.contains_key(&tick_id) {
            TickPhase::AwaitingPrediction
        } else {
            TickPhase::Idle
        }
    }
}

fn trace_phase(tick_id: u64, phase: TickPhase) {
    tracing::trace!("Tick {} -> {:?}", tick_id, phase);
}
