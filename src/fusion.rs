//! The single-threaded fusion loop.
//!
//! One thread owns the movement detector, the alert presenter, the face
//! pipeline, the display values and the renderer. Work arrives as messages:
//!
//! ```text
//!  pose frames ───────▶┐
//!  tick (poll interval)▶│
//!  prediction replies ─▶├──▶ select! ──▶ handle_* ──▶ flush (redraw)
//!  alert cooldown ─────▶│
//!  shutdown ───────────▶┘
//! ```
//!
//! The two paths never touch each other's state; they only share the
//! renderer surface.

use crate::config::Config;
use crate::core::alert::{AlertPresenter, AlertState, AlertTransition};
use crate::core::movement::MovementDetector;
use crate::display::{DisplayState, Overlay, Renderer};
use crate::face::detector::FaceDetector;
use crate::face::pipeline::{
    FacePipeline, PredictionDispatcher, PredictionResponse, ResponseOutcome, TickOutcome,
};
use crate::source::types::PoseFrame;
use crate::source::FrameSource;
use crate::stats::SharedSessionStats;
use crossbeam_channel::{select, Receiver};
use std::time::{Duration, Instant};

/// Channels feeding the loop.
pub struct LoopChannels {
    /// Pose results; the loop ends when this disconnects
    pub poses: Receiver<PoseFrame>,
    /// Replies from the prediction dispatcher
    pub predictions: Receiver<PredictionResponse>,
    /// Any message or disconnect stops the loop
    pub shutdown: Receiver<()>,
}

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    LandmarksEnded,
}

/// Movement and face/emotion paths joined on one event loop.
pub struct FusionLoop<F, D, P, R> {
    detector: MovementDetector,
    presenter: AlertPresenter,
    pipeline: FacePipeline<F, D, P>,
    display: DisplayState,
    renderer: R,
    stats: SharedSessionStats,
    poll_interval: Duration,
    needs_present: bool,
    pending_overlay: Option<Overlay>,
}

impl<F, D, P, R> FusionLoop<F, D, P, R>
where
    F: FrameSource,
    D: FaceDetector,
    P: PredictionDispatcher,
    R: Renderer,
{
    pub fn new(
        config: &Config,
        pipeline: FacePipeline<F, D, P>,
        renderer: R,
        stats: SharedSessionStats,
    ) -> Self {
        Self {
            detector: MovementDetector::new(config.sensitivity, config.history_capacity),
            presenter: AlertPresenter::new(config.alert_cooldown),
            pipeline,
            display: DisplayState::new(),
            renderer,
            stats,
            poll_interval: config.poll_interval,
            needs_present: true,
            pending_overlay: None,
        }
    }

    /// Run until shutdown or until the pose stream ends.
    pub fn run(&mut self, channels: &LoopChannels) -> StopReason {
        let ticker = crossbeam_channel::tick(self.poll_interval);
        let mut predictions_open = true;
        tracing::info!("Fusion loop started (tick every {:?})", self.poll_interval);
        self.flush();

        let reason = loop {
            let cooldown = self.presenter.timer().receiver();
            let predictions = if predictions_open {
                channels.predictions.clone()
            } else {
                crossbeam_channel::never()
            };

            select! {
                recv(channels.poses) -> msg => match msg {
                    Ok(pose) => self.handle_pose(&pose, Instant::now()),
                    Err(_) => break StopReason::LandmarksEnded,
                },
                recv(ticker) -> _ => self.handle_tick(),
                recv(predictions) -> msg => match msg {
                    Ok(response) => self.handle_prediction(response),
                    Err(_) => predictions_open = false,
                },
                recv(cooldown) -> _ => self.poll_cooldown(Instant::now()),
                recv(channels.shutdown) -> _ => break StopReason::Shutdown,
            }

            self.flush();
        };

        self.shutdown();
        tracing::info!("Fusion loop stopped: {:?}", reason);
        reason
    }

    /// Feed one pose result through the movement path.
    pub fn handle_pose(&mut self, pose: &PoseFrame, now: Instant) {
        self.stats.record_pose_frame();
        // An expired cooldown must not swallow this signal.
        self.poll_cooldown(now);

        let Some((left, right)) = pose.shoulders() else {
            self.stats.record_pose_frame_ignored();
            return;
        };
        let Some(signal) = self.detector.observe(left, right, pose.captured_at) else {
            return;
        };

        if signal.is_detected() {
            self.stats.record_movement_signal();
            let d = signal.displacement();
            tracing::debug!("Movement detected (left {:.4}, right {:.4})", d.left, d.right);
        }
        if self.presenter.on_signal(&signal, now) == Some(AlertTransition::Raised) {
            self.stats.record_alert_raised();
            self.needs_present = true;
        }
    }

    /// Run one face-pipeline tick.
    pub fn handle_tick(&mut self) {
        match self.pipeline.tick() {
            TickOutcome::Dispatched { tick_id, faces } => {
                self.stats.record_tick_dispatched();
                tracing::debug!("Tick {} dispatched with {} face(s)", tick_id, faces);
            }
            TickOutcome::Skipped(reason) => {
                self.stats.record_tick_skipped();
                tracing::trace!("Tick skipped: {:?}", reason);
            }
        }
    }

    /// Apply a prediction reply.
    pub fn handle_prediction(&mut self, response: PredictionResponse) {
        match self.pipeline.on_response(response) {
            ResponseOutcome::Applied(update) => {
                self.stats.record_prediction_applied();
                self.display.apply(&update);
                self.pending_overlay = Some(update.overlay);
                self.needs_present = true;
            }
            ResponseOutcome::Dropped => self.stats.record_prediction_dropped(),
            ResponseOutcome::Stale => {}
        }
    }

    /// Clear the alert if its cooldown has expired.
    pub fn poll_cooldown(&mut self, now: Instant) {
        if self.presenter.poll_expiry(now) == Some(AlertTransition::Cleared) {
            self.needs_present = true;
        }
    }

    /// Redraw whatever changed since the last flush.
    pub fn flush(&mut self) {
        if let Some(overlay) = self.pending_overlay.take() {
            self.renderer.draw_overlay(&overlay);
        }
        if self.needs_present {
            self.renderer.present(&self.display, self.presenter.state());
            self.needs_present = false;
        }
    }

    /// Stop ticking and cancel the alert cooldown.
    pub fn shutdown(&mut self) {
        self.pipeline.stop();
        self.presenter.teardown();
        self.pending_overlay = None;
        self.needs_present = false;
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn alert(&self) -> &AlertState {
        self.presenter.state()
    }

    pub fn detector(&self) -> &MovementDetector {
        &self.detector
    }

    pub fn pipeline(&self) -> &FacePipeline<F, D, P> {
        &self.pipeline
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}
