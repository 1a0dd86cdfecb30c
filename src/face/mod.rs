//! Face and emotion path.
//!
//! This module contains:
//! - The face detector seam and a noop detector
//! - The emotion taxonomy and prediction values
//! - The fixed-interval tick pipeline that pairs frames with predictions

pub mod detector;
pub mod emotion;
pub mod pipeline;

// Re-export commonly used types
pub use detector::{FaceBox, FaceDetector, NoopFaceDetector};
pub use emotion::{to_percent, EmotionLabel, EmotionPrediction, EmotionVector};
pub use pipeline::{
    FacePipeline, PredictionDispatcher, PredictionRequest, PredictionResponse, ResponseOutcome,
    SkipReason, TickOutcome, TickPhase, MAX_IN_FLIGHT, POLL_INTERVAL,
};
