//! Face detector seam.

use crate::source::types::VideoFrame;
use serde::{Deserialize, Serialize};

/// Axis-aligned face region in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceBox {
    pub top_left: [f64; 2],
    pub bottom_right: [f64; 2],
    /// Detector confidence (0-1)
    pub probability: f64,
}

impl FaceBox {
    pub fn width(&self) -> f64 {
        self.bottom_right[0] - self.top_left[0]
    }

    pub fn height(&self) -> f64 {
        self.bottom_right[1] - self.top_left[1]
    }
}

/// Finds faces in a frame.
pub trait FaceDetector {
    /// Whether the detector model is loaded and ticks may run.
    fn is_ready(&self) -> bool {
        true
    }

    /// Detect faces. An empty result means no faces, not a failure.
    fn estimate_faces(&mut self, frame: &VideoFrame) -> Vec<FaceBox>;
}

/// A detector that never finds a face.
///
/// Frames still go to the emotion service; only the overlay geometry is
/// missing.
#[derive(Debug, Default)]
pub struct NoopFaceDetector;

impl FaceDetector for NoopFaceDetector {
    fn estimate_faces(&mut self, _frame: &VideoFrame) -> Vec<FaceBox> {
        Vec::new()
    }
}
