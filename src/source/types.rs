//! Input types produced by the pose extractor and the video source.
//!
//! Landmarks use normalized image coordinates: `x` and `y` are in `[0, 1]`
//! relative to the frame, `z` is the extractor's relative depth when present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index of the left shoulder in the pose landmark list.
pub const LEFT_SHOULDER: usize = 11;

/// Index of the right shoulder in the pose landmark list.
pub const RIGHT_SHOULDER: usize = 12;

/// A tracked anatomical point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    /// Extractor confidence that the point is visible (0-1)
    #[serde(default = "full_visibility", alias = "confidence")]
    pub visibility: f64,
}

fn full_visibility() -> f64 {
    1.0
}

impl Landmark {
    /// Create a fully visible 2-D landmark.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            visibility: 1.0,
        }
    }

    /// Set the visibility confidence.
    pub fn with_visibility(mut self, visibility: f64) -> Self {
        self.visibility = visibility;
        self
    }

    /// Planar Euclidean distance to another landmark.
    pub fn distance(&self, other: &Landmark) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether the coordinates are usable.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One pose-extractor result: the ordered landmark list for a single person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseFrame {
    pub landmarks: Vec<Landmark>,
    /// When the result was produced
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl PoseFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            captured_at: Utc::now(),
        }
    }

    /// The left/right shoulder pair, if both are present with finite
    /// coordinates. Visibility is carried along but not filtered on.
    pub fn shoulders(&self) -> Option<(Landmark, Landmark)> {
        let left = *self.landmarks.get(LEFT_SHOULDER)?;
        let right = *self.landmarks.get(RIGHT_SHOULDER)?;

        if left.is_finite() && right.is_finite() {
            Some((left, right))
        } else {
            None
        }
    }
}

/// A still image grabbed from the live video source.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// MIME type of the encoded image (e.g. `image/jpeg`)
    pub mime: String,
    /// Encoded image bytes
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// Encode the frame as a `data:` URL, the form the emotion service expects.
    pub fn to_data_url(&self) -> String {
        use base64::Engine;
        let payload = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{}", self.mime, payload)
    }
}
