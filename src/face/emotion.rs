//! Emotion taxonomy and prediction values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The fixed set of emotions the remote classifier scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Angry,
    Neutral,
    Happy,
    Fear,
    Surprise,
    Sad,
    Disgust,
}

impl EmotionLabel {
    /// All labels in display order.
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::Angry,
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Fear,
        EmotionLabel::Surprise,
        EmotionLabel::Sad,
        EmotionLabel::Disgust,
    ];

    /// Wire key used by the emotion service.
    pub fn key(&self) -> &'static str {
        match self {
            EmotionLabel::Angry => "angry",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Surprise => "surprise",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Disgust => "disgust",
        }
    }

    /// Name shown next to the confidence bar.
    pub fn display_name(&self) -> &'static str {
        match self {
            EmotionLabel::Angry => "Angry",
            EmotionLabel::Neutral => "Neutral",
            EmotionLabel::Happy => "Happy",
            EmotionLabel::Fear => "Fear",
            EmotionLabel::Surprise => "Surprised",
            EmotionLabel::Sad => "Sad",
            EmotionLabel::Disgust => "Disgusted",
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Per-emotion probabilities in `[0, 1]`. Need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionVector {
    pub angry: f64,
    pub neutral: f64,
    pub happy: f64,
    pub fear: f64,
    pub surprise: f64,
    pub sad: f64,
    pub disgust: f64,
}

impl EmotionVector {
    pub fn get(&self, label: EmotionLabel) -> f64 {
        match label {
            EmotionLabel::Angry => self.angry,
            EmotionLabel::Neutral => self.neutral,
            EmotionLabel::Happy => self.happy,
            EmotionLabel::Fear => self.fear,
            EmotionLabel::Surprise => self.surprise,
            EmotionLabel::Sad => self.sad,
            EmotionLabel::Disgust => self.disgust,
        }
    }

    /// Whether every score is a finite number.
    pub fn is_finite(&self) -> bool {
        EmotionLabel::ALL.iter().all(|l| self.get(*l).is_finite())
    }

    /// Integer percentages for the confidence bars.
    pub fn percentages(&self) -> BTreeMap<EmotionLabel, u8> {
        EmotionLabel::ALL
            .iter()
            .map(|label| (*label, to_percent(self.get(*label))))
            .collect()
    }

    /// The highest-scoring label (first in display order on ties).
    pub fn dominant(&self) -> EmotionLabel {
        EmotionLabel::ALL
            .iter()
            .copied()
            .fold(EmotionLabel::Angry, |best, label| {
                if self.get(label) > self.get(best) {
                    label
                } else {
                    best
                }
            })
    }
}

/// One successful response from the emotion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    pub predictions: EmotionVector,
    /// Dominant emotion as named by the service
    pub emotion: String,
}

/// Convert a probability to a whole percentage.
///
/// Rounds half up (`0.5 -> 50`, `0.994 -> 99`, `0.995 -> 100`) and clamps to
/// `0..=100`. Non-finite input maps to 0.
pub fn to_percent(probability: f64) -> u8 {
    if !probability.is_finite() {
        return 0;
    }
    (probability * 100.0).round().clamp(0.0, 100.0) as u8
}
