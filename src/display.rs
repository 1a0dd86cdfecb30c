//! Operator display: per-emotion confidence bars, the current label, the
//! fidgeting alert and the face overlay.
//!
//! `DisplayState` holds what is currently shown. It only changes through
//! `apply`, so a dropped prediction leaves the previous values in place.
//! Drawing is delegated to a `Renderer`.

use crate::core::alert::AlertState;
use crate::face::detector::FaceBox;
use crate::face::emotion::{EmotionLabel, EmotionVector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Label shown before the first prediction arrives.
pub const INITIAL_LABEL: &str = "Neutral";

/// Face geometry and prediction to draw over the video for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub tick_id: u64,
    pub width: u32,
    pub height: u32,
    pub faces: Vec<FaceBox>,
    pub label: String,
    pub predictions: EmotionVector,
}

/// New display values from one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayUpdate {
    pub percentages: BTreeMap<EmotionLabel, u8>,
    pub label: String,
    pub overlay: Overlay,
}

/// Values currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayState {
    percentages: BTreeMap<EmotionLabel, u8>,
    label: String,
    updates: u64,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            percentages: EmotionLabel::ALL.iter().map(|l| (*l, 0)).collect(),
            label: INITIAL_LABEL.to_string(),
            updates: 0,
        }
    }
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the bar values and label from an update.
    pub fn apply(&mut self, update: &DisplayUpdate) {
        for (label, percent) in &update.percentages {
            self.percentages.insert(*label, (*percent).min(100));
        }
        self.label = update.label.clone();
        self.updates += 1;
    }

    /// Bar value for one emotion (0-100).
    pub fn percent(&self, label: EmotionLabel) -> u8 {
        self.percentages.get(&label).copied().unwrap_or(0)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of predictions applied so far.
    pub fn update_count(&self) -> u64 {
        self.updates
    }
}

/// Draws the display. Implementations own the actual surface.
pub trait Renderer {
    /// Redraw the bars, label and alert.
    fn present(&mut self, display: &DisplayState, alert: &AlertState);

    /// Draw face geometry and label over the frame.
    fn draw_overlay(&mut self, overlay: &Overlay);
}

/// Plain-text renderer for terminals and logs.
pub struct TerminalRenderer<W: Write> {
    out: W,
    bar_width: usize,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, bar_width: 20 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bar(&self, percent: u8) -> String {
        let filled = self.bar_width * percent as usize / 100;
        format!("{}{}", "#".repeat(filled), ".".repeat(self.bar_width - filled))
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn present(&mut self, display: &DisplayState, alert: &AlertState) {
        let mut text = String::new();
        if alert.active {
            text.push_str(&format!("!! {}\n", alert.message));
        }
        for label in EmotionLabel::ALL {
            let percent = display.percent(label);
            text.push_str(&format!(
                "{:<10} [{}] {:>3}%\n",
                label.display_name(),
                self.bar(percent),
                percent
            ));
        }
        text.push_str(&format!("Emotion: {}\n", display.label()));

        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!("Display write failed: {}", e);
        }
    }

    fn draw_overlay(&mut self, overlay: &Overlay) {
        let mut text = format!(
            "[{}x{}] {} face(s), label '{}'\n",
            overlay.width,
            overlay.height,
            overlay.faces.len(),
            overlay.label
        );
        for face in &overlay.faces {
            text.push_str(&format!(
                "  box ({:.0},{:.0}) {:.0}x{:.0} p={:.2}\n",
                face.top_left[0],
                face.top_left[1],
                face.width(),
                face.height(),
                face.probability
            ));
        }

        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            tracing::debug!("Overlay write failed: {}", e);
        }
    }
}
