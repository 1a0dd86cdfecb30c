//! Input sources for the fusion loop.
//!
//! The pose extractor and the camera are external collaborators. This module
//! defines what the loop needs from them and provides recorded and noop
//! implementations.

pub mod noop;
pub mod replay;
pub mod types;

// Re-export commonly used types
pub use noop::NoopFrameSource;
pub use replay::{parse_recording, DirectoryFrameSource, ReplayConfig, ReplayLandmarkSource};
pub use types::{Landmark, PoseFrame, VideoFrame, LEFT_SHOULDER, RIGHT_SHOULDER};

/// A source of still frames from the live video.
pub trait FrameSource {
    /// Grab the current frame, or `None` when the source is not ready yet
    /// (no active stream, not enough buffered data).
    fn capture(&mut self) -> Option<VideoFrame>;
}

/// Errors that can occur while setting up an input source.
#[derive(Debug)]
pub enum SourceError {
    Io(String),
    AlreadyStarted,
    InvalidRate(f64),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "IO error: {e}"),
            SourceError::AlreadyStarted => write!(f, "Source has already been started"),
            SourceError::InvalidRate(fps) => write!(f, "Invalid replay rate: {fps} fps"),
        }
    }
}

impl std::error::Error for SourceError {}
