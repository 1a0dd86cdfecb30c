//! A frame source that is never ready.
//!
//! Used when no video input is configured so the movement path can run on
//! its own; every face-pipeline tick is skipped.

use crate::source::types::VideoFrame;
use crate::source::FrameSource;

/// A frame source that never produces frames.
#[derive(Debug, Default)]
pub struct NoopFrameSource;

impl NoopFrameSource {
    pub fn new() -> Self {
        Self
    }
}

impl FrameSource for NoopFrameSource {
    fn capture(&mut self) -> Option<VideoFrame> {
        None
    }
}
