//! Recorded input sources.
//!
//! `ReplayLandmarkSource` plays back a pose recording (one JSON landmark list
//! per line, `null` or `[]` when nobody is in frame) at a fixed frame rate on
//! a background thread. `DirectoryFrameSource` serves still images from a
//! directory in name order, standing in for the live camera.

use crate::source::types::{Landmark, PoseFrame, VideoFrame};
use crate::source::{FrameSource, SourceError};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Configuration for a pose recording replay.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Path to the JSON-lines recording
    pub path: PathBuf,
    /// Playback rate in frames per second
    pub fps: f64,
    /// Start over when the recording ends
    pub repeat: bool,
}

/// Parsed recording: `None` entries are frames with no person detected.
pub type Recording = Vec<Option<Vec<Landmark>>>;

/// Parse a JSON-lines pose recording.
///
/// Blank lines are ignored. Lines that fail to parse are skipped with a
/// warning; the count of skipped lines is returned alongside the frames.
pub fn parse_recording(text: &str) -> (Recording, usize) {
    let mut frames = Vec::new();
    let mut skipped = 0;

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Option<Vec<Landmark>>>(line) {
            Ok(Some(landmarks)) if landmarks.is_empty() => frames.push(None),
            Ok(entry) => frames.push(entry),
            Err(e) => {
                tracing::warn!("Skipping recording line {}: {}", line_no + 1, e);
                skipped += 1;
            }
        }
    }

    (frames, skipped)
}

/// Replays a pose recording as a stream of `PoseFrame`s.
pub struct ReplayLandmarkSource {
    config: ReplayConfig,
    sender: Option<Sender<PoseFrame>>,
    receiver: Receiver<PoseFrame>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReplayLandmarkSource {
    /// Create a new replay source. Nothing is read until `start`.
    pub fn new(config: ReplayConfig) -> Self {
        let (sender, receiver) = bounded(256);
        Self {
            config,
            sender: Some(sender),
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Load the recording and start playback.
    ///
    /// The receiver disconnects once playback finishes (never, when
    /// repeating) or after `stop`.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if !(self.config.fps.is_finite() && self.config.fps > 0.0) {
            return Err(SourceError::InvalidRate(self.config.fps));
        }
        let sender = self.sender.take().ok_or(SourceError::AlreadyStarted)?;

        let text = std::fs::read_to_string(&self.config.path)
            .map_err(|e| SourceError::Io(format!("{}: {e}", self.config.path.display())))?;
        let (recording, skipped) = parse_recording(&text);
        tracing::info!(
            "Loaded pose recording with {} frames ({} skipped)",
            recording.len(),
            skipped
        );

        let frame_interval = Duration::from_secs_f64(1.0 / self.config.fps);
        let repeat = self.config.repeat;
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::SeqCst);

        self.handle = Some(thread::spawn(move || {
            play(&recording, &sender, &running, frame_interval, repeat);
            running.store(false, Ordering::SeqCst);
        }));

        Ok(())
    }

    /// Stop playback and wait for the replay thread to exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Unblock a sender waiting on a full channel.
        while self.receiver.try_recv().is_ok() {}
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Check if playback is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for pose frames.
    pub fn receiver(&self) -> &Receiver<PoseFrame> {
        &self.receiver
    }
}

impl Drop for ReplayLandmarkSource {
    fn drop(&mut self) {
        self.stop();
    }
}

fn play(
    recording: &Recording,
    sender: &Sender<PoseFrame>,
    running: &AtomicBool,
    frame_interval: Duration,
    repeat: bool,
) {
    loop {
        for entry in recording {
            if !running.load(Ordering::SeqCst) {
                return;
            }
            // No person in frame: the extractor produces no result at all.
            if let Some(landmarks) = entry {
                if sender.send(PoseFrame::new(landmarks.clone())).is_err() {
                    return;
                }
            }
            thread::sleep(frame_interval);
        }
        if !repeat || recording.is_empty() {
            return;
        }
    }
}

const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
];

/// Serves the images of a directory in a loop as the live video feed.
pub struct DirectoryFrameSource {
    files: Vec<(PathBuf, &'static str)>,
    next: usize,
    width: u32,
    height: u32,
}

impl DirectoryFrameSource {
    /// Index the images in `dir`. Frames report the given capture size.
    pub fn new(dir: &Path, width: u32, height: u32) -> Result<Self, SourceError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SourceError::Io(format!("{}: {e}", dir.display())))?;

        let mut files: Vec<(PathBuf, &'static str)> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| {
                let ext = path.extension()?.to_str()?.to_lowercase();
                let mime = IMAGE_EXTENSIONS
                    .iter()
                    .find(|(known, _)| *known == ext)
                    .map(|(_, mime)| *mime)?;
                Some((path, mime))
            })
            .collect();
        files.sort();

        tracing::info!("Frame directory {} has {} images", dir.display(), files.len());

        Ok(Self {
            files,
            next: 0,
            width,
            height,
        })
    }

    /// Number of images available.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn capture(&mut self) -> Option<VideoFrame> {
        if self.files.is_empty() {
            return None;
        }
        let (path, mime) = &self.files[self.next];
        self.next = (self.next + 1) % self.files.len();

        match std::fs::read(path) {
            Ok(data) => Some(VideoFrame {
                width: self.width,
                height: self.height,
                mime: (*mime).to_string(),
                data,
            }),
            Err(e) => {
                tracing::debug!("Frame {} unreadable: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fidget-sentinel-{name}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_parse_recording() {
        let text = r#"
[{"x": 0.1, "y": 0.2}]
null
[]
not json
[{"x": 0.3, "y": 0.4, "visibility": 0.9}]
"#;
        let (frames, skipped) = parse_recording(text);
        assert_eq!(skipped, 1);
        assert_eq!(frames.len(), 4);
        assert!(frames[1].is_none());
        assert!(frames[2].is_none());
        assert_eq!(frames[3].as_ref().unwrap()[0].visibility, 0.9);
    }

    #[test]
    fn test_replay_emits_person_frames_then_disconnects() {
        let dir = temp_dir("replay");
        let path = dir.join("poses.jsonl");
        std::fs::write(
            &path,
            "[{\"x\": 0.1, \"y\": 0.2}]\nnull\n[{\"x\": 0.3, \"y\": 0.4}]\n",
        )
        .unwrap();

        let mut source = ReplayLandmarkSource::new(ReplayConfig {
            path,
            fps: 200.0,
            repeat: false,
        });
        source.start().unwrap();

        let frames: Vec<PoseFrame> = source.receiver().iter().collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].landmarks[0].x, 0.3);

        assert!(matches!(source.start(), Err(SourceError::AlreadyStarted)));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_replay_rejects_bad_rate() {
        let mut source = ReplayLandmarkSource::new(ReplayConfig {
            path: PathBuf::from("unused.jsonl"),
            fps: 0.0,
            repeat: false,
        });
        assert!(matches!(source.start(), Err(SourceError::InvalidRate(_))));
    }

    #[test]
    fn test_replay_missing_file() {
        let mut source = ReplayLandmarkSource::new(ReplayConfig {
            path: PathBuf::from("/nonexistent/poses.jsonl"),
            fps: 30.0,
            repeat: false,
        });
        assert!(matches!(source.start(), Err(SourceError::Io(_))));
    }

    #[test]
    fn test_directory_source_cycles_images() {
        let dir = temp_dir("frames");
        std::fs::write(dir.join("b.png"), b"second").unwrap();
        std::fs::write(dir.join("a.jpg"), b"first").unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let mut source = DirectoryFrameSource::new(&dir, 640, 480).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.capture().unwrap();
        assert_eq!(first.data, b"first");
        assert_eq!(first.mime, "image/jpeg");
        assert_eq!((first.width, first.height), (640, 480));

        let second = source.capture().unwrap();
        assert_eq!(second.mime, "image/png");

        let again = source.capture().unwrap();
        assert_eq!(again.data, b"first");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_empty_directory_is_not_ready() {
        let dir = temp_dir("empty");
        let mut source = DirectoryFrameSource::new(&dir, 640, 480).unwrap();
        assert!(source.is_empty());
        assert!(source.capture().is_none());
        let _ = std::fs::remove_dir_all(dir);
    }
}
