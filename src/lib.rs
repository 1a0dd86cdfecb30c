//! Fidget Sentinel - real-time fidgeting alerts and facial-expression
//! display from a live camera feed.
//!
//! Two independent pipelines run over the same video:
//!
//! - **Movement path**: pose results feed a windowed shoulder-movement
//!   detector; detected movement raises a debounced, self-clearing alert.
//! - **Face path**: every tick a frame is captured, faces are detected and
//!   the snapshot is sent to a remote emotion classifier; replies update the
//!   per-emotion confidence bars and the face overlay.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Fidget Sentinel                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐            │
//! │  │  Landmark   │──▶│  Movement   │──▶│   Alert     │──┐         │
//! │  │   Source    │   │  Detector   │   │  Presenter  │  │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘  ▼         │
//! │                                                   ┌─────────┐   │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────┐  │ Display │   │
//! │  │ Frame timer │──▶│Face detector│──▶│ Emotion │─▶│+ overlay│   │
//! │  │  (100 ms)   │   │ + snapshot  │   │ service │  └─────────┘   │
//! │  └─────────────┘   └─────────────┘   └─────────┘                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fidget_sentinel::core::{AlertPresenter, MovementDetector};
//! use fidget_sentinel::source::Landmark;
//! use std::time::Instant;
//!
//! let mut detector = MovementDetector::default();
//! let mut presenter = AlertPresenter::default();
//!
//! let right = Landmark::new(0.60, 0.50);
//! for x in [0.40, 0.40, 0.41, 0.44] {
//!     if let Some(signal) = detector.observe_now(Landmark::new(x, 0.50), right) {
//!         presenter.on_signal(&signal, Instant::now());
//!     }
//! }
//! assert!(presenter.is_active());
//! ```

pub mod config;
pub mod core;
pub mod display;
pub mod emotion_client;
pub mod face;
pub mod fusion;
pub mod source;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{AlertPresenter, AlertState, MovementDetector, MovementSignal};
pub use display::{DisplayState, Renderer, TerminalRenderer};
pub use emotion_client::{EmotionClient, EmotionDispatcher, EmotionError, EmotionServiceConfig};
pub use face::{EmotionLabel, EmotionPrediction, EmotionVector, FacePipeline};
pub use fusion::{FusionLoop, LoopChannels, StopReason};
pub use source::{Landmark, PoseFrame, VideoFrame};
pub use stats::{SessionStats, SharedSessionStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What the sentinel looks at and where it goes, shown at startup.
pub const SESSION_NOTICE: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║                 FIDGET SENTINEL - SESSION NOTICE                 ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  ✓ PROCESSED LOCALLY:                                            ║
║    • Shoulder positions from the pose extractor                  ║
║    • Face boxes from the face detector                           ║
║                                                                  ║
║  ✓ SENT TO THE EMOTION SERVICE:                                  ║
║    • One still frame per tick (every 100 ms)                     ║
║                                                                  ║
║  ✗ NEVER KEPT:                                                   ║
║    • Nothing is written to disk; movement history holds only     ║
║      the last 5 samples and ends with the session                ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
