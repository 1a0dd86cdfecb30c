//! Session statistics for the Fidget Sentinel.
//!
//! Counts what both pipelines processed, raised and dropped during the live
//! session so the operator can see why the display did or did not update.

pub mod session;

// Re-export commonly used types
pub use session::{create_shared_stats, SessionStats, SessionSummary, SharedSessionStats};
