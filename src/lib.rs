//! # Trackfuse - Temporal Tracking & Event Fusion
//!
//! Trackfuse turns noisy per-frame object detections into stable,
//! rate-limited events. It is the temporal core of video analytics
//! pipelines whose detector is an external collaborator: the detector hands
//! over labeled, scored boxes once per frame, and this crate does the rest.
//!
//! ## Components
//!
//! - [`Tracker`] - multi-object tracker with two-stage confidence-aware
//!   assignment and a constant-velocity motion model
//! - [`CoverFusion`] - merges overlapping detections of complementary labels
//!   into one compound detection
//! - [`SequenceStatistic`] - per-track duty-cycle debounce that emits
//!   rising-edge events
//! - [`EventPipeline`] - the three above composed in frame order
//!
//! ## Example
//!
//! ```rust
//! use trackfuse::{Detection, Rect, Tracker, TrackerConfig};
//!
//! let mut tracker = Tracker::new(TrackerConfig::default()).unwrap();
//!
//! let detections = vec![Detection::new("person", 0, 0.9, Rect::new(100, 100, 40, 80))];
//! let tracked = tracker.update(&detections);
//! assert_eq!(tracked.len(), 1);
//! assert!(tracked[0].track_id.is_some());
//! ```
//!
//! All stateful components are single-owner, synchronous, and per-stream:
//! one [`Tracker`] and one [`SequenceStatistic`] per video stream. Only
//! [`CoverFusion`] is stateless and freely shareable.

pub mod detection;
pub mod fusion;
pub mod geometry;
pub mod pipeline;
pub mod sequence;
pub mod tracker;

// Re-exports for convenience
pub use detection::Detection;
pub use fusion::CoverFusion;
pub use geometry::Rect;
pub use pipeline::{sort_candidates, EventPipeline};
pub use sequence::SequenceStatistic;
pub use tracker::{Track, TrackState, Tracker, TrackerConfig};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur in trackfuse.
    ///
    /// The frame path itself is infallible: malformed boxes and empty
    /// detection lists are handled by no-op paths, never surfaced. Only
    /// construction-time configuration is validated.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),
    }

    /// Result type for trackfuse operations.
    pub type Result<T> = std::result::Result<T, Error>;
}
