//! Detection struct for input to the tracker and the event engines.

use crate::geometry::Rect;

/// One per-frame observation produced by an external detector.
///
/// Detections are created fresh every frame and consumed by the tracker,
/// the cover fusion engine, or the sequence statistic; they are never
/// mutated in place. `track_id` is `None` as produced by a detector and
/// `Some` once the detection has passed through a [`Tracker`].
///
/// [`Tracker`]: crate::Tracker
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class label as reported by the detector.
    pub label: String,

    /// Numeric class id as reported by the detector.
    pub class_id: i32,

    /// Confidence score in [0, 1].
    pub score: f32,

    /// Bounding box in image pixel coordinates.
    pub rect: Rect,

    /// Track identity, present after tracking.
    pub track_id: Option<u32>,

    /// Name of the originating detector stage, when the caller runs several.
    pub detector: Option<String>,
}

impl Detection {
    /// Create a new detection.
    pub fn new(label: impl Into<String>, class_id: i32, score: f32, rect: Rect) -> Self {
        Self {
            label: label.into(),
            class_id,
            score,
            rect,
            track_id: None,
            detector: None,
        }
    }

    /// Attach a track identity.
    pub fn with_track_id(mut self, track_id: u32) -> Self {
        self.track_id = Some(track_id);
        self
    }

    /// Attach the originating detector name.
    pub fn with_detector(mut self, detector: impl Into<String>) -> Self {
        self.detector = Some(detector.into());
        self
    }
}
