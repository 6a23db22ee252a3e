//! Track struct and its constant-velocity motion model.

use nalgebra::SVector;

use crate::detection::Detection;
use crate::geometry::Rect;

/// Lifecycle state of a track.
///
/// `Tracked -> Lost -> Removed`, with `Lost -> Tracked` on a re-match
/// before the removal horizon. `Removed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Tracked,
    Lost,
    Removed,
}

/// Motion state layout: [cx, cy, w, h, vcx, vcy, vw, vh].
type MotionState = SVector<f64, 8>;

/// A persistent object hypothesis owned by the tracker.
///
/// Identity is assigned once and never reused for the lifetime of a
/// tracker instance. `rect` always holds the last *observed* box; the
/// motion state carries the extrapolated box used for matching.
#[derive(Debug, Clone)]
pub struct Track {
    /// Unique, monotonically increasing identity.
    pub id: u32,

    /// Label of the most recent matched detection.
    pub label: String,

    /// Class id of the most recent matched detection.
    pub class_id: i32,

    /// Score of the most recent matched detection.
    pub score: f32,

    /// Last observed bounding box.
    pub rect: Rect,

    /// Lifecycle state.
    pub state: TrackState,

    /// Frames elapsed since the last successful match.
    pub frames_since_match: u32,

    /// Total number of matched frames, used when pruning near-duplicates.
    pub hits: u32,

    mean: MotionState,
}

impl Track {
    pub(crate) fn new(id: u32, detection: &Detection) -> Self {
        let (cx, cy) = detection.rect.center();
        let mut mean = MotionState::zeros();
        mean[0] = cx;
        mean[1] = cy;
        mean[2] = detection.rect.width as f64;
        mean[3] = detection.rect.height as f64;

        Self {
            id,
            label: detection.label.clone(),
            class_id: detection.class_id,
            score: detection.score,
            rect: detection.rect,
            state: TrackState::Tracked,
            frames_since_match: 0,
            hits: 1,
            mean,
        }
    }

    /// Advance the motion state one frame by the current velocity.
    ///
    /// Called exactly once per frame for every live track, before matching.
    /// Size extrapolation is clamped so a shrinking box never goes
    /// degenerate.
    pub(crate) fn predict(&mut self) {
        for i in 0..4 {
            self.mean[i] += self.mean[i + 4];
        }
        self.mean[2] = self.mean[2].max(1.0);
        self.mean[3] = self.mean[3].max(1.0);
    }

    /// The extrapolated box used for matching this frame.
    pub fn predicted_rect(&self) -> Rect {
        let w = self.mean[2];
        let h = self.mean[3];
        Rect {
            x: (self.mean[0] - w / 2.0).round() as i32,
            y: (self.mean[1] - h / 2.0).round() as i32,
            width: w.round() as i32,
            height: h.round() as i32,
        }
    }

    /// Absorb a matched detection: re-estimate velocity from the observed
    /// delta, snap the state to the observation, return to `Tracked`.
    pub(crate) fn update(&mut self, detection: &Detection) {
        let (cx, cy) = detection.rect.center();
        let observed = [
            cx,
            cy,
            detection.rect.width as f64,
            detection.rect.height as f64,
        ];
        let (pcx, pcy) = self.rect.center();
        let previous = [pcx, pcy, self.rect.width as f64, self.rect.height as f64];

        // Velocity per elapsed frame, so a re-match after N lost frames
        // does not inflate the estimate N-fold.
        let elapsed = (self.frames_since_match + 1) as f64;
        for i in 0..4 {
            self.mean[i] = observed[i];
            self.mean[i + 4] = (observed[i] - previous[i]) / elapsed;
        }

        self.label = detection.label.clone();
        self.class_id = detection.class_id;
        self.score = detection.score;
        self.rect = detection.rect;
        self.state = TrackState::Tracked;
        self.frames_since_match = 0;
        self.hits += 1;
    }

    pub(crate) fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
        self.frames_since_match += 1;
    }

    pub(crate) fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
    }

    /// Render the track as a detection carrying its identity.
    pub fn to_detection(&self) -> Detection {
        Detection::new(self.label.clone(), self.class_id, self.score, self.rect)
            .with_track_id(self.id)
    }
}
