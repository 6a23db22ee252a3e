//! Multi-object tracker.
//!
//! Assigns stable identities to per-frame detections using a constant
//! velocity motion model and two-stage confidence-aware assignment:
//! high-confidence detections are matched against all live tracks first,
//! then low-confidence ones get a chance to claim the leftovers. The second
//! stage recovers tracks whose detection score momentarily dipped without
//! letting noisy low-confidence boxes fragment identities.

mod matching;
mod track;

pub use track::{Track, TrackState};

use crate::detection::Detection;
use crate::{Error, Result};
use matching::{iou_cost, linear_assignment};

/// Configuration for the tracker.
///
/// Defaults match the production pipelines this engine was extracted from:
/// low/high confidence split at 0.3/0.6, minimum match IoU 0.2, 30-frame
/// removal horizon.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Detections scoring at least this much enter the first matching stage.
    pub high_thresh: f32,

    /// Detections scoring at least this much (but below `high_thresh`)
    /// enter the second matching stage; anything lower is dropped.
    pub low_thresh: f32,

    /// Minimum IoU between a predicted box and a detection box for a valid
    /// match (assignment is gated at cost `1 - match_thresh`).
    pub match_thresh: f64,

    /// Frames a track may stay unmatched before it is removed.
    pub max_frames_lost: u32,

    /// Predicted-box IoU above which two tracks count as duplicates of the
    /// same object; the one with the shorter match history is discarded.
    pub dup_iou_thresh: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            high_thresh: 0.6,
            low_thresh: 0.3,
            match_thresh: 0.2,
            max_frames_lost: 30,
            dup_iou_thresh: 0.9,
        }
    }
}

impl TrackerConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.high_thresh) || !(0.0..=1.0).contains(&self.low_thresh) {
            return Err(Error::InvalidConfig(
                "confidence thresholds must be within [0, 1]".to_string(),
            ));
        }
        if self.low_thresh >= self.high_thresh {
            return Err(Error::InvalidConfig(format!(
                "low_thresh ({}) must be below high_thresh ({})",
                self.low_thresh, self.high_thresh
            )));
        }
        if !(0.0..=1.0).contains(&self.match_thresh) {
            return Err(Error::InvalidConfig(
                "match_thresh must be within [0, 1]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.dup_iou_thresh) {
            return Err(Error::InvalidConfig(
                "dup_iou_thresh must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Multi-object tracker.
///
/// One instance per video stream; `update` must be called exactly once per
/// frame, in frame order. An empty detection list is a valid frame and
/// simply ages every track toward `Lost` and removal.
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_id: u32,
    frame_id: u64,
}

impl Tracker {
    /// Create a new tracker with the given configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tracks: Vec::new(),
            next_id: 0,
            frame_id: 0,
        })
    }

    /// Process one frame of detections and return the currently `Tracked`
    /// set as detections carrying their track identity.
    pub fn update(&mut self, detections: &[Detection]) -> Vec<Detection> {
        self.frame_id += 1;
        let cost_gate = 1.0 - self.config.match_thresh;

        // Predict: every live track advances one step before matching.
        for track in &mut self.tracks {
            track.predict();
        }

        // Partition detections by confidence.
        let mut high: Vec<usize> = Vec::new();
        let mut low: Vec<usize> = Vec::new();
        for (idx, det) in detections.iter().enumerate() {
            if det.score >= self.config.high_thresh {
                high.push(idx);
            } else if det.score >= self.config.low_thresh {
                low.push(idx);
            }
        }

        let mut matched_this_frame = vec![false; self.tracks.len()];

        // Stage 1: high-confidence detections against all live tracks.
        let track_indices: Vec<usize> = (0..self.tracks.len()).collect();
        let stage1 = {
            let predicted: Vec<_> = track_indices
                .iter()
                .map(|&t| self.tracks[t].predicted_rect())
                .collect();
            let dets: Vec<&Detection> = high.iter().map(|&d| &detections[d]).collect();
            linear_assignment(&iou_cost(&predicted, &dets), cost_gate)
        };
        for &(t, d) in &stage1.matches {
            let track_idx = track_indices[t];
            self.tracks[track_idx].update(&detections[high[d]]);
            matched_this_frame[track_idx] = true;
        }

        // Stage 2: low-confidence detections against the leftover tracks.
        let remaining: Vec<usize> = stage1
            .unmatched_tracks
            .iter()
            .map(|&t| track_indices[t])
            .collect();
        let stage2 = {
            let predicted: Vec<_> = remaining
                .iter()
                .map(|&t| self.tracks[t].predicted_rect())
                .collect();
            let dets: Vec<&Detection> = low.iter().map(|&d| &detections[d]).collect();
            linear_assignment(&iou_cost(&predicted, &dets), cost_gate)
        };
        for &(t, d) in &stage2.matches {
            let track_idx = remaining[t];
            self.tracks[track_idx].update(&detections[low[d]]);
            matched_this_frame[track_idx] = true;
        }

        // Tracks unmatched after both stages decay toward removal.
        for (idx, track) in self.tracks.iter_mut().enumerate() {
            if !matched_this_frame[idx] {
                track.mark_lost();
                if track.frames_since_match > self.config.max_frames_lost {
                    track.mark_removed();
                }
            }
        }

        // Unmatched high-confidence detections found a new object. Leftover
        // low-confidence boxes are noise by definition and are dropped.
        for &d in &stage1.unmatched_detections {
            let track = Track::new(self.next_id, &detections[high[d]]);
            self.next_id += 1;
            self.tracks.push(track);
        }

        self.prune_duplicates();
        self.tracks.retain(|t| t.state != TrackState::Removed);

        self.tracks
            .iter()
            .filter(|t| t.state == TrackState::Tracked)
            .map(Track::to_detection)
            .collect()
    }

    /// All live tracks, `Tracked` and `Lost` alike.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of frames processed so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Total identities handed out over the tracker's lifetime.
    pub fn total_track_count(&self) -> u32 {
        self.next_id
    }

    // Two tracks whose predicted boxes nearly coincide are one physical
    // object; keep the one with the longer match history (older id wins a
    // tie) to avoid identity fragmentation.
    fn prune_duplicates(&mut self) {
        let live: Vec<usize> = (0..self.tracks.len())
            .filter(|&i| self.tracks[i].state != TrackState::Removed)
            .collect();

        for a in 0..live.len() {
            for b in (a + 1)..live.len() {
                let (ia, ib) = (live[a], live[b]);
                if self.tracks[ia].state == TrackState::Removed
                    || self.tracks[ib].state == TrackState::Removed
                {
                    continue;
                }
                let overlap = self.tracks[ia]
                    .predicted_rect()
                    .iou(&self.tracks[ib].predicted_rect());
                if overlap >= self.config.dup_iou_thresh {
                    let loser = if self.tracks[ia].hits >= self.tracks[ib].hits {
                        ib
                    } else {
                        ia
                    };
                    log::debug!(
                        "pruning duplicate track {} (overlap {:.2})",
                        self.tracks[loser].id,
                        overlap
                    );
                    self.tracks[loser].mark_removed();
                }
            }
        }
    }
}
