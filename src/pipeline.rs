//! Frame pipeline: fusion, tracking, and temporal statistics composed.
//!
//! Every production pipeline wires the same chain per frame:
//! detections -> (optional cover fusion) -> tracker -> sequence statistic
//! -> emitted events. [`EventPipeline`] owns that chain for one stream so
//! a caller hands detections in and gets debounced alerts out.

use std::time::{Duration, Instant};

use crate::detection::Detection;
use crate::fusion::CoverFusion;
use crate::sequence::SequenceStatistic;
use crate::tracker::{Tracker, TrackerConfig};
use crate::Result;

/// One stream's worth of tracking-and-event state.
///
/// Single-owner like its parts: one instance per video stream, one
/// `process` call per frame, in frame order.
#[derive(Debug)]
pub struct EventPipeline {
    fusion: Option<CoverFusion>,
    tracker: Tracker,
    statistic: SequenceStatistic,
}

impl EventPipeline {
    /// Build a pipeline without fusion: raw detections are tracked and
    /// debounced directly.
    pub fn new(
        tracker_config: TrackerConfig,
        statistic_interval: Duration,
        statistic_threshold: f64,
    ) -> Result<Self> {
        Ok(Self {
            fusion: None,
            tracker: Tracker::new(tracker_config)?,
            statistic: SequenceStatistic::new(statistic_interval, statistic_threshold)?,
        })
    }

    /// Insert a cover fusion stage ahead of the tracker.
    pub fn with_fusion(mut self, fusion: CoverFusion) -> Self {
        self.fusion = Some(fusion);
        self
    }

    /// Process one frame against the wall clock.
    pub fn process(&mut self, detections: &[Detection]) -> Vec<Detection> {
        self.process_at(detections, Instant::now())
    }

    /// Process one frame at an explicit instant (deterministic-clock seam).
    ///
    /// Returns the rising-edge events for this frame, each carrying the
    /// track identity that sustained it.
    pub fn process_at(&mut self, detections: &[Detection], now: Instant) -> Vec<Detection> {
        let fused;
        let input = match &self.fusion {
            Some(fusion) => {
                fused = fusion.fuse(detections);
                fused.as_slice()
            }
            None => detections,
        };

        let tracked = self.tracker.update(input);
        self.statistic.update_at(&tracked, now)
    }

    /// The tracker owned by this pipeline.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// The statistics engine owned by this pipeline.
    pub fn statistic(&self) -> &SequenceStatistic {
        &self.statistic
    }
}

/// Order detections by `score x area` descending and keep the best `limit`.
///
/// Cascading pipelines crop the top candidates out of the frame and re-run
/// a secondary detector on them; this is the shared candidate ordering they
/// apply before cropping. Ties keep input order.
pub fn sort_candidates(detections: &mut Vec<Detection>, limit: usize) {
    detections.sort_by(|a, b| {
        let ka = a.score as f64 * a.rect.area() as f64;
        let kb = b.score as f64 * b.rect.area() as f64;
        kb.partial_cmp(&ka).unwrap_or(std::cmp::Ordering::Equal)
    });
    detections.truncate(limit);
}
