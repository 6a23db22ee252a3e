//! Cover fusion: merging co-occurring detections into compound events.
//!
//! Some semantic conditions only exist as a conjunction of independently
//! detected cues - a hand box overlapping a phone box means "using a
//! phone". The fusion engine takes one frame's detections and a label
//! grouping rule, and emits a compound detection wherever every label in
//! the include set piles up on the same spot.
//!
//! Overlap is measured as intersection over the *smaller* area rather than
//! IoU: the accumulated cues are typically small features sitting inside a
//! larger context box, which symmetric IoU would systematically
//! under-count.

use std::collections::BTreeSet;

use crate::detection::Detection;
use crate::{Error, Result};

/// Stateless label-grouping fusion engine.
///
/// Holds only immutable configuration, so one instance may be shared
/// freely across streams and threads.
#[derive(Debug, Clone)]
pub struct CoverFusion {
    include_labels: BTreeSet<String>,
    exclude_labels: BTreeSet<String>,
    output_label: String,
    cover_threshold: f64,
}

impl CoverFusion {
    /// Create a fusion rule.
    ///
    /// # Arguments
    /// * `include_labels` - cues that must jointly appear
    /// * `exclude_labels` - cues whose overlapping presence vetoes a fusion
    /// * `output_label` - label of the synthesized compound detection
    /// * `cover_threshold` - minimum intersection-over-smaller-area ratio
    pub fn new<I, E, S, T>(
        include_labels: I,
        exclude_labels: E,
        output_label: impl Into<String>,
        cover_threshold: f64,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        let include_labels: BTreeSet<String> =
            include_labels.into_iter().map(Into::into).collect();
        let exclude_labels: BTreeSet<String> =
            exclude_labels.into_iter().map(Into::into).collect();

        if include_labels.is_empty() {
            return Err(Error::InvalidConfig(
                "fusion include set must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&cover_threshold) {
            return Err(Error::InvalidConfig(
                "cover_threshold must be within [0, 1]".to_string(),
            ));
        }
        if include_labels.intersection(&exclude_labels).next().is_some() {
            return Err(Error::InvalidConfig(
                "include and exclude label sets must be disjoint".to_string(),
            ));
        }

        Ok(Self {
            include_labels,
            exclude_labels,
            output_label: output_label.into(),
            cover_threshold,
        })
    }

    /// Merge one frame's detections into zero or more compound detections.
    ///
    /// Seeds are taken in input order; each seed greedily accumulates
    /// unclaimed detections of the remaining include labels that cover it,
    /// and a single overlapping exclude-label detection vetoes the whole
    /// seed. Members of an emitted compound are claimed and cannot seed or
    /// join another fusion within the same frame, which also makes the
    /// result deterministic for a given input order.
    pub fn fuse(&self, detections: &[Detection]) -> Vec<Detection> {
        let mut fused = Vec::new();
        let mut claimed = vec![false; detections.len()];

        for seed_idx in 0..detections.len() {
            let seed = &detections[seed_idx];
            if claimed[seed_idx] || !self.include_labels.contains(&seed.label) {
                continue;
            }

            // An excluded cue anywhere on the seed disqualifies it,
            // regardless of where it sits in the input order.
            let vetoed = detections.iter().any(|cand| {
                self.exclude_labels.contains(&cand.label)
                    && seed.rect.cover_rate(&cand.rect) > 0.0
            });
            if vetoed {
                continue;
            }

            let mut members = vec![seed_idx];
            let mut group_labels: BTreeSet<&str> = BTreeSet::new();
            group_labels.insert(&seed.label);

            if group_labels.len() < self.include_labels.len() {
                for (cand_idx, cand) in detections.iter().enumerate() {
                    if cand_idx == seed_idx
                        || claimed[cand_idx]
                        || !self.include_labels.contains(&cand.label)
                        || group_labels.contains(cand.label.as_str())
                    {
                        continue;
                    }

                    if seed.rect.cover_rate(&cand.rect) >= self.cover_threshold {
                        members.push(cand_idx);
                        group_labels.insert(&cand.label);
                        if group_labels.len() == self.include_labels.len() {
                            break;
                        }
                    }
                }
            }

            if group_labels.len() < self.include_labels.len() {
                continue;
            }

            fused.push(self.merge(detections, &members));
            for &idx in &members {
                claimed[idx] = true;
            }
        }

        fused
    }

    // Compound detection: bounding union of the members, mean score, the
    // synthesized label, and the seed's track identity passed through.
    fn merge(&self, detections: &[Detection], members: &[usize]) -> Detection {
        let seed = &detections[members[0]];
        let mut rect = seed.rect;
        let mut score_sum = 0.0f32;
        for &idx in members {
            rect = rect.union_rect(&detections[idx].rect);
            score_sum += detections[idx].score;
        }

        let mut compound = Detection::new(
            self.output_label.clone(),
            0,
            score_sum / members.len() as f32,
            rect,
        );
        compound.track_id = seed.track_id;
        compound
    }
}
