//! Per-track duty-cycle statistics and rising-edge event emission.
//!
//! A detector that fires on 9 frames out of 10 would raise 9 alerts per
//! second if every hit were reported. This engine keeps a rolling hit/miss
//! history per track identity, evaluates the hit ratio at most once per
//! interval, and emits a detection only on the rising edge of the
//! debounced status - one alert per sustained onset.
//!
//! Hits are recorded on every frame a track appears; misses accumulate for
//! ids that are known but absent from the current frame; evaluation only
//! runs for ids present in the frame. The asymmetry biases alerts toward
//! sustained presence over momentary occlusion and is intentional -
//! do not "fix" it to sample both edges per frame, that changes alert
//! latency materially.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::detection::Detection;
use crate::{Error, Result};

/// Rolling history for one track identity.
#[derive(Debug)]
struct EventSequence {
    history: Vec<bool>,
    last_status: bool,
    last_event_time: Instant,
    last_update_time: Instant,
}

impl EventSequence {
    fn new(now: Instant) -> Self {
        Self {
            history: Vec::new(),
            last_status: false,
            last_event_time: now,
            last_update_time: now,
        }
    }
}

/// Temporal statistics engine.
///
/// One instance per video stream; feed it every frame's tracked (and
/// optionally fused) detections. Entries are garbage-collected once no
/// update has arrived for twice the interval, so memory stays bounded by
/// the number of concurrently live tracks.
#[derive(Debug)]
pub struct SequenceStatistic {
    interval: Duration,
    threshold: f64,
    events: BTreeMap<u32, EventSequence>,
}

impl SequenceStatistic {
    /// Create an engine evaluating each track at most once per `interval`,
    /// raising its status when the hit ratio reaches `threshold`.
    pub fn new(interval: Duration, threshold: f64) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::InvalidConfig(
                "statistic interval must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidConfig(
                "statistic threshold must be within [0, 1]".to_string(),
            ));
        }
        Ok(Self {
            interval,
            threshold,
            events: BTreeMap::new(),
        })
    }

    /// Process one frame against the wall clock.
    pub fn update(&mut self, objects: &[Detection]) -> Vec<Detection> {
        self.update_at(objects, Instant::now())
    }

    /// Process one frame at an explicit instant.
    ///
    /// This is the deterministic-clock seam: `now` must be monotonic
    /// non-decreasing across calls. Returns the detections whose debounced
    /// status rose from 0 to 1 at this frame's evaluation.
    pub fn update_at(&mut self, objects: &[Detection], now: Instant) -> Vec<Detection> {
        for det in objects {
            let Some(track_id) = det.track_id else {
                log::debug!("detection '{}' without track id ignored", det.label);
                continue;
            };
            let seq = self
                .events
                .entry(track_id)
                .or_insert_with(|| EventSequence::new(now));
            seq.history.push(true);
            seq.last_update_time = now;
        }

        let mut emitted = Vec::new();
        let interval = self.interval;
        let threshold = self.threshold;
        self.events.retain(|&track_id, seq| {
            match objects.iter().find(|o| o.track_id == Some(track_id)) {
                None => seq.history.push(false),
                Some(det) => {
                    if now.duration_since(seq.last_event_time) >= interval {
                        seq.last_event_time = now;

                        let hits = seq.history.iter().filter(|&&hit| hit).count();
                        let new_status = !seq.history.is_empty()
                            && hits as f64 / seq.history.len() as f64 >= threshold;

                        if !seq.last_status && new_status {
                            emitted.push(det.clone());
                        }

                        seq.last_status = new_status;
                        seq.history.clear();
                    }
                }
            }

            // Sole GC rule: drop anything silent for more than 2x interval.
            now.duration_since(seq.last_update_time) <= interval * 2
        });

        emitted
    }

    /// Number of track identities currently held in memory.
    pub fn tracked_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    const SECOND: Duration = Duration::from_secs(1);

    fn tracked(id: u32) -> Detection {
        Detection::new("person", 0, 0.9, Rect::new(0, 0, 10, 10)).with_track_id(id)
    }

    fn engine(interval_secs: u64, threshold: f64) -> SequenceStatistic {
        SequenceStatistic::new(Duration::from_secs(interval_secs), threshold).unwrap()
    }

    #[test]
    fn test_invalid_configs() {
        assert!(SequenceStatistic::new(Duration::ZERO, 0.5).is_err());
        assert!(SequenceStatistic::new(SECOND, 1.5).is_err());
    }

    #[test]
    fn test_no_event_before_first_interval() {
        let mut stat = engine(3, 0.5);
        let t0 = Instant::now();

        // Present every 500ms, but the interval has not elapsed yet
        for i in 0..6u32 {
            let events = stat.update_at(&[tracked(1)], t0 + SECOND / 2 * i);
            assert!(events.is_empty(), "step {}", i);
        }
    }

    #[test]
    fn test_rising_edge_fires_once() {
        let mut stat = engine(3, 0.5);
        let t0 = Instant::now();

        // Continuous presence: rising edge exactly at the first evaluation
        let mut fired_at = None;
        for i in 0..=12u32 {
            let now = t0 + SECOND / 2 * i;
            let events = stat.update_at(&[tracked(1)], now);
            if !events.is_empty() {
                assert!(fired_at.is_none(), "must fire only once");
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].track_id, Some(1));
                fired_at = Some(i);
            }
        }
        // 3s interval at 2 updates/s: evaluation lands on step 6
        assert_eq!(fired_at, Some(6));
    }

    #[test]
    fn test_level_high_does_not_re_emit() {
        let mut stat = engine(1, 0.5);
        let t0 = Instant::now();

        let mut total_events = 0;
        for i in 0..20u32 {
            total_events += stat.update_at(&[tracked(1)], t0 + SECOND * i).len();
        }
        assert_eq!(total_events, 1, "edge-triggered, not level-triggered");
    }

    #[test]
    fn test_ratio_below_threshold_stays_low() {
        let mut stat = engine(3, 0.5);
        let t0 = Instant::now();

        // 1 hit, then 5 misses, then a hit that triggers evaluation:
        // 2 hits of 7 samples = 0.29 < 0.5
        stat.update_at(&[tracked(1)], t0);
        for i in 1..=5u32 {
            stat.update_at(&[], t0 + SECOND / 2 * i);
        }
        let events = stat.update_at(&[tracked(1)], t0 + SECOND * 3);
        assert!(events.is_empty());
    }

    #[test]
    fn test_duty_cycle_six_of_ten() {
        let mut stat = engine(3, 0.5);
        let t0 = Instant::now();

        // 6 hits and 4 misses spread over one interval, then a hit at the
        // boundary: ratio 7/11 = 0.64 >= 0.5, status rises, one event
        for i in 0..10u32 {
            let now = t0 + Duration::from_millis(300) * i;
            if i % 5 < 3 {
                stat.update_at(&[tracked(1)], now);
            } else {
                stat.update_at(&[], now);
            }
        }
        let events = stat.update_at(&[tracked(1)], t0 + SECOND * 3);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_falling_then_rising_emits_again() {
        let mut stat = engine(1, 0.5);
        let t0 = Instant::now();

        // Rise
        stat.update_at(&[tracked(1)], t0);
        assert_eq!(stat.update_at(&[tracked(1)], t0 + SECOND).len(), 1);

        // Fall: a miss-dominated window evaluated at the next presence
        stat.update_at(&[], t0 + SECOND + Duration::from_millis(100));
        stat.update_at(&[], t0 + SECOND + Duration::from_millis(200));
        stat.update_at(&[], t0 + SECOND + Duration::from_millis(300));
        let events = stat.update_at(&[tracked(1)], t0 + SECOND * 2);
        assert!(events.is_empty(), "1 hit of 4 drops the status");

        // Rise again after another sustained interval
        for i in 1..=9u32 {
            stat.update_at(&[tracked(1)], t0 + SECOND * 2 + Duration::from_millis(100) * i);
        }
        let events = stat.update_at(&[tracked(1)], t0 + SECOND * 3);
        assert_eq!(events.len(), 1, "second onset emits a second event");
    }

    #[test]
    fn test_purge_after_twice_interval() {
        let mut stat = engine(3, 0.5);
        let t0 = Instant::now();

        stat.update_at(&[tracked(1)], t0);
        assert_eq!(stat.tracked_count(), 1);

        // Still within 2x interval: entry survives, accumulating misses
        stat.update_at(&[], t0 + SECOND * 5);
        assert_eq!(stat.tracked_count(), 1);

        // Beyond 2x interval: purged
        stat.update_at(&[], t0 + SECOND * 7);
        assert_eq!(stat.tracked_count(), 0);

        // Reappearance starts a fresh sequence with status low
        stat.update_at(&[tracked(1)], t0 + SECOND * 8);
        assert_eq!(stat.tracked_count(), 1);
        let events = stat.update_at(&[tracked(1)], t0 + SECOND * 8 + Duration::from_millis(100));
        assert!(events.is_empty(), "fresh entry needs a full interval again");
    }

    #[test]
    fn test_independent_tracks() {
        let mut stat = engine(1, 0.5);
        let t0 = Instant::now();

        stat.update_at(&[tracked(1), tracked(2)], t0);
        let events = stat.update_at(&[tracked(1), tracked(2)], t0 + SECOND);
        assert_eq!(events.len(), 2);
        let ids: Vec<_> = events.iter().map(|e| e.track_id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)], "deterministic id order");
    }

    #[test]
    fn test_detection_without_track_id_ignored() {
        let mut stat = engine(1, 0.5);
        let t0 = Instant::now();

        let untracked = Detection::new("person", 0, 0.9, Rect::new(0, 0, 10, 10));
        stat.update_at(&[untracked.clone()], t0);
        assert_eq!(stat.tracked_count(), 0);
        assert!(stat.update_at(&[untracked], t0 + SECOND).is_empty());
    }
}
