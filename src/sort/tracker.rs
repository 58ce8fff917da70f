use log::{debug, trace, warn};

use crate::error::Error;
use crate::sort::iou_matching::iou_cost;
use crate::sort::linear_assignment::{min_cost_matching, Assignment};
use crate::sort::{BBox, Detection, KalmanFilter, Ltrb, Track, TrackId};

/// Parameters of the SORT tracker.
///
/// max_age : u32
///     Maximum number of consecutive missed frames before a track is deleted.
/// min_hits : u32
///     Number of consecutive hits before a track is reported. During the
///     first `min_hits` frames every updated track is reported.
/// iou_threshold : f32
///     Minimum intersection over union for a detection to be associated
///     with a track.
///
#[derive(Debug, Clone, PartialEq)]
pub struct SortConfig {
    pub max_age: u32,
    pub min_hits: u32,
    pub iou_threshold: f32,
}

impl SortConfig {
    pub fn new() -> Self {
        Self {
            max_age: 1,
            min_hits: 1,
            iou_threshold: 0.3,
        }
    }
}

impl Default for SortConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A reported track: its current box and identity.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedObject {
    pub bbox: BBox<Ltrb>,
    pub track_id: TrackId,
    pub class_id: Option<i32>,
}

/// This is the multi-target tracker.
///
/// Owns the live tracks of a single video stream. Frames must be fed in
/// temporal order; every stream needs its own tracker.
///
#[derive(Clone, Debug)]
pub struct Tracker {
    config: SortConfig,
    kf: KalmanFilter,
    tracks: Vec<Track>,
    next_id: TrackId,
    frame_count: u64,
}

impl Tracker {
    pub fn new(config: SortConfig) -> Self {
        Self {
            config,
            kf: Default::default(),
            next_id: 1,
            frame_count: 0,
            tracks: Vec::new(),
        }
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        self.tracks.as_slice()
    }

    #[inline]
    pub fn config(&self) -> &SortConfig {
        &self.config
    }

    /// Number of frames processed so far.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Process the detections of one frame and return the reported tracks.
    ///
    /// Must be called once for every frame, even with no detections, so that
    /// missed tracks age out. Detections with a non-finite coordinate are
    /// ignored.
    ///
    pub fn update(&mut self, detections: &[Detection]) -> Vec<TrackedObject> {
        self.frame_count += 1;

        let valid: Vec<Detection> = detections.iter().filter(|d| d.bbox.is_finite()).cloned().collect();
        if valid.len() < detections.len() {
            warn!(
                "frame {}: ignored {} non-finite detections",
                self.frame_count,
                detections.len() - valid.len()
            );
        }
        let detections = valid.as_slice();

        let predicted = self.predict();
        let assignment = self.do_match(&predicted, detections);

        trace!(
            "frame {}: {} tracks, {} detections, {} matches",
            self.frame_count,
            predicted.len(),
            detections.len(),
            assignment.matches.len()
        );

        let mut failed = vec![];
        for &(track_idx, detection_idx) in assignment.matches.iter() {
            if let Err(err) = self.tracks[track_idx].update(&self.kf, &detections[detection_idx]) {
                debug_assert!(false, "{}", err);
                warn!("{}", err);
                failed.push(track_idx);
            }
        }

        for &track_idx in failed.iter() {
            self.tracks[track_idx].mark_missed(0);
        }

        for &track_idx in assignment.unmatched_tracks.iter() {
            self.tracks[track_idx].mark_missed(self.config.max_age);
        }

        for &detection_idx in assignment.unmatched_detections.iter() {
            self.initiate_track(&detections[detection_idx]);
        }

        let reported = self.report();

        let before = self.tracks.len();
        self.tracks.retain(|t| !t.is_deleted());
        if before != self.tracks.len() {
            debug!("frame {}: removed {} tracks", self.frame_count, before - self.tracks.len());
        }

        reported
    }

    ///
    /// Propagate track state distributions one time step forward.
    ///
    /// Tracks whose prediction is not finite are dropped before matching.
    ///
    fn predict(&mut self) -> Vec<BBox<Ltrb>> {
        let kf = &self.kf;
        let mut predicted = Vec::with_capacity(self.tracks.len());

        self.tracks.retain_mut(|track| {
            let bbox = track.predict(kf);

            if bbox.is_finite() {
                predicted.push(bbox);
                true
            } else {
                warn!("{}", Error::NonFinitePrediction { track_id: track.track_id });
                false
            }
        });

        predicted
    }

    fn do_match(&self, predicted: &[BBox<Ltrb>], detections: &[Detection]) -> Assignment {
        let cost_matrix = iou_cost(predicted, detections);
        let max_distance = 1.0 - self.config.iou_threshold;

        match min_cost_matching(cost_matrix.view(), max_distance) {
            Ok(assignment) => assignment,
            Err(err) => {
                warn!("frame {}: {}, leaving all detections unmatched", self.frame_count, err);

                Assignment {
                    matches: vec![],
                    unmatched_tracks: (0..predicted.len()).collect(),
                    unmatched_detections: (0..detections.len()).collect(),
                }
            }
        }
    }

    // Newest tracks come first.
    fn report(&self) -> Vec<TrackedObject> {
        let warming_up = self.frame_count <= self.config.min_hits as u64;

        self.tracks
            .iter()
            .rev()
            .filter(|t| !t.is_deleted() && t.time_since_update == 0)
            .filter(|t| t.is_confirmed() || warming_up)
            .map(|t| TrackedObject {
                bbox: t.bbox(),
                track_id: t.track_id,
                class_id: t.class_id,
            })
            .collect()
    }

    fn initiate_track(&mut self, detection: &Detection) {
        let track = Track::new(&self.kf, detection, self.next_id, self.config.min_hits);
        debug!("frame {}: new track {} at {:?}", self.frame_count, track.track_id, detection.bbox);

        self.tracks.push(track);
        self.next_id += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection::new(BBox::ltrb(x1, y1, x2, y2), 0.9, Some(2))
    }

    fn ids(objects: &[TrackedObject]) -> Vec<TrackId> {
        let mut ids: Vec<_> = objects.iter().map(|o| o.track_id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn disjoint_detections_spawn_new_tracks() {
        let mut tracker = Tracker::new(SortConfig::default());

        let first = tracker.update(&[det(0.0, 0.0, 50.0, 50.0), det(100.0, 0.0, 150.0, 50.0)]);
        assert_eq!(ids(&first), vec![1, 2]);

        let second = tracker.update(&[det(300.0, 300.0, 350.0, 350.0), det(500.0, 0.0, 550.0, 50.0)]);
        assert_eq!(ids(&second), vec![3, 4]);
        assert_eq!(tracker.tracks().len(), 4);
    }

    #[test]
    fn overlapping_object_keeps_its_id() {
        let mut tracker = Tracker::new(SortConfig::default());

        for step in 0..60 {
            let x = 4.0 * step as f32;
            let objects = tracker.update(&[det(x, 10.0, x + 40.0, 90.0)]);

            assert_eq!(ids(&objects), vec![1], "lost identity at frame {}", step);
            assert!((objects[0].bbox.left() - x).abs() < 2.0);
        }

        assert_eq!(tracker.tracks().len(), 1);
    }

    #[test]
    fn short_occlusion_is_tolerated() {
        let mut tracker = Tracker::new(SortConfig::default());

        tracker.update(&[det(0.0, 0.0, 50.0, 50.0)]);
        assert!(tracker.update(&[]).is_empty());
        assert_eq!(tracker.tracks().len(), 1);

        let objects = tracker.update(&[det(0.0, 0.0, 50.0, 50.0)]);
        assert_eq!(ids(&objects), vec![1]);
    }

    #[test]
    fn stale_track_dies_and_id_is_not_reused() {
        let mut tracker = Tracker::new(SortConfig::default());

        tracker.update(&[det(0.0, 0.0, 50.0, 50.0)]);
        tracker.update(&[]);
        tracker.update(&[]);
        assert!(tracker.tracks().is_empty());

        for _ in 0..5 {
            assert!(tracker.update(&[]).is_empty());
        }

        let objects = tracker.update(&[det(0.0, 0.0, 50.0, 50.0)]);
        assert_eq!(ids(&objects), vec![2]);
    }

    #[test]
    fn new_tracks_wait_for_min_hits_after_warm_up() {
        let mut tracker = Tracker::new(SortConfig {
            min_hits: 3,
            ..SortConfig::default()
        });

        let a = det(0.0, 0.0, 50.0, 50.0);
        let b = det(200.0, 200.0, 250.0, 250.0);

        for _ in 0..3 {
            assert_eq!(ids(&tracker.update(&[a.clone()])), vec![1]);
        }

        assert_eq!(ids(&tracker.update(&[a.clone(), b.clone()])), vec![1]);
        assert_eq!(ids(&tracker.update(&[a.clone(), b.clone()])), vec![1]);
        assert_eq!(ids(&tracker.update(&[a, b])), vec![1, 2]);
    }

    #[test]
    fn degenerate_detection_does_not_break_the_frame() {
        let mut tracker = Tracker::new(SortConfig::default());

        let objects = tracker.update(&[det(10.0, 10.0, 10.0, 10.0), det(0.0, 100.0, 40.0, 160.0)]);
        assert_eq!(objects.len(), 2);

        let objects = tracker.update(&[det(30.0, 30.0, 20.0, 20.0), det(1.0, 101.0, 41.0, 161.0)]);
        assert!(objects.iter().any(|o| o.track_id == 2));
        assert!(objects.iter().all(|o| o.bbox.is_finite()));
    }

    #[test]
    fn non_finite_detection_is_ignored() {
        let mut tracker = Tracker::new(SortConfig::default());
        let car = det(0.0, 0.0, 100.0, 50.0);

        tracker.update(&[car.clone()]);
        tracker.update(&[car.clone()]);

        let objects = tracker.update(&[det(std::f32::NAN, 0.0, 50.0, 50.0)]);
        assert!(objects.is_empty());
        assert_eq!(tracker.tracks().len(), 1);

        let objects = tracker.update(&[car]);
        assert_eq!(ids(&objects), vec![1]);
        assert!(objects[0].bbox.is_finite());
    }

    #[test]
    fn degenerate_detection_keeps_its_id() {
        let mut tracker = Tracker::new(SortConfig::default());

        for _ in 0..5 {
            let objects = tracker.update(&[det(10.0, 10.0, 10.0, 60.0)]);
            assert_eq!(ids(&objects), vec![1]);
        }
    }

    #[test]
    fn long_occlusion_within_max_age() {
        let mut tracker = Tracker::new(SortConfig {
            max_age: 5,
            ..SortConfig::default()
        });

        let car = det(0.0, 0.0, 50.0, 50.0);
        tracker.update(&[car.clone()]);
        tracker.update(&[car.clone()]);

        for _ in 0..4 {
            assert!(tracker.update(&[]).is_empty());
        }
        assert_eq!(tracker.tracks().len(), 1);

        assert_eq!(ids(&tracker.update(&[car])), vec![1]);
    }

    #[test]
    fn confirmed_track_is_reported_right_after_occlusion() {
        let mut tracker = Tracker::new(SortConfig {
            max_age: 3,
            min_hits: 3,
            ..SortConfig::default()
        });

        let car = det(0.0, 0.0, 50.0, 50.0);
        for _ in 0..4 {
            tracker.update(&[car.clone()]);
        }
        assert!(tracker.tracks()[0].is_confirmed());

        assert!(tracker.update(&[]).is_empty());
        assert!(tracker.update(&[]).is_empty());

        let objects = tracker.update(&[car]);
        assert_eq!(ids(&objects), vec![1]);
        assert_eq!(tracker.tracks()[0].hit_streak(), 1);
        assert_eq!(tracker.tracks()[0].hits(), 5);
    }
}
