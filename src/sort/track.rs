use crate::error::Error;
use crate::sort::kalman_filter::{StateCovariance, StateMean};
use crate::sort::{BBox, Detection, KalmanFilter, Ltrb, Xysr};

pub type TrackId = u64;

///
///   Enumeration type for the single target track state. Newly created tracks are
///   classified as `tentative` until their hit streak reaches `min_hits`. Then,
///   the track state is changed to `confirmed`. Tracks that are no longer alive
///   are classified as `deleted` to mark them for removal from the set of active
///   tracks.
///
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackState {
    Tentative,
    Confirmed,
    Deleted,
}

///
///     A single target track with state space `(x, y, s, r)` and the
///     velocities of `x`, `y` and `s`, where `(x, y)` is the center of the
///     bounding box, `s` is its area and `r` its aspect ratio.
///
///     Attributes
///     ----------
///     track_id : TrackId
///         A unique track identifier, never reused.
///     hits : u32
///         Total number of measurement updates.
///     hit_streak : u32
///         Number of consecutive frames with a measurement update.
///     age : u32
///         Total number of frames since first occurance.
///     time_since_update : u32
///         Total number of frames since last measurement update.
///     class_id : Option<i32>
///         Class of the last associated detection.
///
#[derive(Clone, Debug)]
pub struct Track {
    pub track_id: TrackId,
    pub time_since_update: u32,
    pub class_id: Option<i32>,

    covariance: StateCovariance,
    mean: StateMean,
    hits: u32,
    hit_streak: u32,
    age: u32,
    state: TrackState,
    min_hits: u32,
}

impl Track {
    /// Start a track from an unmatched detection; the detection counts as the first hit.
    pub fn new(kf: &KalmanFilter, detection: &Detection, track_id: TrackId, min_hits: u32) -> Self {
        let (mean, covariance) = kf.initiate(&detection.bbox.as_xysr());

        Self {
            track_id,
            mean,
            covariance,
            class_id: detection.class_id,
            hits: 1,
            hit_streak: 1,
            age: 1,
            time_since_update: 0,
            state: if min_hits <= 1 { TrackState::Confirmed } else { TrackState::Tentative },
            min_hits,
        }
    }

    /// Current position in `(x1, y1, x2, y2)` format.
    #[inline]
    pub fn bbox(&self) -> BBox<Ltrb> {
        BBox::<Xysr>::xysr(self.mean[0], self.mean[1], self.mean[2], self.mean[3]).as_ltrb()
    }

    #[inline]
    pub fn mean(&self) -> &StateMean {
        &self.mean
    }

    #[inline]
    pub fn covariance(&self) -> &StateCovariance {
        &self.covariance
    }

    #[inline]
    pub fn hits(&self) -> u32 {
        self.hits
    }

    #[inline]
    pub fn hit_streak(&self) -> u32 {
        self.hit_streak
    }

    #[inline]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[inline]
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Propagate the state distribution to the current time step and
    /// return the predicted box.
    ///
    /// A track that already missed the previous frame loses its hit streak.
    ///
    pub fn predict(&mut self, kf: &KalmanFilter) -> BBox<Ltrb> {
        let (mean, covariance) = kf.predict(&self.mean, &self.covariance);
        self.mean = mean;
        self.covariance = covariance;
        self.age += 1;

        if self.time_since_update > 0 {
            self.hit_streak = 0;
        }

        self.time_since_update += 1;

        self.bbox()
    }

    /// Perform Kalman filter measurement update step.
    ///
    /// On failure the track state is left untouched.
    ///
    pub fn update(&mut self, kf: &KalmanFilter, detection: &Detection) -> Result<(), Error> {
        let (mean, covariance) = kf
            .update(&self.mean, &self.covariance, &detection.bbox.as_xysr())
            .ok_or(Error::SingularCovariance { track_id: self.track_id })?;

        self.mean = mean;
        self.covariance = covariance;
        self.class_id = detection.class_id.or(self.class_id);

        self.hits += 1;
        self.hit_streak += 1;
        self.time_since_update = 0;

        if self.state == TrackState::Tentative && self.hit_streak >= self.min_hits {
            self.state = TrackState::Confirmed;
        }

        Ok(())
    }

    ///
    /// Mark this track as deleted once it has missed more than `max_age` frames.
    ///
    #[inline]
    pub fn mark_missed(&mut self, max_age: u32) {
        if self.time_since_update > max_age {
            self.state = TrackState::Deleted;
        }
    }

    ///
    /// Returns True if this track is tentative (unconfirmed).
    ///
    #[inline]
    pub fn is_tentative(&self) -> bool {
        self.state == TrackState::Tentative
    }

    ///
    /// Returns True if this track is confirmed.
    ///
    #[inline]
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    ///
    /// Returns True if this track is dead and should be deleted.
    ///
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }
}
