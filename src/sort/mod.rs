pub mod detection;
pub mod iou_matching;
pub mod kalman_filter;
pub mod linear_assignment;
pub mod tracker;
pub mod track;

pub use detection::Detection;
pub use kalman_filter::KalmanFilter;
pub use linear_assignment::Assignment;
pub use tracker::{SortConfig, TrackedObject, Tracker};
pub use track::{Track, TrackId, TrackState};

use core::marker::PhantomData;
use nalgebra as na;

/// Smallest width or height a box may have before it is fed to the filter.
pub const MIN_SIDE: f32 = 1.0e-3;

pub trait BBoxFormat: std::fmt::Debug {}

/// Left-top-right-bottom format, as produced by the detectors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ltrb;
impl BBoxFormat for Ltrb {}

/// Center x, center y, scale (area) and aspect ratio (width / height).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Xysr;
impl BBoxFormat for Xysr {}

#[derive(Debug, Clone, PartialEq)]
pub struct BBox<F: BBoxFormat>([f32; 4], PhantomData<F>);

impl<F: BBoxFormat> BBox<F> {
    #[inline]
    pub fn as_slice(&self) -> &[f32; 4] {
        &self.0
    }

    #[inline]
    pub fn as_vector(&self) -> na::Vector4<f32> {
        na::Vector4::new(self.0[0], self.0[1], self.0[2], self.0[3])
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl BBox<Ltrb> {
    #[inline]
    pub fn ltrb(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline(always)]
    pub fn left(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn top(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn right(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn bottom(&self) -> f32 {
        self.0[3]
    }

    #[inline(always)]
    pub fn width(&self) -> f32 {
        self.0[2] - self.0[0]
    }

    #[inline(always)]
    pub fn height(&self) -> f32 {
        self.0[3] - self.0[1]
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// The box the filter sees: width and height raised to at least `MIN_SIDE`,
    /// keeping the top-left corner.
    #[inline]
    pub fn clamped(&self) -> Self {
        let w = self.width().max(MIN_SIDE);
        let h = self.height().max(MIN_SIDE);

        BBox::ltrb(self.left(), self.top(), self.left() + w, self.top() + h)
    }

    /// Strict containment: every edge of `other` lies inside `self`.
    #[inline]
    pub fn contains(&self, other: &BBox<Ltrb>) -> bool {
        other.left() > self.left()
            && other.top() > self.top()
            && other.right() < self.right()
            && other.bottom() < self.bottom()
    }

    #[inline]
    pub fn as_xysr(&self) -> BBox<Xysr> {
        self.into()
    }
}

impl BBox<Xysr> {
    #[inline]
    pub fn xysr(x1: f32, x2: f32, x3: f32, x4: f32) -> Self {
        BBox([x1, x2, x3, x4], Default::default())
    }

    #[inline(always)]
    pub fn cx(&self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    pub fn cy(&self) -> f32 {
        self.0[1]
    }

    #[inline(always)]
    pub fn scale(&self) -> f32 {
        self.0[2]
    }

    #[inline(always)]
    pub fn ratio(&self) -> f32 {
        self.0[3]
    }

    #[inline]
    pub fn as_ltrb(&self) -> BBox<Ltrb> {
        self.into()
    }
}

impl<'a> From<&'a BBox<Ltrb>> for BBox<Xysr> {
    #[inline]
    fn from(v: &'a BBox<Ltrb>) -> Self {
        let w = v.width().max(MIN_SIDE);
        let h = v.height().max(MIN_SIDE);

        Self([
            v.0[0] + w / 2.0,
            v.0[1] + h / 2.0,
            w * h,
            w / h,
        ], Default::default())
    }
}

impl<'a> From<&'a BBox<Xysr>> for BBox<Ltrb> {
    #[inline]
    fn from(v: &'a BBox<Xysr>) -> Self {
        let w = (v.0[2] * v.0[3]).max(0.0).sqrt().max(MIN_SIDE);
        let h = (v.0[2] / w).max(MIN_SIDE);

        Self([
            v.0[0] - w / 2.0,
            v.0[1] - h / 2.0,
            v.0[0] + w / 2.0,
            v.0[1] + h / 2.0,
        ], Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f32; 4], b: &[f32; 4]) {
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-3, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn ltrb_to_xysr() {
        let b = BBox::ltrb(10.0, 20.0, 50.0, 100.0).as_xysr();

        assert_close(b.as_slice(), &[30.0, 60.0, 3200.0, 0.5]);
    }

    #[test]
    fn xysr_round_trip() {
        let boxes = [
            BBox::ltrb(10.0, 20.0, 50.0, 100.0),
            BBox::ltrb(0.0, 0.0, 1.0, 1.0),
            BBox::ltrb(123.5, 77.25, 480.0, 300.0),
        ];

        for b in boxes.iter() {
            assert_close(b.as_xysr().as_ltrb().as_slice(), b.as_slice());
        }
    }

    #[test]
    fn degenerate_box_is_clamped() {
        let b = BBox::ltrb(10.0, 10.0, 10.0, 5.0).as_xysr();

        assert!(b.is_finite());
        assert!(b.scale() > 0.0);
        assert!(b.ratio() > 0.0);
        assert!(b.as_ltrb().is_finite());
    }

    #[test]
    fn clamped_box_matches_filter_input() {
        let point = BBox::ltrb(10.0, 10.0, 10.0, 10.0);
        let clamped = point.clamped();

        assert_close(clamped.as_slice(), &[10.0, 10.0, 10.0 + MIN_SIDE, 10.0 + MIN_SIDE]);
        assert_close(clamped.as_xysr().as_slice(), point.as_xysr().as_slice());

        let b = BBox::ltrb(1.0, 2.0, 30.0, 40.0);
        assert_eq!(b.clamped(), b);
    }

    #[test]
    fn containment_is_strict() {
        let car = BBox::ltrb(10.0, 10.0, 200.0, 200.0);

        assert!(car.contains(&BBox::ltrb(50.0, 50.0, 100.0, 80.0)));
        assert!(!car.contains(&BBox::ltrb(10.0, 50.0, 100.0, 80.0)));
        assert!(!car.contains(&BBox::ltrb(500.0, 500.0, 550.0, 530.0)));
    }
}
