use crate::sort::{BBox, Xysr};
use nalgebra as na;

pub type StateMean = na::SVector<f32, 7>;
pub type StateCovariance = na::SMatrix<f32, 7, 7>;

/// A simple Kalman filter for tracking bounding boxes in image space.
///
/// The 7-dimensional state space
///
/// ```text
/// x, y, s, r, vx, vy, vs
/// ```
///
/// contains the bounding box center position (x, y), scale (area) s,
/// aspect ratio r, and the velocities of x, y and s. The aspect ratio
/// is considered constant and has no velocity term.
///
/// Object motion follows a constant velocity model. The bounding box
/// (x, y, s, r) is taken as direct observation of the state space
/// (linear observation model).
///
#[derive(Clone, Debug)]
pub struct KalmanFilter {
    motion_mat: na::SMatrix<f32, 7, 7>,
    update_mat: na::SMatrix<f32, 4, 7>,
    motion_cov: na::SMatrix<f32, 7, 7>,
    innovation_cov: na::Matrix4<f32>,
    initial_cov: na::SMatrix<f32, 7, 7>,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        let (ndim, dt) = (3, 1.0);

        let mut motion_mat = na::SMatrix::<f32, 7, 7>::identity();
        for i in 0..ndim {
            motion_mat[(i, 4 + i)] = dt;
        }

        let mut update_mat = na::SMatrix::<f32, 4, 7>::zeros();
        for i in 0..4 {
            update_mat[(i, i)] = 1.0;
        }

        // Measurement noise is larger on scale and ratio than on position.
        let innovation_cov = na::Matrix4::from_diagonal(&na::Vector4::new(1.0, 1.0, 10.0, 10.0));

        // Unobserved velocities start out with a very high uncertainty.
        let initial_cov = na::SMatrix::<f32, 7, 7>::from_diagonal(&StateMean::from_column_slice(&[
            10.0, 10.0, 10.0, 10.0, 10000.0, 10000.0, 10000.0,
        ]));

        let motion_cov = na::SMatrix::<f32, 7, 7>::from_diagonal(&StateMean::from_column_slice(&[
            1.0, 1.0, 1.0, 1.0, 1.0e-2, 1.0e-2, 1.0e-4,
        ]));

        Self {
            motion_mat,
            update_mat,
            motion_cov,
            innovation_cov,
            initial_cov,
        }
    }
}

impl KalmanFilter {
    ///
    /// Create track from unassociated measurement.
    ///
    /// Returns the mean vector (7 dimensional) and covariance matrix (7x7
    /// dimensional) of the new track. Unobserved velocities are initialized
    /// to 0 mean.
    ///
    pub fn initiate(&self, measurement: &BBox<Xysr>) -> (StateMean, StateCovariance) {
        let [x, y, s, r] = *measurement.as_slice();
        let mean = StateMean::from_column_slice(&[x, y, s, r, 0.0, 0.0, 0.0]);

        (mean, self.initial_cov)
    }

    /// Run Kalman filter prediction step.
    ///
    /// The area velocity is zeroed first if it would drive the area to
    /// zero or below.
    ///
    pub fn predict(&self, mean: &StateMean, covariance: &StateCovariance) -> (StateMean, StateCovariance) {
        let mut mean = *mean;

        if mean[6] + mean[2] <= 0.0 {
            mean[6] = 0.0;
        }

        let mean = self.motion_mat * mean;
        let covariance = self.motion_mat * covariance * self.motion_mat.transpose() + self.motion_cov;

        (mean, covariance)
    }

    /// Project state distribution to measurement space.
    pub fn project(&self, mean: &StateMean, covariance: &StateCovariance) -> (na::Vector4<f32>, na::Matrix4<f32>) {
        let mean = self.update_mat * mean;
        let covariance = self.update_mat * covariance * self.update_mat.transpose();

        (mean, covariance + self.innovation_cov)
    }

    /// Run Kalman filter correction step.
    ///
    /// Returns the measurement-corrected state distribution, or `None` if
    /// the innovation covariance is not positive definite.
    ///
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        measurement: &BBox<Xysr>,
    ) -> Option<(StateMean, StateCovariance)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let chol = projected_cov.cholesky()?;

        // (4, 7) = S^-1 * H * P, transposed into the (7, 4) gain
        let kalman_gain = chol.solve(&(self.update_mat * covariance)).transpose();

        let innovation = measurement.as_vector() - projected_mean;
        let new_mean = mean + kalman_gain * innovation;

        // Joseph form keeps the covariance symmetric positive definite.
        let i_kh = StateCovariance::identity() - kalman_gain * self.update_mat;
        let new_covariance = i_kh * covariance * i_kh.transpose()
            + kalman_gain * self.innovation_cov * kalman_gain.transpose();

        Some((new_mean, new_covariance))
    }
}

#[test]
fn test_kalman_static_object() {
    let kf = KalmanFilter::default();
    let bbox = BBox::ltrb(100.0, 100.0, 140.0, 180.0);
    let (mut m, mut c) = kf.initiate(&bbox.as_xysr());

    for _ in 0..10 {
        let (pm, pc) = kf.predict(&m, &c);
        let (um, uc) = kf.update(&pm, &pc, &bbox.as_xysr()).unwrap();
        m = um;
        c = uc;
    }

    let restored = BBox::<Xysr>::xysr(m[0], m[1], m[2], m[3]).as_ltrb();
    for (a, b) in restored.as_slice().iter().zip(bbox.as_slice().iter()) {
        assert!((a - b).abs() < 0.5, "{:?} vs {:?}", restored, bbox);
    }

    assert!(m[4].abs() < 0.1 && m[5].abs() < 0.1);
}

#[test]
fn test_kalman_tracks_velocity() {
    let kf = KalmanFilter::default();
    let (mut m, mut c) = kf.initiate(&BBox::ltrb(0.0, 0.0, 20.0, 20.0).as_xysr());

    for step in 1..20 {
        let offset = 5.0 * step as f32;
        let (pm, pc) = kf.predict(&m, &c);
        let (um, uc) = kf
            .update(&pm, &pc, &BBox::ltrb(offset, 0.0, offset + 20.0, 20.0).as_xysr())
            .unwrap();
        m = um;
        c = uc;
    }

    assert!((m[4] - 5.0).abs() < 0.5, "vx = {}", m[4]);
    assert!(m[5].abs() < 0.5, "vy = {}", m[5]);
}

#[test]
fn test_kalman_predict_keeps_area_positive() {
    let kf = KalmanFilter::default();
    let (mut m, c) = kf.initiate(&BBox::ltrb(0.0, 0.0, 10.0, 10.0).as_xysr());
    m[6] = -500.0;

    let (m, c) = kf.predict(&m, &c);

    assert_eq!(m[6], 0.0);
    assert!((m[2] - 100.0).abs() < 1e-3);
    assert!(c.iter().all(|v| v.is_finite()));
}
