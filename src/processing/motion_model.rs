//! Constant-velocity model matrices
//!
//! Each pose axis `i` is paired with its rate at `i + 6`. Position and
//! orientation move at constant rate; the rates take random accelerations.

use crate::core::{
    AxisKind, MeasureMatrix, StateMatrix, StateToMeasureMatrix, NUM_MEASUREMENT_DOF,
};
use crate::utils::config::{NoiseSettings, ProcessNoiseConfig};

/// F(dt): identity with `dt` coupling each pose axis to its rate
pub fn transition_matrix(dt: f64) -> StateMatrix {
    let mut f = StateMatrix::identity();
    for i in 0..NUM_MEASUREMENT_DOF {
        f[(i, i + NUM_MEASUREMENT_DOF)] = dt;
    }
    f
}

/// Unscaled process noise for one step of length `dt`
///
/// Continuous white-noise acceleration per axis:
/// `σ² · [[dt³/3, dt²/2], [dt²/2, dt]]` over (pose, rate). Positive
/// semidefinite for every `dt >= 0` and zero at `dt = 0`.
pub fn base_process_noise(dt: f64, config: &ProcessNoiseConfig) -> StateMatrix {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let dt2 = dt * dt;
    let dt3 = dt2 * dt;

    let mut q = StateMatrix::zeros();
    for i in 0..NUM_MEASUREMENT_DOF {
        let sigma = match AxisKind::of(i) {
            AxisKind::Position => config.sigma_position,
            AxisKind::Rotation => config.sigma_rotation,
        };
        let var = sigma * sigma;
        let rate = i + NUM_MEASUREMENT_DOF;

        q[(i, i)] = var * dt3 / 3.0;
        q[(i, rate)] = var * dt2 / 2.0;
        q[(rate, i)] = var * dt2 / 2.0;
        q[(rate, rate)] = var * dt;
    }
    q
}

/// R: diagonal measurement noise from the two sliders
pub fn measurement_noise(noise: &NoiseSettings) -> MeasureMatrix {
    let pos_var = noise.position_sigma().powi(2);
    let rot_var = noise.rotation_sigma().powi(2);

    let mut r = MeasureMatrix::zeros();
    for i in 0..NUM_MEASUREMENT_DOF {
        r[(i, i)] = match AxisKind::of(i) {
            AxisKind::Position => pos_var,
            AxisKind::Rotation => rot_var,
        };
    }
    r
}

/// H = [I6 | 0]
pub fn measurement_matrix() -> StateToMeasureMatrix {
    let mut h = StateToMeasureMatrix::zeros();
    for i in 0..NUM_MEASUREMENT_DOF {
        h[(i, i)] = 1.0;
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StateVector;
    use approx::assert_relative_eq;

    #[test]
    fn test_transition_moves_pose_by_rate() {
        let mut x = StateVector::zeros();
        x[0] = 1.0;
        x[6] = 2.0;
        x[3] = 10.0;
        x[9] = -30.0;

        let next = transition_matrix(0.5) * x;
        assert_relative_eq!(next[0], 2.0);
        assert_relative_eq!(next[6], 2.0);
        assert_relative_eq!(next[3], -5.0);
        assert_relative_eq!(next[9], -30.0);
    }

    #[test]
    fn test_process_noise_is_psd_and_symmetric() {
        let config = ProcessNoiseConfig::default();
        for &dt in &[0.0, 1e-4, 1.0 / 60.0, 0.1, 2.0] {
            let q = base_process_noise(dt, &config);
            assert_relative_eq!(q, q.transpose(), epsilon = 1e-15);
            let eig = q.symmetric_eigenvalues();
            assert!(eig.iter().all(|&e| e >= -1e-12), "dt {} eigenvalues {:?}", dt, eig);
        }
    }

    #[test]
    fn test_process_noise_vanishes_at_zero_dt() {
        let q = base_process_noise(0.0, &ProcessNoiseConfig::default());
        assert_eq!(q, StateMatrix::zeros());

        let q = base_process_noise(f64::NAN, &ProcessNoiseConfig::default());
        assert_eq!(q, StateMatrix::zeros());
    }

    #[test]
    fn test_measurement_noise_follows_sliders() {
        let r = measurement_noise(&NoiseSettings::new(0.5, 0.75));
        assert_relative_eq!(r[(0, 0)], 0.01, max_relative = 1e-12);
        assert_relative_eq!(r[(2, 2)], 0.01, max_relative = 1e-12);
        assert_relative_eq!(r[(3, 3)], 1.0, max_relative = 1e-12);
        assert_eq!(r[(0, 1)], 0.0);
        assert!((0..6).all(|i| r[(i, i)] > 0.0));
    }

    #[test]
    fn test_measurement_matrix_selects_pose() {
        let mut x = StateVector::zeros();
        for i in 0..12 {
            x[i] = i as f64;
        }
        let z = measurement_matrix() * x;
        for i in 0..6 {
            assert_eq!(z[i], i as f64);
        }
    }
}
