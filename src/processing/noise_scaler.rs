//! Adaptive process-noise scaling driven by innovation statistics
//!
//! Keeps an exponentially weighted estimate of the realized innovation
//! covariance. When innovations are larger than the filter predicted, the
//! motion model is trusted less (process noise goes up) and the estimate
//! follows the measurements more closely. Quiet innovations let the scale
//! fall back to its floor.

use log::trace;

use crate::core::{MeasureMatrix, StateMatrix};
use crate::processing::kalman::KalmanEstimator;
use crate::utils::config::AdaptivityConfig;

#[derive(Debug, Clone)]
pub struct ProcessNoiseScaler {
    /// Running estimate of E[y yᵀ]
    pub innovation_cov_estimate: MeasureMatrix,
    scale: f64,
    config: AdaptivityConfig,
}

impl ProcessNoiseScaler {
    pub fn new(config: AdaptivityConfig) -> Self {
        let mut scaler = Self {
            innovation_cov_estimate: MeasureMatrix::zeros(),
            scale: config.min_scale,
            config,
        };
        scaler.init();
        scaler
    }

    pub fn init(&mut self) {
        self.innovation_cov_estimate.fill(0.0);
        self.scale = self.config.min_scale;
    }

    /// Current multiplier on the base process noise
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Smoothing weight for an update spanning `dt` seconds
    pub fn smoothing_weight(&self, dt: f64) -> f64 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0.0;
        }
        dt / (dt + self.config.window_length)
    }

    /// Fold the estimator's latest innovation into the running estimate and
    /// recompute the scale. Call only after a successful correction.
    pub fn adapt(&mut self, kf: &KalmanEstimator, dt: f64) -> f64 {
        let alpha = self.smoothing_weight(dt);
        let outer = kf.innovation * kf.innovation.transpose();
        self.innovation_cov_estimate = outer * alpha + self.innovation_cov_estimate * (1.0 - alpha);

        let observed = self.innovation_cov_estimate.trace();
        let expected = kf.innovation_cov.trace();
        let ratio = if expected > 0.0 && expected.is_finite() {
            observed / expected
        } else {
            self.config.min_scale
        };

        self.scale = if ratio.is_finite() {
            ratio.clamp(self.config.min_scale, self.config.max_scale)
        } else {
            self.config.max_scale
        };

        trace!(
            "adapt: dt={:.4} alpha={:.4} observed={:.3e} expected={:.3e} scale={:.3}",
            dt, alpha, observed, expected, self.scale
        );
        self.scale
    }

    /// Base process noise multiplied by the current scale
    pub fn scaled(&self, base_cov: &StateMatrix) -> StateMatrix {
        base_cov * self.scale
    }
}
