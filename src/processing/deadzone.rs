//! Per-axis dead zone on the filter output
//!
//! Small movements inside an axis' dead zone are swallowed so residual
//! jitter does not reach the host. The zone is sized from the estimator's
//! current uncertainty: wide while the filter is unsure, shrinking as it
//! converges.

use crate::core::{PoseVector, NUM_MEASUREMENT_DOF};
use crate::utils::config::DeadzoneResponse;

#[derive(Debug, Clone)]
pub struct DeadzoneFilter {
    pub last_output: PoseVector,
    pub dz_size: PoseVector,
    response: DeadzoneResponse,
}

impl Default for DeadzoneFilter {
    fn default() -> Self {
        Self::new(DeadzoneResponse::default())
    }
}

impl DeadzoneFilter {
    pub fn new(response: DeadzoneResponse) -> Self {
        Self {
            last_output: PoseVector::zeros(),
            dz_size: PoseVector::zeros(),
            response,
        }
    }

    /// Forget the previous output so the next input is taken as is
    pub fn reset(&mut self) {
        self.last_output.fill(0.0);
        self.dz_size.fill(0.0);
    }

    /// Start from a known output, e.g. the first measurement of a session
    pub fn seed(&mut self, pose: &PoseVector) {
        self.last_output = *pose;
    }

    /// `dz[i] = scale * sqrt(var[i])^exponent`; bad variances give no dead zone
    pub fn set_sizes_from_variances(&mut self, variances: &PoseVector, scale: f64, exponent: f64) {
        for i in 0..NUM_MEASUREMENT_DOF {
            let var = variances[i];
            self.dz_size[i] = if var.is_finite() && var > 0.0 && scale > 0.0 {
                let size = scale * var.sqrt().powf(exponent);
                if size.is_finite() { size } else { 0.0 }
            } else {
                0.0
            };
        }
    }

    pub fn filter(&mut self, input: &PoseVector) -> PoseVector {
        let mut out = PoseVector::zeros();
        for i in 0..NUM_MEASUREMENT_DOF {
            let dz = self.dz_size[i];
            let last = self.last_output[i];
            let delta = input[i] - last;

            out[i] = if dz <= 0.0 {
                input[i]
            } else {
                match self.response {
                    DeadzoneResponse::Snap if delta.abs() < dz => last,
                    DeadzoneResponse::Snap => input[i],
                    DeadzoneResponse::Boundary if delta.abs() < dz => last,
                    DeadzoneResponse::Boundary => input[i] - dz.copysign(delta),
                    DeadzoneResponse::Soft { exponent } => {
                        let f = (delta.abs() / dz).powf(exponent);
                        last + f / (f + 1.0) * delta
                    }
                }
            };
            self.last_output[i] = out[i];
        }
        out
    }
}
