use crate::core::{
    MeasureMatrix, MeasureToStateMatrix, PoseVector, StateMatrix, StateToMeasureMatrix,
    StateVector, NUM_MEASUREMENT_DOF,
};
use crate::processing::motion_model;
use crate::utils::config::EstimatorConfig;
use crate::validation::Degradation;

/// Linear Kalman estimator over pose and pose rate
///
/// State vector: [x, y, z, yaw, pitch, roll, then the six rates in the
/// same order]. The orchestrator fills `transition_matrix` and
/// `process_noise_cov` for the current frame before calling `predict`.
#[derive(Debug, Clone)]
pub struct KalmanEstimator {
    /// Posterior state estimate
    pub state: StateVector,
    /// Posterior state covariance
    pub state_cov: StateMatrix,
    /// Predicted state for this frame
    pub state_prior: StateVector,
    /// Predicted covariance for this frame
    pub state_cov_prior: StateMatrix,
    /// F for this frame's dt
    pub transition_matrix: StateMatrix,
    /// Q for this frame's dt, already scaled
    pub process_noise_cov: StateMatrix,
    /// R from the noise sliders
    pub measurement_noise_cov: MeasureMatrix,
    /// H = [I | 0]
    pub measurement_matrix: StateToMeasureMatrix,
    /// Gain from the last correction
    pub kalman_gain: MeasureToStateMatrix,
    /// z - H x⁻ from the last correction
    pub innovation: PoseVector,
    /// S = H P⁻ Hᵀ + R from the last correction
    pub innovation_cov: MeasureMatrix,
    config: EstimatorConfig,
}

impl KalmanEstimator {
    pub fn new(config: EstimatorConfig, measurement_noise_cov: MeasureMatrix) -> Self {
        let mut estimator = Self {
            state: StateVector::zeros(),
            state_cov: StateMatrix::zeros(),
            state_prior: StateVector::zeros(),
            state_cov_prior: StateMatrix::zeros(),
            transition_matrix: StateMatrix::identity(),
            process_noise_cov: StateMatrix::zeros(),
            measurement_noise_cov,
            measurement_matrix: motion_model::measurement_matrix(),
            kalman_gain: MeasureToStateMatrix::zeros(),
            innovation: PoseVector::zeros(),
            innovation_cov: MeasureMatrix::zeros(),
            config,
        };
        estimator.init();
        estimator
    }

    /// Zero the state and restore full initial uncertainty. Keeps R.
    pub fn init(&mut self) {
        self.state.fill(0.0);
        self.state_prior.fill(0.0);
        self.state_cov.fill(0.0);
        for i in 0..NUM_MEASUREMENT_DOF {
            self.state_cov[(i, i)] = self.config.initial_pose_variance;
            let rate = i + NUM_MEASUREMENT_DOF;
            self.state_cov[(rate, rate)] = self.config.initial_rate_variance;
        }
        self.state_cov_prior.copy_from(&self.state_cov);
        self.transition_matrix = StateMatrix::identity();
        self.process_noise_cov.fill(0.0);
        self.measurement_matrix = motion_model::measurement_matrix();
        self.kalman_gain.fill(0.0);
        self.innovation.fill(0.0);
        self.innovation_cov.fill(0.0);
    }

    /// Put a pose straight into the state; rates are left at zero
    pub fn seed(&mut self, pose: &PoseVector) {
        self.state.fixed_rows_mut::<NUM_MEASUREMENT_DOF>(0).copy_from(pose);
        self.state_prior.copy_from(&self.state);
    }

    /// Time update: x⁻ = F x, P⁻ = F P Fᵀ + Q
    pub fn predict(&mut self) {
        let f = &self.transition_matrix;
        self.state_prior = f * self.state;
        self.state_cov_prior = f * self.state_cov * f.transpose() + self.process_noise_cov;
        symmetrize(&mut self.state_cov_prior);
    }

    /// Measurement update against the prior from `predict`
    ///
    /// If the innovation covariance cannot be inverted reliably, the prior
    /// is accepted unchanged and the reason is returned.
    pub fn correct(&mut self, measurement: &PoseVector) -> Result<(), Degradation> {
        let h = self.measurement_matrix;
        let h_t = h.transpose();

        let s = h * self.state_cov_prior * h_t + self.measurement_noise_cov;
        let s_inv = match self.checked_inverse(&s) {
            Ok(inv) => inv,
            Err(degradation) => {
                self.accept_prior();
                return Err(degradation);
            }
        };

        let k = self.state_cov_prior * h_t * s_inv;
        let innovation = measurement - h * self.state_prior;

        self.state = self.state_prior + k * innovation;

        // Joseph form keeps P symmetric positive semidefinite under rounding
        let i_kh = StateMatrix::identity() - k * h;
        self.state_cov = i_kh * self.state_cov_prior * i_kh.transpose()
            + k * self.measurement_noise_cov * k.transpose();
        symmetrize(&mut self.state_cov);

        self.kalman_gain = k;
        self.innovation = innovation;
        self.innovation_cov = s;
        Ok(())
    }

    /// Prediction-only frame: the prior becomes the posterior
    pub fn accept_prior(&mut self) {
        self.state = self.state_prior;
        self.state_cov = self.state_cov_prior;
    }

    fn checked_inverse(&self, s: &MeasureMatrix) -> Result<MeasureMatrix, Degradation> {
        if !s.iter().all(|v| v.is_finite()) {
            return Err(Degradation::SingularInnovation {
                condition_number: f64::INFINITY,
            });
        }

        let eig = s.symmetric_eigenvalues();
        let max = eig.max();
        let min = eig.min();
        let condition_number = if min > 0.0 { max / min } else { f64::INFINITY };
        if !(condition_number <= self.config.max_condition_number) {
            return Err(Degradation::SingularInnovation { condition_number });
        }

        s.try_inverse()
            .ok_or(Degradation::SingularInnovation { condition_number })
    }

    /// Replace the measurement noise covariance
    pub fn set_measurement_noise(&mut self, r: MeasureMatrix) {
        self.measurement_noise_cov = r;
    }

    /// Current pose estimate
    pub fn pose(&self) -> PoseVector {
        self.state.fixed_rows::<NUM_MEASUREMENT_DOF>(0).into_owned()
    }

    /// Current pose rate estimate (units per second)
    pub fn rates(&self) -> PoseVector {
        self.state
            .fixed_rows::<NUM_MEASUREMENT_DOF>(NUM_MEASUREMENT_DOF)
            .into_owned()
    }

    /// Posterior variance of each pose axis
    pub fn pose_variances(&self) -> PoseVector {
        PoseVector::from_fn(|i, _| self.state_cov[(i, i)])
    }

    pub fn is_finite(&self) -> bool {
        self.state.iter().all(|v| v.is_finite()) && self.state_cov.iter().all(|v| v.is_finite())
    }
}

fn symmetrize(m: &mut StateMatrix) {
    let t = m.transpose();
    *m = (*m + t) * 0.5;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::{NoiseSettings, ProcessNoiseConfig};
    use approx::assert_relative_eq;

    fn estimator() -> KalmanEstimator {
        KalmanEstimator::new(
            EstimatorConfig::default(),
            motion_model::measurement_noise(&NoiseSettings::default()),
        )
    }

    fn load_model(kf: &mut KalmanEstimator, dt: f64) {
        kf.transition_matrix = motion_model::transition_matrix(dt);
        kf.process_noise_cov = motion_model::base_process_noise(dt, &ProcessNoiseConfig::default());
    }

    fn assert_psd(p: &StateMatrix) {
        assert_relative_eq!(*p, p.transpose(), epsilon = 1e-9);
        let eig = p.symmetric_eigenvalues();
        let tol = 1e-9 * eig.max().abs().max(1.0);
        assert!(eig.iter().all(|&e| e >= -tol), "eigenvalues {:?}", eig);
    }

    #[test]
    fn test_init_state() {
        let kf = estimator();
        assert_eq!(kf.state, StateVector::zeros());
        assert_eq!(kf.state_cov[(0, 0)], EstimatorConfig::default().initial_pose_variance);
        assert_eq!(kf.state_cov[(11, 11)], EstimatorConfig::default().initial_rate_variance);
        assert_eq!(kf.state_cov[(0, 1)], 0.0);
        assert_eq!(kf.measurement_matrix, motion_model::measurement_matrix());
    }

    #[test]
    fn test_prediction_follows_rate() {
        let mut kf = estimator();
        kf.state[0] = 1.0;
        kf.state[6] = 3.0;
        load_model(&mut kf, 0.5);
        kf.predict();

        assert_relative_eq!(kf.state_prior[0], 2.5);
        assert_relative_eq!(kf.state_prior[6], 3.0);
        assert!(kf.state_cov_prior[(0, 0)] > kf.state_cov[(0, 0)]);
        // posterior untouched until correct / accept_prior
        assert_relative_eq!(kf.state[0], 1.0);
    }

    #[test]
    fn test_correction_pulls_toward_measurement() {
        let mut kf = estimator();
        load_model(&mut kf, 1.0 / 60.0);
        kf.predict();

        let z = PoseVector::new(1.0, -2.0, 0.5, 10.0, 0.0, -5.0);
        kf.correct(&z).unwrap();

        // huge initial uncertainty: posterior lands almost on the measurement
        for i in 0..6 {
            assert_relative_eq!(kf.state[i], z[i], epsilon = 1e-3);
        }
        assert_relative_eq!(kf.innovation, z, epsilon = 1e-12);
        assert!(kf.state_cov[(0, 0)] < 0.011);
        assert_psd(&kf.state_cov);
    }

    #[test]
    fn test_repeated_measurements_reduce_uncertainty() {
        let mut kf = estimator();
        let z = PoseVector::repeat(1.0);
        for _ in 0..50 {
            load_model(&mut kf, 1.0 / 60.0);
            kf.predict();
            kf.correct(&z).unwrap();
        }
        // R is 0.01 on every axis at the default sliders
        assert!(kf.state_cov[(0, 0)] < 0.01);
        assert!(kf.state_cov[(6, 6)] < EstimatorConfig::default().initial_rate_variance);
        assert_relative_eq!(kf.pose(), z, epsilon = 1e-3);
        assert_psd(&kf.state_cov);
    }

    #[test]
    fn test_zero_dt_is_pure_measurement_update() {
        let mut kf = estimator();
        load_model(&mut kf, 1.0 / 60.0);
        kf.predict();
        kf.correct(&PoseVector::repeat(0.5)).unwrap();
        let cov_before = kf.state_cov;

        load_model(&mut kf, 0.0);
        kf.predict();
        assert_eq!(kf.state_cov_prior, cov_before);
        kf.correct(&PoseVector::repeat(0.5)).unwrap();

        assert!(kf.is_finite());
        assert!(kf.state_cov[(0, 0)] <= cov_before[(0, 0)]);
        assert_psd(&kf.state_cov);
    }

    #[test]
    fn test_singular_innovation_keeps_prior() {
        let mut kf = estimator();
        kf.state_cov[(0, 0)] = f64::INFINITY;
        load_model(&mut kf, 1.0 / 60.0);
        kf.predict();
        let prior = kf.state_prior;

        let result = kf.correct(&PoseVector::repeat(1.0));
        assert!(matches!(result, Err(Degradation::SingularInnovation { .. })));
        assert_eq!(kf.state, prior);
    }

    #[test]
    fn test_ill_conditioned_innovation_is_rejected() {
        let mut kf = KalmanEstimator::new(
            EstimatorConfig {
                max_condition_number: 10.0,
                ..EstimatorConfig::default()
            },
            motion_model::measurement_noise(&NoiseSettings::default()),
        );
        kf.state_cov[(0, 0)] = 1.0e6;
        kf.state_cov[(1, 1)] = 1.0e-3;
        load_model(&mut kf, 0.0);
        kf.predict();

        match kf.correct(&PoseVector::zeros()) {
            Err(Degradation::SingularInnovation { condition_number }) => {
                assert!(condition_number > 10.0)
            }
            other => panic!("expected singular innovation, got {:?}", other),
        }
    }

    #[test]
    fn test_seed_sets_pose_only() {
        let mut kf = estimator();
        let pose = PoseVector::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        kf.seed(&pose);
        assert_eq!(kf.pose(), pose);
        assert_eq!(kf.rates(), PoseVector::zeros());

        kf.init();
        assert_eq!(kf.pose(), PoseVector::zeros());
    }
}
