//! Synthetic head-tracker input for demos and end-to-end tests
//!
//! Generates a smooth head motion (slow sway plus a periodic yaw sweep),
//! adds Gaussian sensor noise, and randomly drops or repeats frames the way
//! a real tracker does when it misses a camera frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};

use crate::core::PoseVector;
use crate::processing::pipeline::FilterPipeline;
use crate::utils::clock::Clock;
use crate::validation::FrameMode;

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct TrajectoryConfig {
    /// Frame period (seconds)
    pub dt: f64,
    pub frames: usize,
    /// Measurement noise standard deviation on x, y, z
    pub position_noise: f64,
    /// Measurement noise standard deviation on yaw, pitch, roll (degrees)
    pub rotation_noise: f64,
    /// Peak yaw of the head sweep (degrees)
    pub yaw_amplitude: f64,
    /// Duration of one full yaw sweep (seconds)
    pub yaw_period: f64,
    /// Peak sideways sway
    pub sway_amplitude: f64,
    /// Chance that a frame repeats the previous sample
    pub stale_probability: f64,
    pub seed: u64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            frames: 1200,
            position_noise: 0.1,
            rotation_noise: 0.1,
            yaw_amplitude: 10.0,
            yaw_period: 8.0,
            sway_amplitude: 1.0,
            stale_probability: 0.05,
            seed: 42,
        }
    }
}

/// One frame as the host would see it
#[derive(Debug, Clone)]
pub struct TrackerSample {
    pub t: f64,
    pub truth: PoseVector,
    pub measurement: PoseVector,
    pub fresh: bool,
}

/// Iterator over noisy tracker frames
pub struct SyntheticTracker {
    config: TrajectoryConfig,
    rng: StdRng,
    position_noise: Normal<f64>,
    rotation_noise: Normal<f64>,
    frame: usize,
    last_measurement: Option<PoseVector>,
}

impl SyntheticTracker {
    /// Fails if either noise level is negative or not finite
    pub fn new(config: TrajectoryConfig) -> Result<Self, NormalError> {
        if !(config.position_noise >= 0.0 && config.rotation_noise >= 0.0) {
            return Err(NormalError::BadVariance);
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            position_noise: Normal::new(0.0, config.position_noise)?,
            rotation_noise: Normal::new(0.0, config.rotation_noise)?,
            frame: 0,
            last_measurement: None,
            config,
        })
    }

    /// Noise-free pose at time `t`
    pub fn truth_at(&self, t: f64) -> PoseVector {
        let w = std::f64::consts::TAU / self.config.yaw_period;
        PoseVector::new(
            self.config.sway_amplitude * (0.5 * w * t).sin(),
            0.0,
            0.25 * self.config.sway_amplitude * (0.25 * w * t).sin(),
            self.config.yaw_amplitude * (w * t).sin(),
            0.3 * self.config.yaw_amplitude * (0.5 * w * t).cos(),
            0.0,
        )
    }
}

impl Iterator for SyntheticTracker {
    type Item = TrackerSample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame >= self.config.frames {
            return None;
        }
        let t = self.frame as f64 * self.config.dt;
        self.frame += 1;
        let truth = self.truth_at(t);

        let stale = self.rng.gen::<f64>() < self.config.stale_probability;
        let (measurement, fresh) = match self.last_measurement {
            Some(last) if stale => (last, false),
            _ => {
                let mut m = truth;
                for i in 0..3 {
                    m[i] += self.position_noise.sample(&mut self.rng);
                    m[i + 3] += self.rotation_noise.sample(&mut self.rng);
                }
                (m, true)
            }
        };
        self.last_measurement = Some(measurement);

        Some(TrackerSample {
            t,
            truth,
            measurement,
            fresh,
        })
    }
}

/// Error and jitter figures for one simulated session
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub frames: usize,
    pub stale_frames: usize,
    pub raw_rms_error: f64,
    pub filtered_rms_error: f64,
    /// RMS of the raw frame-to-frame change not explained by true motion
    pub raw_jitter: f64,
    /// Same measure on the filter output
    pub filtered_jitter: f64,
}

/// Run `pipeline` over the synthetic trajectory with explicit frame timing
pub fn run_session<C: Clock>(
    pipeline: &mut FilterPipeline<C>,
    config: TrajectoryConfig,
) -> Result<SessionSummary, NormalError> {
    let dt = config.dt;
    let tracker = SyntheticTracker::new(config)?;

    let mut raw_errors = Vec::new();
    let mut filtered_errors = Vec::new();
    let mut raw_steps = Vec::new();
    let mut filtered_steps = Vec::new();
    // (measurement, output, truth) of the previous frame
    let mut previous: Option<(PoseVector, PoseVector, PoseVector)> = None;
    let mut summary = SessionSummary::default();

    for sample in tracker {
        let report = pipeline.step(&sample.measurement, sample.fresh, dt);
        summary.frames += 1;
        if !sample.fresh {
            summary.stale_frames += 1;
        }
        if report.mode == FrameMode::Seeded {
            previous = Some((sample.measurement, report.output, sample.truth));
            continue;
        }

        raw_errors.push((sample.measurement - sample.truth).norm());
        filtered_errors.push((report.output - sample.truth).norm());
        if let Some((raw_prev, out_prev, truth_prev)) = previous {
            let motion = sample.truth - truth_prev;
            raw_steps.push((sample.measurement - raw_prev - motion).norm());
            filtered_steps.push((report.output - out_prev - motion).norm());
        }
        previous = Some((sample.measurement, report.output, sample.truth));
    }

    summary.raw_rms_error = rms(&raw_errors);
    summary.filtered_rms_error = rms(&filtered_errors);
    summary.raw_jitter = rms(&raw_steps);
    summary.filtered_jitter = rms(&filtered_steps);
    Ok(summary)
}

/// Root mean square; zero for an empty slice
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|&v| v * v).sum();
    (sum_sq / values.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::pipeline::TrackingState;

    #[test]
    fn test_tracker_is_reproducible() {
        let tracker = || SyntheticTracker::new(TrajectoryConfig::default()).unwrap();
        let a: Vec<_> = tracker().take(50).collect();
        let b: Vec<_> = tracker().take(50).collect();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.measurement, y.measurement);
            assert_eq!(x.fresh, y.fresh);
        }
    }

    #[test]
    fn test_stale_frames_repeat_previous_sample() {
        let config = TrajectoryConfig {
            stale_probability: 0.5,
            frames: 200,
            ..TrajectoryConfig::default()
        };
        let samples: Vec<_> = SyntheticTracker::new(config).unwrap().collect();
        assert_eq!(samples.len(), 200);
        assert!(samples[0].fresh);
        assert!(samples.iter().any(|s| !s.fresh));
        for pair in samples.windows(2) {
            if !pair[1].fresh {
                assert_eq!(pair[1].measurement, pair[0].measurement);
            }
        }
    }

    #[test]
    fn test_negative_noise_is_rejected() {
        let config = TrajectoryConfig {
            position_noise: -1.0,
            ..TrajectoryConfig::default()
        };
        assert!(matches!(SyntheticTracker::new(config), Err(NormalError::BadVariance)));

        let config = TrajectoryConfig {
            rotation_noise: f64::NAN,
            ..TrajectoryConfig::default()
        };
        assert!(SyntheticTracker::new(config).is_err());

        let config = TrajectoryConfig {
            position_noise: 0.0,
            ..TrajectoryConfig::default()
        };
        let sample = SyntheticTracker::new(config).unwrap().next().unwrap();
        for i in 0..3 {
            assert_eq!(sample.measurement[i], sample.truth[i]);
        }
    }

    #[test]
    fn test_filter_reduces_jitter() {
        let mut pipeline = FilterPipeline::default();
        let summary = run_session(&mut pipeline, TrajectoryConfig::default()).unwrap();

        assert_eq!(summary.frames, 1200);
        assert!(summary.stale_frames > 0);
        assert!(summary.filtered_jitter < 0.5 * summary.raw_jitter);
        assert!(summary.filtered_rms_error < summary.raw_rms_error);
        assert_ne!(pipeline.state(), TrackingState::Uninitialized);
        assert_eq!(pipeline.diagnostics().frames, 1200);
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[]), 0.0);
        let expected = ((0.01_f64 + 0.04 + 0.09) / 3.0).sqrt();
        assert!((rms(&[0.1, 0.2, 0.3]) - expected).abs() < 1e-12);
    }
}
