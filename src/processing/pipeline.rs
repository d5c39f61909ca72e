//! Per-frame orchestration of estimator, noise scaler and dead zone
//!
//! The host calls one entry point per tracker frame. Each frame runs
//! predict, then correct and adapt when a fresh measurement is present,
//! then the dead zone. Nothing here returns an error: degraded frames are
//! logged, counted in `FilterDiagnostics`, and still produce a finite pose.

use std::time::Instant;

use log::{debug, error, info};

use crate::core::{pose_is_finite, PoseArray, PoseVector, NUM_MEASUREMENT_DOF};
use crate::processing::deadzone::DeadzoneFilter;
use crate::processing::kalman::KalmanEstimator;
use crate::processing::motion_model;
use crate::processing::noise_scaler::ProcessNoiseScaler;
use crate::utils::clock::{Clock, MonotonicClock};
use crate::utils::config::{FilterConfig, NoiseSettings};
use crate::utils::control::FilterControl;
use crate::validation::{Degradation, FilterDiagnostics, FrameMode};

/// Where the pipeline is in its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// No measurement seen since construction or the last reset
    Uninitialized,
    /// Last frame was corrected with a fresh measurement
    Tracking,
    /// Dead-reckoning through a gap in measurements
    Predicting,
}

/// Result of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub output: PoseVector,
    pub mode: FrameMode,
    pub state: TrackingState,
    /// Elapsed time used for prediction (seconds)
    pub dt: f64,
    /// Process noise scale in effect after this frame
    pub process_noise_scale: f64,
}

/// Smoothing filter session for one tracker
pub struct FilterPipeline<C: Clock = MonotonicClock> {
    config: FilterConfig,
    active_noise: NoiseSettings,
    control: FilterControl,
    control_generation: u64,
    clock: C,
    estimator: KalmanEstimator,
    scaler: ProcessNoiseScaler,
    deadzone: DeadzoneFilter,
    state: TrackingState,
    last_frame_time: Option<Instant>,
    last_input: Option<PoseVector>,
    dt_since_measurement: f64,
    diagnostics: FilterDiagnostics,
}

impl FilterPipeline<MonotonicClock> {
    /// Pipeline timed by the system monotonic clock
    pub fn new(config: FilterConfig) -> Self {
        Self::with_clock(config, MonotonicClock)
    }
}

impl Default for FilterPipeline<MonotonicClock> {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

impl<C: Clock> FilterPipeline<C> {
    pub fn with_clock(config: FilterConfig, clock: C) -> Self {
        let config = config.sanitized();
        let active_noise = config.noise;
        let estimator = KalmanEstimator::new(
            config.estimator,
            motion_model::measurement_noise(&active_noise),
        );

        info!(
            "kalman pose filter: position sigma {:.4}, rotation sigma {:.4}, window {:.2}s",
            active_noise.position_sigma(),
            active_noise.rotation_sigma(),
            config.adaptivity.window_length
        );

        let control = FilterControl::new(active_noise);
        Self {
            active_noise,
            control_generation: control.noise_generation(),
            control,
            clock,
            estimator,
            scaler: ProcessNoiseScaler::new(config.adaptivity),
            deadzone: DeadzoneFilter::new(config.deadzone.response),
            state: TrackingState::Uninitialized,
            last_frame_time: None,
            last_input: None,
            dt_since_measurement: 0.0,
            diagnostics: FilterDiagnostics::new(),
            config,
        }
    }

    /// Handle for requesting resets and changing sliders from another thread
    pub fn control(&self) -> FilterControl {
        self.control.clone()
    }

    /// Host entry point with the raw pose layout
    ///
    /// An input identical to the previous one is a repeated tracker sample
    /// and is treated as stale.
    pub fn filter(&mut self, input: &PoseArray, output: &mut PoseArray) {
        let pose = PoseVector::from_column_slice(input);
        let fresh = self.last_input.map_or(true, |last| last != pose);
        let smoothed = self.update(&pose, fresh);
        output.copy_from_slice(smoothed.as_slice());
    }

    /// Process one frame, measuring elapsed time with the pipeline's clock
    pub fn update(&mut self, input: &PoseVector, fresh: bool) -> PoseVector {
        let now = self.clock.now();
        let dt = self
            .last_frame_time
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64());
        let report = self.step(input, fresh, dt);
        self.last_frame_time = Some(now);
        report.output
    }

    /// Process one frame with an explicit elapsed time in seconds
    pub fn step(&mut self, input: &PoseVector, fresh: bool, dt: f64) -> FrameReport {
        self.apply_control();
        self.last_input = Some(*input);

        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let mut fresh = fresh;
        if let Some(axis) = input.iter().position(|v| !v.is_finite()) {
            self.diagnostics
                .record_degradation(&Degradation::NonFiniteMeasurement { axis });
            fresh = false;
        }

        let state = self.state;
        let mode = match state {
            TrackingState::Uninitialized if pose_is_finite(input) => self.seed(input),
            TrackingState::Uninitialized => FrameMode::Held,
            _ => {
                self.dt_since_measurement += dt;
                if fresh && self.dt_since_measurement > self.config.max_prediction_gap {
                    info!(
                        "no measurement for {:.2}s, re-seeding filter",
                        self.dt_since_measurement
                    );
                    self.diagnostics.record_reseed_after_gap();
                    self.reset_components();
                    self.seed(input)
                } else {
                    self.track(input, fresh, dt)
                }
            }
        };

        let output = match mode {
            FrameMode::Seeded | FrameMode::Held => self.deadzone.last_output,
            _ => self.smooth_output(),
        };

        self.diagnostics.record_frame(mode);
        FrameReport {
            output,
            mode,
            state: self.state,
            dt,
            process_noise_scale: self.scaler.scale(),
        }
    }

    /// Discard all history; the next finite input seeds the filter
    pub fn reset(&mut self) {
        self.reset_components();
        self.deadzone.reset();
        self.last_frame_time = None;
        self.last_input = None;
        self.diagnostics.record_reset();
        debug!("filter reset");
    }

    fn reset_components(&mut self) {
        self.estimator.init();
        self.scaler.init();
        self.state = TrackingState::Uninitialized;
        self.dt_since_measurement = 0.0;
    }

    /// Pick up a reset request or slider change published by another thread
    fn apply_control(&mut self) {
        let generation = self.control.noise_generation();
        if generation != self.control_generation {
            self.control_generation = generation;
            let noise = self.control.noise();
            if noise != self.active_noise {
                info!(
                    "noise sliders changed to position {:.3}, rotation {:.3}",
                    noise.position_slider, noise.rotation_slider
                );
                self.active_noise = noise;
                self.config.noise = noise;
                self.estimator
                    .set_measurement_noise(motion_model::measurement_noise(&noise));
                self.control.take_reset();
                self.reset();
                return;
            }
        }
        if self.control.take_reset() {
            self.reset();
        }
    }

    fn seed(&mut self, input: &PoseVector) -> FrameMode {
        self.estimator.seed(input);
        self.deadzone.seed(input);
        self.dt_since_measurement = 0.0;
        self.state = TrackingState::Tracking;
        debug!("filter seeded from first measurement");
        FrameMode::Seeded
    }

    fn track(&mut self, input: &PoseVector, fresh: bool, dt: f64) -> FrameMode {
        let base = motion_model::base_process_noise(dt, &self.config.process);
        self.estimator.transition_matrix = motion_model::transition_matrix(dt);
        self.estimator.process_noise_cov = self.scaler.scaled(&base);
        self.estimator.predict();

        let mode = if fresh {
            match self.estimator.correct(input) {
                Ok(()) => {
                    self.scaler.adapt(&self.estimator, self.dt_since_measurement);
                    self.dt_since_measurement = 0.0;
                    self.state = TrackingState::Tracking;
                    FrameMode::Corrected
                }
                Err(degradation) => {
                    self.diagnostics.record_degradation(&degradation);
                    FrameMode::Degraded
                }
            }
        } else {
            self.estimator.accept_prior();
            self.state = TrackingState::Predicting;
            FrameMode::Predicted
        };

        if !self.estimator.is_finite() {
            error!("estimator state is no longer finite, resetting");
            self.diagnostics.record_degradation(&Degradation::Diverged);
            self.reset_components();
            return FrameMode::Held;
        }
        mode
    }

    fn smooth_output(&mut self) -> PoseVector {
        self.deadzone.set_sizes_from_variances(
            &self.estimator.pose_variances(),
            self.config.deadzone.scale,
            self.config.deadzone.exponent,
        );
        self.deadzone.filter(&self.estimator.pose())
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn estimator(&self) -> &KalmanEstimator {
        &self.estimator
    }

    pub fn scaler(&self) -> &ProcessNoiseScaler {
        &self.scaler
    }

    pub fn deadzone(&self) -> &DeadzoneFilter {
        &self.deadzone
    }

    pub fn diagnostics(&self) -> &FilterDiagnostics {
        &self.diagnostics
    }

    /// Last pose handed to the host
    pub fn last_output(&self) -> PoseArray {
        let mut out = [0.0; NUM_MEASUREMENT_DOF];
        out.copy_from_slice(self.deadzone.last_output.as_slice());
        out
    }
}
