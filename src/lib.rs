//! Kalman Pose Filter
//!
//! Real-time smoothing of 6-DoF head-tracking poses (x, y, z, yaw, pitch, roll)
//! with a constant-velocity Kalman estimator, adaptive process noise and a
//! variance-scaled dead zone.

pub mod core;
pub mod processing;
pub mod validation;
pub mod utils;
pub mod simulation;

// Re-export commonly used types
pub use crate::core::{PoseArray, PoseVector, StateVector, NUM_MEASUREMENT_DOF, NUM_STATE_DOF};
pub use crate::processing::{
    DeadzoneFilter, FilterPipeline, FrameReport, KalmanEstimator, ProcessNoiseScaler,
    TrackingState,
};
pub use crate::validation::{ConfigError, ConfigResult, Degradation, FilterDiagnostics, FrameMode};
pub use crate::utils::{
    Clock, ConfigurationManager, DeadzoneResponse, FilterConfig, FilterControl, ManualClock,
    MonotonicClock, NoiseSettings,
};
