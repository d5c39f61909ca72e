//! Estimation pipeline: model, estimator, noise adaptation, dead zone

pub mod motion_model;
pub mod kalman;
pub mod noise_scaler;
pub mod deadzone;
pub mod pipeline;

pub use kalman::KalmanEstimator;
pub use noise_scaler::ProcessNoiseScaler;
pub use deadzone::DeadzoneFilter;
pub use pipeline::{FilterPipeline, FrameReport, TrackingState};
