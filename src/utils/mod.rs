//! Configuration, cross-thread control and time sources

pub mod config;
pub mod control;
pub mod clock;

pub use config::{
    AdaptivityConfig, ConfigurationManager, DeadzoneConfig, DeadzoneResponse, EstimatorConfig,
    FilterConfig, NoiseSettings, ProcessNoiseConfig,
};
pub use control::FilterControl;
pub use clock::{Clock, ManualClock, MonotonicClock};
