//! Error types and per-session diagnostics

pub mod error;
pub mod diagnostics;

pub use error::{ConfigError, ConfigResult, Degradation};
pub use diagnostics::{DegradationRecord, FilterDiagnostics, FrameMode};
