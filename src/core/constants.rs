//! Filter dimensions and default tuning parameters

/// Size of the state vector: pose plus pose rate
pub const NUM_STATE_DOF: usize = 12;
/// Size of the measurement vector: x, y, z, yaw, pitch, roll
pub const NUM_MEASUREMENT_DOF: usize = 6;
/// Number of translational axes at the front of a pose
pub const NUM_POSITION_AXES: usize = 3;

/// Time constant of the innovation covariance estimate (seconds)
pub const DEFAULT_ADAPTIVITY_WINDOW_LENGTH: f64 = 0.5;
/// Process noise scale never drops below this
pub const DEFAULT_MIN_PROCESS_NOISE_SCALE: f64 = 1.0;
/// Process noise scale never rises above this
pub const DEFAULT_MAX_PROCESS_NOISE_SCALE: f64 = 100.0;

pub const DEFAULT_DEADZONE_SCALE: f64 = 2.0;
pub const DEFAULT_DEADZONE_EXPONENT: f64 = 1.0;
/// Steepness of the soft dead-zone response
pub const DEFAULT_SOFT_RESPONSE_EXPONENT: f64 = 4.0;

/// Random-acceleration sigma for the position axes
pub const DEFAULT_PROCESS_SIGMA_POSITION: f64 = 0.5;
/// Random-acceleration sigma for the rotation axes
pub const DEFAULT_PROCESS_SIGMA_ROTATION: f64 = 0.5;

/// Initial state variance before the first correction
pub const DEFAULT_INITIAL_POSE_VARIANCE: f64 = 100.0 * 100.0;
pub const DEFAULT_INITIAL_RATE_VARIANCE: f64 = 100.0 * 100.0;

/// Innovation covariances worse conditioned than this skip the correction
pub const DEFAULT_MAX_CONDITION_NUMBER: f64 = 1.0e12;

/// Slider position used when nothing else is configured
pub const DEFAULT_SLIDER_VALUE: f64 = 0.5;

/// Longest dead-reckoning stretch before the filter is re-seeded (seconds)
pub const DEFAULT_MAX_PREDICTION_GAP: f64 = 10.0;
