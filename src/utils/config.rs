use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::constants::*;
use crate::validation::{ConfigError, ConfigResult};

/// The two user-facing noise sliders, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Position measurement noise slider
    pub position_slider: f64,
    /// Rotation measurement noise slider
    pub rotation_slider: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            position_slider: DEFAULT_SLIDER_VALUE,
            rotation_slider: DEFAULT_SLIDER_VALUE,
        }
    }
}

impl NoiseSettings {
    /// Build settings, clamping both sliders into [0, 1]
    pub fn new(position_slider: f64, rotation_slider: f64) -> Self {
        Self {
            position_slider,
            rotation_slider,
        }
        .sanitized()
    }

    /// Map a slider position to a noise standard deviation: 10^(4v - 3)
    pub fn map_slider_value(v: f64) -> f64 {
        10f64.powf(v * 4.0 - 3.0)
    }

    /// Standard deviation of position measurements
    pub fn position_sigma(&self) -> f64 {
        Self::map_slider_value(self.position_slider)
    }

    /// Standard deviation of rotation measurements (degrees)
    pub fn rotation_sigma(&self) -> f64 {
        Self::map_slider_value(self.rotation_slider)
    }

    pub fn sanitized(self) -> Self {
        Self {
            position_slider: clamp_slider("noise.position_slider", self.position_slider),
            rotation_slider: clamp_slider("noise.rotation_slider", self.rotation_slider),
        }
    }
}

/// Baseline random-acceleration model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessNoiseConfig {
    pub sigma_position: f64,
    pub sigma_rotation: f64,
}

impl Default for ProcessNoiseConfig {
    fn default() -> Self {
        Self {
            sigma_position: DEFAULT_PROCESS_SIGMA_POSITION,
            sigma_rotation: DEFAULT_PROCESS_SIGMA_ROTATION,
        }
    }
}

/// Adaptive process-noise scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptivityConfig {
    /// Time constant of the innovation covariance estimate (seconds)
    pub window_length: f64,
    pub min_scale: f64,
    pub max_scale: f64,
}

impl Default for AdaptivityConfig {
    fn default() -> Self {
        Self {
            window_length: DEFAULT_ADAPTIVITY_WINDOW_LENGTH,
            min_scale: DEFAULT_MIN_PROCESS_NOISE_SCALE,
            max_scale: DEFAULT_MAX_PROCESS_NOISE_SCALE,
        }
    }
}

/// What an axis does once it leaves its dead zone
///
/// `Snap` and `Boundary` hold the output perfectly still inside the zone,
/// so a slow drift comes out as a staircase of steps one zone width high.
/// `Soft` never holds completely and follows slow drifts smoothly, at the
/// cost of letting a fraction of small jitter through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DeadzoneResponse {
    /// Jump straight to the input
    Snap,
    /// Follow the input, trailing by the dead-zone width
    Boundary,
    /// Smooth power-curve response, no hard hold
    Soft { exponent: f64 },
}

impl Default for DeadzoneResponse {
    fn default() -> Self {
        DeadzoneResponse::Snap
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadzoneConfig {
    /// Multiplier on the uncertainty term; 0 disables the dead zone
    pub scale: f64,
    /// Power applied to the per-axis standard deviation
    pub exponent: f64,
    pub response: DeadzoneResponse,
}

impl Default for DeadzoneConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_DEADZONE_SCALE,
            exponent: DEFAULT_DEADZONE_EXPONENT,
            response: DeadzoneResponse::Snap,
        }
    }
}

impl DeadzoneConfig {
    /// Dead zone switched off, output follows the estimator exactly
    pub fn disabled() -> Self {
        Self {
            scale: 0.0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub initial_pose_variance: f64,
    pub initial_rate_variance: f64,
    /// Corrections are skipped when the innovation covariance is worse conditioned
    pub max_condition_number: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            initial_pose_variance: DEFAULT_INITIAL_POSE_VARIANCE,
            initial_rate_variance: DEFAULT_INITIAL_RATE_VARIANCE,
            max_condition_number: DEFAULT_MAX_CONDITION_NUMBER,
        }
    }
}

/// Complete filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub noise: NoiseSettings,
    pub process: ProcessNoiseConfig,
    pub adaptivity: AdaptivityConfig,
    pub deadzone: DeadzoneConfig,
    pub estimator: EstimatorConfig,
    /// Dead-reckoning longer than this (seconds) re-seeds on the next measurement
    pub max_prediction_gap: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::default(),
            process: ProcessNoiseConfig::default(),
            adaptivity: AdaptivityConfig::default(),
            deadzone: DeadzoneConfig::default(),
            estimator: EstimatorConfig::default(),
            max_prediction_gap: DEFAULT_MAX_PREDICTION_GAP,
        }
    }
}

impl FilterConfig {
    /// Load configuration from a JSON file. Out-of-range values are clamped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Parse configuration from JSON text. Missing fields take defaults.
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: FilterConfig = serde_json::from_str(content)?;
        Ok(config.sanitized())
    }

    pub fn to_json_string(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = self.to_json_string()?;
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Return a copy with every parameter forced into its valid range
    pub fn sanitized(&self) -> Self {
        let adaptivity = &self.adaptivity;
        let estimator = &self.estimator;
        let deadzone = &self.deadzone;

        let min_scale = clamp_param(
            "adaptivity.min_scale",
            adaptivity.min_scale,
            1e-3,
            1e6,
            DEFAULT_MIN_PROCESS_NOISE_SCALE,
        );
        let max_scale = clamp_param(
            "adaptivity.max_scale",
            adaptivity.max_scale,
            min_scale,
            1e9,
            DEFAULT_MAX_PROCESS_NOISE_SCALE.max(min_scale),
        );

        let response = match deadzone.response {
            DeadzoneResponse::Soft { exponent } => DeadzoneResponse::Soft {
                exponent: clamp_param(
                    "deadzone.response.exponent",
                    exponent,
                    0.1,
                    16.0,
                    DEFAULT_SOFT_RESPONSE_EXPONENT,
                ),
            },
            other => other,
        };

        Self {
            noise: self.noise.sanitized(),
            process: ProcessNoiseConfig {
                sigma_position: clamp_param(
                    "process.sigma_position",
                    self.process.sigma_position,
                    0.0,
                    1e6,
                    DEFAULT_PROCESS_SIGMA_POSITION,
                ),
                sigma_rotation: clamp_param(
                    "process.sigma_rotation",
                    self.process.sigma_rotation,
                    0.0,
                    1e6,
                    DEFAULT_PROCESS_SIGMA_ROTATION,
                ),
            },
            adaptivity: AdaptivityConfig {
                window_length: clamp_param(
                    "adaptivity.window_length",
                    adaptivity.window_length,
                    1e-6,
                    1e6,
                    DEFAULT_ADAPTIVITY_WINDOW_LENGTH,
                ),
                min_scale,
                max_scale,
            },
            deadzone: DeadzoneConfig {
                scale: clamp_param(
                    "deadzone.scale",
                    deadzone.scale,
                    0.0,
                    1e6,
                    DEFAULT_DEADZONE_SCALE,
                ),
                exponent: clamp_param(
                    "deadzone.exponent",
                    deadzone.exponent,
                    0.1,
                    16.0,
                    DEFAULT_DEADZONE_EXPONENT,
                ),
                response,
            },
            estimator: EstimatorConfig {
                initial_pose_variance: clamp_param(
                    "estimator.initial_pose_variance",
                    estimator.initial_pose_variance,
                    1e-9,
                    1e12,
                    DEFAULT_INITIAL_POSE_VARIANCE,
                ),
                initial_rate_variance: clamp_param(
                    "estimator.initial_rate_variance",
                    estimator.initial_rate_variance,
                    1e-9,
                    1e12,
                    DEFAULT_INITIAL_RATE_VARIANCE,
                ),
                max_condition_number: clamp_param(
                    "estimator.max_condition_number",
                    estimator.max_condition_number,
                    1.0,
                    1e16,
                    DEFAULT_MAX_CONDITION_NUMBER,
                ),
            },
            max_prediction_gap: clamp_param(
                "max_prediction_gap",
                self.max_prediction_gap,
                1e-3,
                1e6,
                DEFAULT_MAX_PREDICTION_GAP,
            ),
        }
    }
}

/// Holds a configuration together with the file it came from
#[derive(Debug, Default)]
pub struct ConfigurationManager {
    config: FilterConfig,
    config_file_path: Option<PathBuf>,
    is_modified: bool,
}

impl ConfigurationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager and load the given file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let config = FilterConfig::from_file(&path)?;
        Ok(Self {
            config,
            config_file_path: Some(path.as_ref().to_path_buf()),
            is_modified: false,
        })
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Replace the configuration; values are clamped on the way in
    pub fn update(&mut self, config: FilterConfig) {
        self.config = config.sanitized();
        self.is_modified = true;
    }

    /// Change the noise sliders, returning the clamped values actually stored
    pub fn set_noise(&mut self, position_slider: f64, rotation_slider: f64) -> NoiseSettings {
        self.config.noise = NoiseSettings::new(position_slider, rotation_slider);
        self.is_modified = true;
        self.config.noise
    }

    /// Save to the file the configuration was loaded from
    pub fn save(&mut self) -> ConfigResult<()> {
        let path = self.config_file_path.clone().ok_or(ConfigError::NoPath)?;
        self.save_to_file(path)
    }

    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> ConfigResult<()> {
        self.config.save_to_file(&path)?;
        self.config_file_path = Some(path.as_ref().to_path_buf());
        self.is_modified = false;
        Ok(())
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }
}

fn clamp_slider(name: &str, value: f64) -> f64 {
    clamp_param(name, value, 0.0, 1.0, DEFAULT_SLIDER_VALUE)
}

/// Clamp `value` into `[min, max]`, substituting `fallback` for NaN
fn clamp_param(name: &str, value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_nan() {
        warn!("config {}: NaN replaced by {}", name, fallback);
        return fallback;
    }
    if value < min || value > max {
        let clamped = value.clamp(min, max);
        warn!("config {}: {} out of range [{}, {}], clamped to {}", name, value, min, max, clamped);
        return clamped;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_slider_mapping() {
        assert_relative_eq!(NoiseSettings::map_slider_value(0.0), 1e-3, max_relative = 1e-12);
        assert_relative_eq!(NoiseSettings::map_slider_value(0.5), 0.1, max_relative = 1e-12);
        assert_relative_eq!(NoiseSettings::map_slider_value(1.0), 10.0, max_relative = 1e-12);
    }

    #[test]
    fn test_slider_clamping() {
        let noise = NoiseSettings::new(1.7, -0.2);
        assert_eq!(noise.position_slider, 1.0);
        assert_eq!(noise.rotation_slider, 0.0);

        let noise = NoiseSettings::new(f64::NAN, 0.25);
        assert_eq!(noise.position_slider, DEFAULT_SLIDER_VALUE);
        assert_eq!(noise.rotation_slider, 0.25);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "noise": { "position_slider": 0.2 } }"#;
        let config = FilterConfig::from_json_str(json).unwrap();
        assert_eq!(config.noise.position_slider, 0.2);
        assert_eq!(config.noise.rotation_slider, DEFAULT_SLIDER_VALUE);
        assert_eq!(config.adaptivity.window_length, DEFAULT_ADAPTIVITY_WINDOW_LENGTH);
        assert_eq!(config.deadzone.response, DeadzoneResponse::Snap);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let json = r#"{
            "adaptivity": { "window_length": -3.0, "min_scale": 5.0, "max_scale": 2.0 },
            "deadzone": { "scale": -1.0, "response": { "mode": "soft", "exponent": 100.0 } }
        }"#;
        let config = FilterConfig::from_json_str(json).unwrap();
        assert_eq!(config.adaptivity.window_length, 1e-6);
        assert_eq!(config.adaptivity.min_scale, 5.0);
        assert_eq!(config.adaptivity.max_scale, 5.0);
        assert_eq!(config.deadzone.scale, 0.0);
        assert_eq!(config.deadzone.response, DeadzoneResponse::Soft { exponent: 16.0 });
    }

    #[test]
    fn test_nan_parameters_fall_back_to_defaults() {
        let mut config = FilterConfig::default();
        config.process.sigma_rotation = f64::NAN;
        config.estimator.max_condition_number = f64::NAN;
        config.max_prediction_gap = -5.0;

        let clean = config.sanitized();
        assert_eq!(clean.process.sigma_rotation, DEFAULT_PROCESS_SIGMA_ROTATION);
        assert_eq!(clean.estimator.max_condition_number, DEFAULT_MAX_CONDITION_NUMBER);
        assert_eq!(clean.max_prediction_gap, 1e-3);
        assert_eq!(clean.sanitized(), clean);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(FilterConfig::from_json_str("not json"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let name = format!("pose-filter-config-{}.json", std::process::id());
        let path = std::env::temp_dir().join(name);
        let mut manager = ConfigurationManager::new();
        manager.set_noise(0.3, 0.7);
        assert!(manager.is_modified());
        manager.save_to_file(&path).unwrap();
        assert!(!manager.is_modified());

        let loaded = ConfigurationManager::from_file(&path).unwrap();
        assert_eq!(loaded.config(), manager.config());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_and_missing_path() {
        let err = FilterConfig::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let mut manager = ConfigurationManager::new();
        assert!(matches!(manager.save(), Err(ConfigError::NoPath)));
    }
}
