//! Configuration management for the rep tracker service
//!
//! Runtime configuration is loaded from a JSON file so thresholds, profile
//! defaults and the model artifact can be changed without recompiling.
//! Missing or unreadable files fall back to built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{ExerciseKind, RepThresholds};
use crate::calories::UserProfile;
use crate::pose::ArmSide;

/// Default location of the service configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/rep_tracker.json";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub tracking: TrackingConfig,
    pub calories: CaloriesConfig,
    pub profile: UserProfile,
    pub telemetry: TelemetryConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:5000`
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:5000".to_string(),
        }
    }
}

/// Rep counting parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Arm whose joints feed the angle
    pub arm_side: ArmSide,
    pub bicep_curl: RepThresholds,
    pub lateral_raise: RepThresholds,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            arm_side: ArmSide::Left,
            bicep_curl: ExerciseKind::BicepCurl.default_thresholds(),
            lateral_raise: ExerciseKind::LateralRaise.default_thresholds(),
        }
    }
}

impl TrackingConfig {
    pub fn thresholds(&self, kind: ExerciseKind) -> &RepThresholds {
        match kind {
            ExerciseKind::BicepCurl => &self.bicep_curl,
            ExerciseKind::LateralRaise => &self.lateral_raise,
        }
    }

    /// Replace thresholds whose Down/Up ranges overlap with the defaults.
    fn sanitize(&mut self) {
        for kind in ExerciseKind::ALL {
            let slot = match kind {
                ExerciseKind::BicepCurl => &mut self.bicep_curl,
                ExerciseKind::LateralRaise => &mut self.lateral_raise,
            };
            if !slot.is_valid_for(kind) {
                log::warn!(
                    "[Config] Overlapping {} thresholds (down={}, up={}). Using defaults.",
                    kind,
                    slot.down,
                    slot.up
                );
                *slot = kind.default_thresholds();
            }
        }
    }
}

/// Calorie model settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaloriesConfig {
    /// JSON model artifact; built-in coefficients are used when absent
    pub model_path: Option<PathBuf>,
}

/// Telemetry hub sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub channel_capacity: usize,
    pub history_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            history_capacity: 64,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or defaults if the file doesn't exist or
    /// the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        };
        config.tracking.sanitize();
        config
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calories::Gender;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{}.json", name, std::process::id()));
        fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.tracking.arm_side, ArmSide::Left);
        assert_eq!(config.tracking.bicep_curl.down, 150.0);
        assert_eq!(config.tracking.lateral_raise.up, 75.0);
        assert_eq!(config.profile.age, 25);
        assert_eq!(config.profile.weight, 70.0);
        assert_eq!(config.profile.gender, Gender::Male);
        assert!(config.calories.model_path.is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.server.addr, config.server.addr);
        assert_eq!(parsed.tracking.bicep_curl, config.tracking.bicep_curl);
        assert_eq!(parsed.profile, config.profile);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from_file("/nonexistent/rep_tracker.json");
        assert_eq!(config.server.addr, ServerConfig::default().addr);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = write_temp(
            "rep_tracker_partial",
            r#"{"tracking": {"arm_side": "right"}, "profile": {"age": 40, "weight": 90.5, "gender": 0}}"#,
        );
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.tracking.arm_side, ArmSide::Right);
        assert_eq!(config.tracking.lateral_raise.down, 40.0);
        assert_eq!(config.profile.age, 40);
        assert_eq!(config.profile.gender, Gender::Female);
    }

    #[test]
    fn test_invalid_json_uses_defaults() {
        let path = write_temp("rep_tracker_invalid", "{ not json");
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(config.tracking.bicep_curl.up, 40.0);
    }

    #[test]
    fn test_overlapping_thresholds_are_replaced() {
        let path = write_temp(
            "rep_tracker_overlap",
            r#"{"tracking": {"bicep_curl": {"down": 30.0, "up": 60.0}, "lateral_raise": {"down": 30.0, "up": 80.0}}}"#,
        );
        let config = AppConfig::load_from_file(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(
            config.tracking.bicep_curl,
            ExerciseKind::BicepCurl.default_thresholds()
        );
        assert_eq!(config.tracking.lateral_raise.down, 30.0);
        assert_eq!(config.tracking.lateral_raise.up, 80.0);
    }
}
