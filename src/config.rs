//! Configuration for the Fidget Sentinel.
//!
//! There is no configuration file. The detection and timing constants are
//! compiled in and `Config::default()` carries them; the binary only swaps
//! the runtime wiring (service endpoint, capture size).

use crate::core::alert::ALERT_COOLDOWN;
use crate::core::movement::{HISTORY_CAPACITY, SENSITIVITY};
use crate::emotion_client::EmotionServiceConfig;
use crate::face::pipeline::POLL_INTERVAL;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Shoulder displacement over the window that counts as movement
    pub sensitivity: f64,

    /// Number of pose samples compared (newest against oldest)
    pub history_capacity: usize,

    /// How long a fidgeting alert stays up and blocks new alerts
    #[serde(with = "duration_ms")]
    pub alert_cooldown: Duration,

    /// Interval between face-pipeline ticks
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,

    /// Video capture settings
    pub capture: CaptureConfig,

    /// Remote emotion service
    pub emotion_service: EmotionServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensitivity: SENSITIVITY,
            history_capacity: HISTORY_CAPACITY,
            alert_cooldown: ALERT_COOLDOWN,
            poll_interval: POLL_INTERVAL,
            capture: CaptureConfig::default(),
            emotion_service: EmotionServiceConfig::default(),
        }
    }
}

impl Config {
    /// Check that the configuration can drive the loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sensitivity must be a positive number, got {}",
                self.sensitivity
            )));
        }
        if self.history_capacity < 2 {
            return Err(ConfigError::Invalid(format!(
                "history capacity must be at least 2, got {}",
                self.history_capacity
            )));
        }
        if self.alert_cooldown.is_zero() || self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "alert cooldown and poll interval must be non-zero".to_string(),
            ));
        }
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(ConfigError::Invalid("capture size must be non-zero".to_string()));
        }
        self.emotion_service
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Render the configuration as pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }
}

/// Video capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Invalid(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
