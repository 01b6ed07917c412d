//! Entropy device configuration.
//!
//! The strong and fast tiers must point at two distinct devices. The wait
//! timeout only bounds a single readiness wait; a gather as a whole may
//! block for as long as the device stays starved.

use super::DeviceTier;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for the per-wait timeout, one hour.
const MAX_WAIT_TIMEOUT_SECS: u64 = 3600;

/// Device paths and wait policy for the entropy reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Blocking device used for quality levels of 2 and above.
    pub strong_path: PathBuf,
    /// Non-blocking device used for all lower quality levels.
    pub fast_path: PathBuf,
    /// Seconds to wait for readability before notifying the operator.
    pub wait_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            strong_path: PathBuf::from("/dev/random"),
            fast_path: PathBuf::from("/dev/urandom"),
            wait_timeout_secs: 3,
        }
    }
}

impl DeviceConfig {
    /// Creates a configuration with custom device paths.
    pub fn with_paths(strong_path: impl Into<PathBuf>, fast_path: impl Into<PathBuf>) -> Self {
        Self {
            strong_path: strong_path.into(),
            fast_path: fast_path.into(),
            ..Default::default()
        }
    }

    /// Returns the device path for a tier.
    pub fn path(&self, tier: DeviceTier) -> &Path {
        match tier {
            DeviceTier::Strong => &self.strong_path,
            DeviceTier::Fast => &self.fast_path,
        }
    }

    /// Returns the per-wait readiness timeout.
    #[inline]
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strong_path.as_os_str().is_empty() || self.fast_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.strong_path == self.fast_path {
            return Err(ConfigError::SamePath(self.strong_path.clone()));
        }
        if self.wait_timeout_secs == 0 || self.wait_timeout_secs > MAX_WAIT_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout(self.wait_timeout_secs));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("device path must not be empty")]
    EmptyPath,
    #[error("strong and fast tiers both use {}", .0.display())]
    SamePath(PathBuf),
    #[error("invalid wait timeout {0}s (must be 1-3600)")]
    InvalidTimeout(u64),
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { metrics_port: 0 }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.device.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = DeviceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wait_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_same_path_invalid() {
        let config = DeviceConfig::with_paths("/dev/urandom", "/dev/urandom");
        assert!(matches!(config.validate(), Err(ConfigError::SamePath(_))));
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let mut config = DeviceConfig::default();
        config.wait_timeout_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(0))
        ));
    }

    #[test]
    fn test_tier_paths() {
        let config = DeviceConfig::default();
        assert_eq!(config.path(DeviceTier::Strong), Path::new("/dev/random"));
        assert_eq!(config.path(DeviceTier::Fast), Path::new("/dev/urandom"));
    }

    #[test]
    fn test_full_toml() {
        let config = FileConfig::from_toml(
            r#"
            [device]
            strong_path = "/dev/hwrng"
            fast_path = "/dev/urandom"
            wait_timeout_secs = 5

            [output]
            metrics_port = 9100
            "#,
        )
        .unwrap();

        assert_eq!(config.device.strong_path, PathBuf::from("/dev/hwrng"));
        assert_eq!(config.device.wait_timeout_secs, 5);
        assert_eq!(config.output.metrics_port, 9100);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml("[device]\nstrong_path = \"/dev/hwrng\"\n").unwrap();

        assert_eq!(config.device.strong_path, PathBuf::from("/dev/hwrng"));
        assert_eq!(config.device.fast_path, PathBuf::from("/dev/urandom"));
        assert_eq!(config.device.wait_timeout(), Duration::from_secs(3));
        assert_eq!(config.output.metrics_port, 0);

        let config = FileConfig::from_toml("[device]\nwait_timeout_secs = 10\n[output]\n").unwrap();
        assert_eq!(config.device.strong_path, PathBuf::from("/dev/random"));
        assert_eq!(config.device.wait_timeout_secs, 10);
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let result = FileConfig::from_toml(
            r#"
            [device]
            strong_path = "/dev/random"
            fast_path = "/dev/random"
            wait_timeout_secs = 3
            "#,
        );
        assert!(matches!(result, Err(ConfigError::SamePath(_))));

        let result = FileConfig::from_toml("[device");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
