//! Runner configuration file.
//!
//! ```yaml
//! port: /dev/ttyUSB0
//! read_timeout_ms: 10
//! commander:
//!   platform: xbee
//!   baud_rates: [9600, 115200]
//! ```

use std::path::Path;

use atcommander::CommanderSettings;
use serde::{Deserialize, Serialize};

use crate::error::RunnerResult;

/// Default per-byte read timeout on the serial port.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10;

/// Top level `atcmd` configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: Option<String>,
    /// How long a single byte read may block before reporting no data.
    pub read_timeout_ms: u64,
    /// Driver settings.
    pub commander: CommanderSettings,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            port: None,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            commander: CommanderSettings::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> RunnerResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atcommander::PlatformKind;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RunnerConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.read_timeout_ms, DEFAULT_READ_TIMEOUT_MS);
        assert!(config.port.is_none());
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
port: /dev/ttyUSB0
read_timeout_ms: 25
commander:
  platform: xbee
  baud_rates: [9600, 115200]
"#;
        let config = RunnerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.read_timeout_ms, 25);
        assert_eq!(config.commander.platform, PlatformKind::Xbee);
        assert_eq!(config.commander.baud_rates, vec![9600, 115200]);
    }

    #[test]
    fn test_bad_config_is_an_error() {
        assert!(RunnerConfig::from_yaml("read_timeout_ms: soon").is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(RunnerConfig::load("/nonexistent/atcmd.yaml").is_err());
    }
}
