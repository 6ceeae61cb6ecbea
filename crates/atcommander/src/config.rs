//! Serializable driver settings.

use serde::{Deserialize, Serialize};

use crate::commander::DEFAULT_BAUD_RATES;
use crate::platform::PlatformKind;

/// Settings needed to build an [`AtCommander`](crate::AtCommander).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderSettings {
    /// Device family.
    pub platform: PlatformKind,
    /// Host baud rates to sweep, in order, when entering command mode.
    pub baud_rates: Vec<u32>,
}

impl Default for CommanderSettings {
    fn default() -> Self {
        CommanderSettings {
            platform: PlatformKind::default(),
            baud_rates: DEFAULT_BAUD_RATES.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings: CommanderSettings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, CommanderSettings::default());
        assert_eq!(settings.platform, PlatformKind::Rn42);
    }

    #[test]
    fn test_settings_from_yaml() {
        let yaml = "platform: xbee\nbaud_rates: [115200, 9600]\n";
        let settings: CommanderSettings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.platform, PlatformKind::Xbee);
        assert_eq!(settings.baud_rates, vec![115200, 9600]);
    }

    #[test]
    fn test_settings_reject_unknown_platform() {
        assert!(serde_yaml::from_str::<CommanderSettings>("platform: hc05\n").is_err());
    }
}
