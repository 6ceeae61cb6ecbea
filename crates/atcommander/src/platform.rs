//! Per-device-family command templates and timing.
//!
//! Two families are built in:
//!
//! - **RN-42** (Roving Networks Bluetooth): enters command mode with `$$$`,
//!   leaves with `---`, takes raw baud numbers and reboots with `R,1`.
//! - **XBee** (Digi radio): enters command mode with `+++`, takes an
//!   enumerated baud code and persists settings with `ATWR`. It has no exit
//!   or reboot template; the module drops out of command mode on its own.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AtError, AtResult, Operation};

/// Default pause between writing a command and reading its response.
pub const DEFAULT_RESPONSE_DELAY_MS: u32 = 50;

/// XBee `ATBD` codes, indexed by wire code.
///
/// The second entry is 2300 rather than 2400; devices in the field are
/// configured against this table as-is.
pub const XBEE_BAUD_RATES: [u32; 8] = [1200, 2300, 4800, 9600, 19200, 38400, 57600, 115200];

/// A request and the exact response that acknowledges it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPair {
    /// Bytes sent to the device. The set-baud template carries one `%d`.
    pub request: &'static str,
    /// Literal response expected back, compared byte for byte.
    pub response: &'static str,
}

impl CommandPair {
    const fn new(request: &'static str, response: &'static str) -> Self {
        CommandPair { request, response }
    }

    /// Substitute a numeric argument into the request template.
    pub fn format(&self, value: u32) -> String {
        self.request.replacen("%d", &value.to_string(), 1)
    }
}

/// Translation from a baud rate in bits/second to the device's wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudMapper {
    /// The device takes the rate verbatim.
    Passthrough,
    /// The device takes an index into [`XBEE_BAUD_RATES`].
    XbeeCode,
}

impl BaudMapper {
    /// Map a baud rate, or `None` if this mapper has no code for it.
    pub fn map(&self, baud: u32) -> Option<u32> {
        match self {
            BaudMapper::Passthrough => Some(baud),
            BaudMapper::XbeeCode => XBEE_BAUD_RATES
                .iter()
                .position(|&rate| rate == baud)
                .map(|code| code as u32),
        }
    }

    /// Reverse of [`map`](Self::map).
    pub fn unmap(&self, code: u32) -> Option<u32> {
        match self {
            BaudMapper::Passthrough => Some(code),
            BaudMapper::XbeeCode => XBEE_BAUD_RATES.get(code as usize).copied(),
        }
    }
}

/// Immutable description of one device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    /// Human readable family name.
    pub name: &'static str,
    /// Settle time after writing a command, before reading.
    pub response_delay_ms: u32,
    /// Baud rate to wire value translation.
    pub baud_mapper: BaudMapper,
    /// Command mode entry.
    pub enter_command_mode: Option<CommandPair>,
    /// Command mode exit.
    pub exit_command_mode: Option<CommandPair>,
    /// Baud rate change; the request is a `%d` template.
    pub set_baud_rate: Option<CommandPair>,
    /// Persist settings to flash.
    pub store_settings: Option<CommandPair>,
    /// Reboot request. The device drops the link, so no response is read.
    pub reboot: Option<&'static str>,
}

impl Platform {
    /// Map a baud rate through this platform's mapper.
    pub fn map_baud(&self, baud: u32) -> AtResult<u32> {
        self.baud_mapper.map(baud).ok_or(AtError::UnmappedBaudRate {
            platform: self.name,
            baud,
        })
    }

    /// The template pair for an operation, or `Unsupported`.
    ///
    /// Reboot has no response literal and is reached via [`Platform::reboot`].
    pub fn command(&self, operation: Operation) -> AtResult<CommandPair> {
        let pair = match operation {
            Operation::EnterCommandMode => self.enter_command_mode,
            Operation::ExitCommandMode => self.exit_command_mode,
            Operation::SetBaudRate => self.set_baud_rate,
            Operation::StoreSettings => self.store_settings,
            Operation::Reboot => None,
        };
        pair.ok_or(AtError::Unsupported {
            platform: self.name,
            operation,
        })
    }
}

/// Roving Networks RN-42 Bluetooth module.
pub const RN42: Platform = Platform {
    name: "RN-42",
    response_delay_ms: DEFAULT_RESPONSE_DELAY_MS,
    baud_mapper: BaudMapper::Passthrough,
    enter_command_mode: Some(CommandPair::new("$$$", "CMD\r\n")),
    exit_command_mode: Some(CommandPair::new("---", "END\r\n")),
    set_baud_rate: Some(CommandPair::new("SU,%d\r\n", "AOK\r\n")),
    store_settings: None,
    reboot: Some("R,1\r\n"),
};

/// Digi XBee radio.
pub const XBEE: Platform = Platform {
    name: "XBee",
    response_delay_ms: 3000,
    baud_mapper: BaudMapper::XbeeCode,
    enter_command_mode: Some(CommandPair::new("+++", "OK")),
    exit_command_mode: None,
    set_baud_rate: Some(CommandPair::new("ATBD %d\r\n", "OK\r\n")),
    store_settings: Some(CommandPair::new("ATWR\r\n", "OK\r\n")),
    reboot: None,
};

/// Selector for the built-in platforms, used in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// [`RN42`]
    #[default]
    Rn42,
    /// [`XBEE`]
    Xbee,
}

impl PlatformKind {
    /// The descriptor for this family.
    pub fn descriptor(&self) -> Platform {
        match self {
            PlatformKind::Rn42 => RN42,
            PlatformKind::Xbee => XBEE,
        }
    }

    /// The string form accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::Rn42 => "rn42",
            PlatformKind::Xbee => "xbee",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = AtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "rn42" => Ok(PlatformKind::Rn42),
            "xbee" => Ok(PlatformKind::Xbee),
            _ => Err(AtError::UnknownPlatform(s.to_string())),
        }
    }
}
