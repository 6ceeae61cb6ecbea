//! Host side runner for the AT command driver.
//!
//! Owns a serial port (or a simulated module), loads driver settings from
//! YAML and runs a sequence of command mode actions in one session, so
//! `atcmd enter set-baud=115200 exit` behaves like a single host program.

pub mod config;
pub mod error;
pub mod serial;

use std::fmt;
use std::str::FromStr;

use atcommander::AtCommander;
use tracing::info;

pub use config::RunnerConfig;
pub use error::{RunnerError, RunnerResult};

/// One step of an `atcmd` session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Enter command mode, sweeping baud rates.
    Enter,
    /// Leave command mode.
    Exit,
    /// Change the device baud rate.
    SetBaud(u32),
    /// Persist settings to flash.
    Store,
    /// Reboot the device.
    Reboot,
}

impl Action {
    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Enter => "enter",
            Action::Exit => "exit",
            Action::SetBaud(_) => "set-baud",
            Action::Store => "store",
            Action::Reboot => "reboot",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SetBaud(baud) => write!(f, "set-baud={}", baud),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enter" => Ok(Action::Enter),
            "exit" => Ok(Action::Exit),
            "store" => Ok(Action::Store),
            "reboot" => Ok(Action::Reboot),
            _ => {
                let baud = s
                    .strip_prefix("set-baud=")
                    .ok_or_else(|| format!("unknown action: {}", s))?;
                baud.parse()
                    .map(Action::SetBaud)
                    .map_err(|_| format!("invalid baud rate: {}", baud))
            }
        }
    }
}

/// Run one action, turning a false result into an error.
pub fn execute(commander: &mut AtCommander, action: Action) -> RunnerResult<()> {
    info!("running {}", action);
    let ok = match action {
        Action::Enter => commander.enter_command_mode(),
        Action::Exit => commander.exit_command_mode(),
        Action::SetBaud(baud) => commander.set_baud(baud),
        Action::Store => commander.store_settings(),
        Action::Reboot => commander.reboot(),
    };
    if ok {
        Ok(())
    } else {
        Err(RunnerError::OperationFailed(action.name()))
    }
}

/// Run actions in order, stopping at the first failure.
pub fn run_session(commander: &mut AtCommander, actions: &[Action]) -> RunnerResult<()> {
    for &action in actions {
        execute(commander, action)?;
    }
    info!(
        connected = commander.is_connected(),
        baud = ?commander.baud(),
        device_baud = ?commander.device_baud(),
        "session complete"
    );
    Ok(())
}
