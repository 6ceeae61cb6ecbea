//! Error types for the AT command driver.

use std::fmt;

use thiserror::Error;

/// Platform operations that may be missing from a device family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Enter command mode.
    EnterCommandMode,
    /// Exit command mode.
    ExitCommandMode,
    /// Change the device baud rate.
    SetBaudRate,
    /// Persist settings to flash.
    StoreSettings,
    /// Reboot the device.
    Reboot,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::EnterCommandMode => write!(f, "enter command mode"),
            Operation::ExitCommandMode => write!(f, "exit command mode"),
            Operation::SetBaudRate => write!(f, "set baud rate"),
            Operation::StoreSettings => write!(f, "store settings"),
            Operation::Reboot => write!(f, "reboot"),
        }
    }
}

/// Host transport callbacks that may be left unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Single byte read.
    Read,
    /// Single byte write.
    Write,
    /// Millisecond delay.
    Delay,
    /// Host UART baud rate initializer.
    BaudInitializer,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Read => write!(f, "read"),
            Capability::Write => write!(f, "write"),
            Capability::Delay => write!(f, "delay"),
            Capability::BaudInitializer => write!(f, "baud rate initializer"),
        }
    }
}

/// Errors that can occur while talking to an AT device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AtError {
    /// The device answered with the wrong number of bytes.
    #[error("expected {expected} bytes in response but received {actual}")]
    ResponseLength {
        /// Length of the expected response.
        expected: usize,
        /// Number of bytes actually read.
        actual: usize,
    },

    /// The device answered with the right length but the wrong content.
    #[error("expected {expected:?} response but got {actual:?}")]
    ResponseContent {
        /// Expected response literal.
        expected: String,
        /// What was read, lossily decoded.
        actual: String,
    },

    /// The active platform has no template for this operation.
    #[error("{operation} is not supported on {platform}")]
    Unsupported {
        /// Platform name.
        platform: &'static str,
        /// The missing operation.
        operation: Operation,
    },

    /// The platform's baud mapper has no wire code for the rate.
    #[error("baud rate {baud} has no wire code on {platform}")]
    UnmappedBaudRate {
        /// Platform name.
        platform: &'static str,
        /// Requested baud rate.
        baud: u32,
    },

    /// A platform name did not match any built-in descriptor.
    #[error("unknown platform: {0}")]
    UnknownPlatform(String),

    /// A required host callback was not supplied.
    #[error("no {0} function set")]
    MissingCallback(Capability),
}

/// Result type alias for AT command operations.
pub type AtResult<T> = Result<T, AtError>;
