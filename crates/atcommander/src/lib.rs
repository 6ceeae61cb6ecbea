//! AT Command Mode Driver
//!
//! This crate drives serial peripherals that expose an AT style command
//! mode, such as the RN-42 Bluetooth module and XBee radios. It enters and
//! leaves command mode, finds the device's baud rate by trial, and issues
//! configuration commands whose responses must match fixed literals.
//!
//! # Transport
//!
//! The host owns the UART. It supplies byte read/write, delay and baud
//! re-clock callbacks through a [`Transport`]; any of them may be left out
//! and the driver degrades rather than failing hard.
//!
//! # Example
//!
//! ```rust,ignore
//! use atcommander::{AtCommander, Transport, platform::XBEE};
//!
//! let transport = Transport::new()
//!     .with_read(|| uart.try_read())
//!     .with_write(|b| uart.write(b))
//!     .with_delay(|ms| sleep_ms(ms))
//!     .with_baud_initializer(|baud| uart.set_baud(baud));
//!
//! let mut xbee = AtCommander::new(XBEE, transport);
//! if xbee.set_baud(115200) {
//!     println!("radio now at {:?}", xbee.device_baud());
//! }
//! ```

mod commander;
mod config;
mod error;
pub mod platform;
pub mod response;
pub mod sim;
mod transport;

pub use commander::{AtCommander, DEFAULT_BAUD_RATES, REBOOT_COMMAND_LENGTH};
pub use config::CommanderSettings;
pub use error::{AtError, AtResult, Capability, Operation};
pub use platform::{BaudMapper, CommandPair, Platform, PlatformKind};
pub use transport::{BaudInitFn, DelayFn, LogFn, ReadFn, Transport, WriteFn};
