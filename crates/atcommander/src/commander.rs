//! Command mode state machine.
//!
//! [`AtCommander`] owns the session state for one physical device: whether
//! it is believed to be in command mode, the host UART baud rate, and the
//! last baud rate pushed to the device. Every operation reports success as
//! a plain `bool` and explains failures through the log; nothing panics.

use crate::config::CommanderSettings;
use crate::error::{AtError, Capability, Operation};
use crate::platform::Platform;
use crate::response::{read_bounded, verify_response, MAX_RETRIES};
use crate::transport::{LogFn, Logger, Transport};

/// Host baud rates tried, in order, when looking for the device.
pub const DEFAULT_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Bytes written for a reboot request.
pub const REBOOT_COMMAND_LENGTH: usize = 5;

/// Driver for one AT command capable device.
pub struct AtCommander {
    platform: Platform,
    transport: Transport,
    logger: Logger,
    baud_rates: Vec<u32>,
    connected: bool,
    baud: Option<u32>,
    device_baud: Option<u32>,
}

impl AtCommander {
    /// Create a disconnected driver for `platform` over `transport`.
    pub fn new(platform: Platform, transport: Transport) -> Self {
        AtCommander {
            platform,
            transport,
            logger: Logger::default(),
            baud_rates: DEFAULT_BAUD_RATES.to_vec(),
            connected: false,
            baud: None,
            device_baud: None,
        }
    }

    /// Create a driver from loaded settings.
    pub fn from_settings(settings: &CommanderSettings, transport: Transport) -> Self {
        Self::new(settings.platform.descriptor(), transport)
            .with_baud_rates(settings.baud_rates.clone())
    }

    /// Mirror diagnostics to a host log sink.
    pub fn with_logger(mut self, log: impl FnMut(&str) + 'static) -> Self {
        let sink: LogFn = Box::new(log);
        self.logger = Logger::new(Some(sink));
        self
    }

    /// Replace the ordered list of baud rates swept on command mode entry.
    pub fn with_baud_rates(mut self, baud_rates: Vec<u32>) -> Self {
        self.baud_rates = baud_rates;
        self
    }

    /// The active platform.
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Whether the device is believed to be in command mode.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Current host UART baud rate, once an initializer has run.
    pub fn baud(&self) -> Option<u32> {
        self.baud
    }

    /// Last baud rate successfully pushed to the device.
    pub fn device_baud(&self) -> Option<u32> {
        self.device_baud
    }

    /// Baud rates swept on command mode entry.
    pub fn baud_rates(&self) -> &[u32] {
        &self.baud_rates
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Put the device into command mode, sweeping host baud rates until one
    /// answers.
    ///
    /// A no-op returning true when already connected.
    pub fn enter_command_mode(&mut self) -> bool {
        if self.connected {
            self.logger.debug("Already in command mode");
            return true;
        }

        let command = match self.platform.command(Operation::EnterCommandMode) {
            Ok(command) => command,
            Err(e) => {
                self.logger.warn(&e.to_string());
                return false;
            }
        };

        for baud in self.baud_rates.clone() {
            self.initialize_baud(baud);
            self.logger.debug("Attempting to enter command mode");

            if self.command_request(command.request, command.response) {
                self.connected = true;
                break;
            }
        }

        if self.connected {
            let message = match self.baud {
                Some(baud) => format!("Initialized UART and entered command mode at baud {}", baud),
                None => "Entered command mode at the existing UART baud".to_string(),
            };
            self.logger.debug(&message);
        } else {
            self.logger.warn("Unable to enter command mode at any baud rate");
        }
        self.connected
    }

    /// Return the device to data mode.
    ///
    /// A no-op returning true when not connected. On failure the driver
    /// stays connected.
    pub fn exit_command_mode(&mut self) -> bool {
        if !self.connected {
            self.logger.debug("Not in command mode");
            return true;
        }

        let command = match self.platform.command(Operation::ExitCommandMode) {
            Ok(command) => command,
            Err(e) => {
                self.logger.warn(&e.to_string());
                return false;
            }
        };

        if self.command_request(command.request, command.response) {
            self.logger.debug("Switched back to data mode");
            self.connected = false;
            true
        } else {
            self.logger.warn("Unable to exit command mode");
            false
        }
    }

    /// Reboot the device, entering command mode first if needed.
    ///
    /// The reboot request is written without waiting for a response.
    pub fn reboot(&mut self) -> bool {
        let Some(request) = self.platform.reboot else {
            let e = AtError::Unsupported {
                platform: self.platform.name,
                operation: Operation::Reboot,
            };
            self.logger.warn(&e.to_string());
            return false;
        };

        if !self.enter_command_mode() {
            self.logger.warn("Unable to enter command mode, can't reboot");
            return false;
        }

        let bytes = request.as_bytes();
        self.write(&bytes[..bytes.len().min(REBOOT_COMMAND_LENGTH)]);
        self.logger.debug(&format!("Rebooting {}", self.platform.name));
        true
    }

    /// Persist the device's settings to flash.
    ///
    /// Returns false without touching the transport when the platform has
    /// no store command. Does not enter command mode itself.
    pub fn store_settings(&mut self) -> bool {
        let Ok(command) = self.platform.command(Operation::StoreSettings) else {
            return false;
        };

        if self.command_request(command.request, command.response) {
            self.logger.debug("Stored settings into flash memory");
            true
        } else {
            self.logger.warn("Unable to store settings in flash memory");
            false
        }
    }

    /// Change the device's baud rate, entering command mode first if needed.
    ///
    /// On success the new rate is recorded and a settings store is attempted;
    /// a failed store does not undo the change.
    pub fn set_baud(&mut self, baud: u32) -> bool {
        let command = match self.platform.command(Operation::SetBaudRate) {
            Ok(command) => command,
            Err(e) => {
                self.logger.warn(&e.to_string());
                return false;
            }
        };
        let code = match self.platform.map_baud(baud) {
            Ok(code) => code,
            Err(e) => {
                self.logger.warn(&e.to_string());
                return false;
            }
        };

        if !self.enter_command_mode() {
            self.logger.warn("Unable to enter command mode, can't set baud rate");
            return false;
        }

        let request = command.format(code);
        if self.command_request(&request, command.response) {
            self.logger.debug(&format!("Changed device baud rate to {}", baud));
            self.device_baud = Some(baud);
            self.store_settings();
            true
        } else {
            self.logger.warn("Unable to change device baud rate");
            false
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Write a command, wait for the device to settle, then read and verify
    /// exactly `expected.len()` bytes.
    fn command_request(&mut self, request: &str, expected: &str) -> bool {
        self.write(request.as_bytes());
        self.transport.delay_ms(self.platform.response_delay_ms);

        let response = read_bounded(&mut self.transport, expected.len(), MAX_RETRIES);
        verify_response(&mut self.logger, &response, expected)
    }

    fn write(&mut self, bytes: &[u8]) {
        if !self.transport.write_all(bytes) {
            self.logger.warn(&AtError::MissingCallback(Capability::Write).to_string());
        }
    }

    /// Re-clock the host UART. Only the host side changes; the device is
    /// not told anything.
    fn initialize_baud(&mut self, baud: u32) {
        if self.transport.init_baud(baud) {
            self.logger.debug(&format!("Initializing at baud {}", baud));
            self.baud = Some(baud);
        } else {
            self.logger
                .debug("No baud rate initializer set, can't change baud - trying anyway");
        }
    }
}

impl std::fmt::Debug for AtCommander {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtCommander")
            .field("platform", &self.platform.name)
            .field("connected", &self.connected)
            .field("baud", &self.baud)
            .field("device_baud", &self.device_baud)
            .field("transport", &self.transport)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{RN42, XBEE};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_transport() -> (Transport, Rc<RefCell<Vec<u8>>>) {
        let written = Rc::new(RefCell::new(Vec::new()));
        let sink = written.clone();
        let transport = Transport::new()
            .with_read(|| None)
            .with_write(move |b| sink.borrow_mut().push(b));
        (transport, written)
    }

    #[test]
    fn test_new_commander_is_disconnected() {
        let commander = AtCommander::new(RN42, Transport::new());
        assert!(!commander.is_connected());
        assert_eq!(commander.baud(), None);
        assert_eq!(commander.device_baud(), None);
        assert_eq!(commander.baud_rates(), &DEFAULT_BAUD_RATES);
    }

    #[test]
    fn test_exit_while_disconnected_is_noop() {
        let (transport, written) = recording_transport();
        let mut commander = AtCommander::new(RN42, transport);
        assert!(commander.exit_command_mode());
        assert!(written.borrow().is_empty());
    }

    #[test]
    fn test_store_settings_unsupported_on_rn42() {
        let (transport, written) = recording_transport();
        let mut commander = AtCommander::new(RN42, transport);
        assert!(!commander.store_settings());
        assert!(written.borrow().is_empty());
    }

    #[test]
    fn test_reboot_unsupported_on_xbee() {
        let (transport, written) = recording_transport();
        let mut commander = AtCommander::new(XBEE, transport);
        assert!(!commander.reboot());
        assert!(written.borrow().is_empty());
    }

    #[test]
    fn test_set_baud_rejects_unmapped_rate() {
        let (transport, written) = recording_transport();
        let mut commander = AtCommander::new(XBEE, transport);
        assert!(!commander.set_baud(250000));
        assert!(written.borrow().is_empty());
        assert_eq!(commander.device_baud(), None);
    }

    #[test]
    fn test_missing_baud_initializer_still_sweeps() {
        let (transport, written) = recording_transport();
        let mut commander = AtCommander::new(RN42, transport).with_baud_rates(vec![9600, 115200]);
        assert!(!commander.enter_command_mode());
        assert_eq!(written.borrow().as_slice(), b"$$$$$$");
        assert_eq!(commander.baud(), None);
    }
}
