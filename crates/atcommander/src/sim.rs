//! In-process stand-in for a real module.
//!
//! [`SimulatedModule`] answers its platform's command set the way the
//! hardware does, as long as the host UART is clocked at the module's baud
//! rate. Bytes sent at any other rate are treated as line noise and the
//! module stays silent. Every byte written, every host re-clock and every
//! requested delay is recorded so tests can inspect the exchange.
//!
//! ```
//! use atcommander::{platform::RN42, sim::SimulatedModule, AtCommander};
//!
//! let module = SimulatedModule::shared(RN42, 38400);
//! let mut commander = AtCommander::new(RN42, SimulatedModule::transport(&module));
//! assert!(commander.enter_command_mode());
//! assert_eq!(commander.baud(), Some(38400));
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::trace;

use crate::platform::Platform;
use crate::transport::Transport;

/// Reply to a line the module does not understand.
pub const ERROR_RESPONSE: &str = "ERR\r\n";

/// Bytes kept while hunting for the command mode entry sequence.
const MAX_PENDING: usize = 32;

/// A simulated module shared between the transport callbacks and the test.
pub type SharedModule = Rc<RefCell<SimulatedModule>>;

/// Behavioural model of an RN-42 or XBee module.
#[derive(Debug, Clone)]
pub struct SimulatedModule {
    platform: Platform,
    baud: u32,
    configured_baud: u32,
    stored_baud: Option<u32>,
    host_baud: Option<u32>,
    command_mode: bool,
    pending: Vec<u8>,
    outgoing: VecDeque<u8>,
    written: Vec<u8>,
    host_baud_changes: Vec<u32>,
    delays: Vec<u32>,
    reboots: usize,
}

impl SimulatedModule {
    /// A module of the given family listening at `baud`.
    ///
    /// Until the host clocks its UART the line counts as mismatched.
    pub fn new(platform: Platform, baud: u32) -> Self {
        SimulatedModule {
            platform,
            baud,
            configured_baud: baud,
            stored_baud: None,
            host_baud: None,
            command_mode: false,
            pending: Vec::new(),
            outgoing: VecDeque::new(),
            written: Vec::new(),
            host_baud_changes: Vec::new(),
            delays: Vec::new(),
            reboots: 0,
        }
    }

    /// [`new`](Self::new), wrapped for sharing with a [`Transport`].
    pub fn shared(platform: Platform, baud: u32) -> SharedModule {
        Rc::new(RefCell::new(Self::new(platform, baud)))
    }

    /// Build a transport whose four callbacks drive `module`.
    ///
    /// Delays are recorded, not slept.
    pub fn transport(module: &SharedModule) -> Transport {
        let reader = module.clone();
        let writer = module.clone();
        let sleeper = module.clone();
        let clock = module.clone();
        Transport::new()
            .with_read(move || reader.borrow_mut().transmit())
            .with_write(move |byte| writer.borrow_mut().receive(byte))
            .with_delay(move |ms| sleeper.borrow_mut().delays.push(ms))
            .with_baud_initializer(move |baud| clock.borrow_mut().set_host_baud(baud))
    }

    // ========================================================================
    // Line side
    // ========================================================================

    /// Host re-clocked its UART.
    pub fn set_host_baud(&mut self, baud: u32) {
        self.host_baud_changes.push(baud);
        self.host_baud = Some(baud);
    }

    /// Next byte for the host, if the line is in sync and one is queued.
    pub fn transmit(&mut self) -> Option<u8> {
        if !self.in_sync() {
            return None;
        }
        self.outgoing.pop_front()
    }

    /// A byte arrived from the host.
    pub fn receive(&mut self, byte: u8) {
        self.written.push(byte);
        if !self.in_sync() {
            trace!(byte, host_baud = ?self.host_baud, baud = self.baud, "dropping garbled byte");
            return;
        }
        self.pending.push(byte);
        if self.command_mode {
            self.process_command();
        } else {
            self.hunt_for_entry();
        }
    }

    fn in_sync(&self) -> bool {
        self.host_baud == Some(self.baud)
    }

    fn respond(&mut self, response: &str) {
        self.outgoing.extend(response.as_bytes());
    }

    fn hunt_for_entry(&mut self) {
        let Some(enter) = self.platform.enter_command_mode else {
            self.pending.clear();
            return;
        };
        if self.pending.ends_with(enter.request.as_bytes()) {
            self.pending.clear();
            self.command_mode = true;
            self.respond(enter.response);
        } else if self.pending.len() > MAX_PENDING {
            let stale = self.pending.len() - enter.request.len();
            self.pending = self.pending.split_off(stale);
        }
    }

    fn process_command(&mut self) {
        if let Some(exit) = self.platform.exit_command_mode {
            if self.pending == exit.request.as_bytes() {
                self.pending.clear();
                self.command_mode = false;
                self.respond(exit.response);
                return;
            }
        }
        if let Some(reboot) = self.platform.reboot {
            if self.pending == reboot.as_bytes() {
                self.reboot();
                return;
            }
        }
        if self.pending.ends_with(b"\r\n") {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            self.process_line(&line);
        }
    }

    fn process_line(&mut self, line: &str) {
        if let Some(store) = self.platform.store_settings {
            if line == store.request {
                self.stored_baud = Some(self.configured_baud);
                self.respond(store.response);
                return;
            }
        }
        if let Some(set_baud) = self.platform.set_baud_rate {
            if let Some(baud) = self.parse_set_baud(set_baud.request, line) {
                self.configured_baud = baud;
                self.respond(set_baud.response);
                return;
            }
        }
        self.respond(ERROR_RESPONSE);
    }

    /// Pull the baud rate out of a line matching the `%d` template.
    fn parse_set_baud(&self, template: &str, line: &str) -> Option<u32> {
        let (prefix, suffix) = template.split_once("%d")?;
        let code = line.strip_prefix(prefix)?.strip_suffix(suffix)?;
        let code: u32 = code.parse().ok()?;
        self.platform.baud_mapper.unmap(code)
    }

    fn reboot(&mut self) {
        self.reboots += 1;
        self.command_mode = false;
        self.baud = self.configured_baud;
        self.pending.clear();
        self.outgoing.clear();
    }

    // ========================================================================
    // Observation
    // ========================================================================

    /// Baud rate the module's UART currently runs at.
    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// Baud rate set over the command interface, applied on reboot.
    pub fn configured_baud(&self) -> u32 {
        self.configured_baud
    }

    /// Baud rate persisted to flash, if settings were ever stored.
    pub fn stored_baud(&self) -> Option<u32> {
        self.stored_baud
    }

    /// Whether the module is in command mode.
    pub fn in_command_mode(&self) -> bool {
        self.command_mode
    }

    /// Every byte the host has written, in order, including garbled ones.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Forget the write history.
    pub fn clear_written(&mut self) {
        self.written.clear();
    }

    /// Every host UART re-clock, in order.
    pub fn host_baud_changes(&self) -> &[u32] {
        &self.host_baud_changes
    }

    /// Every delay the host requested, in order.
    pub fn delays(&self) -> &[u32] {
        &self.delays
    }

    /// Number of reboots performed.
    pub fn reboots(&self) -> usize {
        self.reboots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{RN42, XBEE};

    fn send(module: &mut SimulatedModule, text: &str) {
        for &byte in text.as_bytes() {
            module.receive(byte);
        }
    }

    fn drain(module: &mut SimulatedModule) -> String {
        let mut out = Vec::new();
        while let Some(byte) = module.transmit() {
            out.push(byte);
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_ignores_mismatched_baud() {
        let mut module = SimulatedModule::new(RN42, 115200);
        module.set_host_baud(9600);
        send(&mut module, "$$$");
        assert!(!module.in_command_mode());
        assert_eq!(drain(&mut module), "");
        assert_eq!(module.written(), b"$$$");
    }

    #[test]
    fn test_rn42_session() {
        let mut module = SimulatedModule::new(RN42, 9600);
        module.set_host_baud(9600);

        send(&mut module, "$$$");
        assert_eq!(drain(&mut module), "CMD\r\n");

        send(&mut module, "SU,57600\r\n");
        assert_eq!(drain(&mut module), "AOK\r\n");
        assert_eq!(module.configured_baud(), 57600);

        send(&mut module, "---");
        assert_eq!(drain(&mut module), "END\r\n");
        assert!(!module.in_command_mode());
    }

    #[test]
    fn test_rn42_reboot_applies_baud() {
        let mut module = SimulatedModule::new(RN42, 9600);
        module.set_host_baud(9600);
        send(&mut module, "$$$");
        send(&mut module, "SU,115200\r\n");
        drain(&mut module);

        send(&mut module, "R,1\r\n");
        assert_eq!(module.reboots(), 1);
        assert_eq!(module.baud(), 115200);
        assert!(!module.in_command_mode());
    }

    #[test]
    fn test_xbee_store_and_unknown_line() {
        let mut module = SimulatedModule::new(XBEE, 9600);
        module.set_host_baud(9600);
        send(&mut module, "+++");
        assert_eq!(drain(&mut module), "OK");

        send(&mut module, "ATBD 7\r\n");
        send(&mut module, "ATWR\r\n");
        assert_eq!(drain(&mut module), "OK\r\nOK\r\n");
        assert_eq!(module.stored_baud(), Some(115200));

        send(&mut module, "ATBD 9\r\n");
        assert_eq!(drain(&mut module), ERROR_RESPONSE);
    }

    #[test]
    fn test_entry_found_after_noise() {
        let mut module = SimulatedModule::new(XBEE, 9600);
        module.set_host_baud(9600);
        send(&mut module, &"x".repeat(100));
        send(&mut module, "+++");
        assert!(module.in_command_mode());
    }
}
