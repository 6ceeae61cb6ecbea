//! Host-supplied byte transport.
//!
//! The driver never touches a UART itself. The host hands over up to four
//! callbacks (read one byte, write one byte, sleep, re-clock the UART) and
//! an optional log sink. Any of them may be missing; the driver then logs
//! and carries on, or fails the operation that needed it.

use tracing::{debug, warn};

use crate::error::Capability;

/// Reads one byte, returning `None` when nothing arrived in time.
///
/// Must not block indefinitely.
pub type ReadFn = Box<dyn FnMut() -> Option<u8>>;

/// Writes one byte. Fire-and-forget.
pub type WriteFn = Box<dyn FnMut(u8)>;

/// Blocks for the given number of milliseconds.
pub type DelayFn = Box<dyn FnMut(u32)>;

/// Reconfigures the host UART at the given baud rate.
pub type BaudInitFn = Box<dyn FnMut(u32)>;

/// Receives one diagnostic line, already terminated with `\r\n`.
pub type LogFn = Box<dyn FnMut(&str)>;

/// The set of host callbacks used to reach the device.
#[derive(Default)]
pub struct Transport {
    read: Option<ReadFn>,
    write: Option<WriteFn>,
    delay: Option<DelayFn>,
    baud_init: Option<BaudInitFn>,
}

impl Transport {
    /// Create a transport with no callbacks set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the single byte read callback.
    pub fn with_read(mut self, read: impl FnMut() -> Option<u8> + 'static) -> Self {
        self.read = Some(Box::new(read));
        self
    }

    /// Set the single byte write callback.
    pub fn with_write(mut self, write: impl FnMut(u8) + 'static) -> Self {
        self.write = Some(Box::new(write));
        self
    }

    /// Set the millisecond delay callback.
    pub fn with_delay(mut self, delay: impl FnMut(u32) + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    /// Set the host UART baud initializer.
    pub fn with_baud_initializer(mut self, init: impl FnMut(u32) + 'static) -> Self {
        self.baud_init = Some(Box::new(init));
        self
    }

    /// Whether the given callback was supplied.
    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => self.read.is_some(),
            Capability::Write => self.write.is_some(),
            Capability::Delay => self.delay.is_some(),
            Capability::BaudInitializer => self.baud_init.is_some(),
        }
    }

    /// Read one byte. A missing read callback behaves as "no data".
    pub(crate) fn read_byte(&mut self) -> Option<u8> {
        self.read.as_mut().and_then(|read| read())
    }

    /// Write every byte in order. Returns false if there is no write callback.
    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> bool {
        match self.write.as_mut() {
            Some(write) => {
                for &byte in bytes {
                    write(byte);
                }
                true
            }
            None => false,
        }
    }

    /// Sleep if a delay callback is available, otherwise return at once.
    pub(crate) fn delay_ms(&mut self, ms: u32) {
        if let Some(delay) = self.delay.as_mut() {
            delay(ms);
        }
    }

    /// Re-clock the host UART. Returns false if there is no initializer.
    pub(crate) fn init_baud(&mut self, baud: u32) -> bool {
        match self.baud_init.as_mut() {
            Some(init) => {
                init(baud);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("read", &self.read.is_some())
            .field("write", &self.write.is_some())
            .field("delay", &self.delay.is_some())
            .field("baud_init", &self.baud_init.is_some())
            .finish()
    }
}

/// Diagnostic output, mirrored to `tracing` and the host log sink.
#[derive(Default)]
pub(crate) struct Logger {
    sink: Option<LogFn>,
}

impl Logger {
    pub(crate) fn new(sink: Option<LogFn>) -> Self {
        Logger { sink }
    }

    pub(crate) fn debug(&mut self, message: &str) {
        debug!(target: "atcommander", "{}", message);
        self.emit(message);
    }

    pub(crate) fn warn(&mut self, message: &str) {
        warn!(target: "atcommander", "{}", message);
        self.emit(message);
    }

    fn emit(&mut self, message: &str) {
        if let Some(sink) = self.sink.as_mut() {
            sink(&format!("{}\r\n", message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_empty_transport_degrades() {
        let mut transport = Transport::new();
        assert!(!transport.has(Capability::Read));
        assert_eq!(transport.read_byte(), None);
        assert!(!transport.write_all(b"$$$"));
        assert!(!transport.init_baud(9600));
        transport.delay_ms(50);
    }

    #[test]
    fn test_write_all_preserves_order() {
        let written = Rc::new(RefCell::new(Vec::new()));
        let sink = written.clone();
        let mut transport = Transport::new().with_write(move |b| sink.borrow_mut().push(b));

        assert!(transport.write_all(b"ATWR\r\n"));
        assert_eq!(written.borrow().as_slice(), b"ATWR\r\n");
    }

    #[test]
    fn test_logger_appends_terminator() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = lines.clone();
        let mut logger = Logger::new(Some(Box::new(move |line: &str| {
            sink.borrow_mut().push(line.to_string())
        })));

        logger.debug("Attempting to enter command mode");
        logger.warn("Unable to exit command mode");

        assert_eq!(
            lines.borrow().as_slice(),
            &[
                "Attempting to enter command mode\r\n".to_string(),
                "Unable to exit command mode\r\n".to_string(),
            ]
        );
    }
}
