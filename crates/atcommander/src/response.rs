//! Bounded response reads and exact-match validation.

use crate::error::{AtError, AtResult};
use crate::transport::{Logger, Transport};

/// Pause after each empty read before trying again.
pub const RETRY_DELAY_MS: u32 = 50;

/// Empty reads tolerated by a command request before it gives up.
pub const MAX_RETRIES: usize = 3;

/// Read up to `size` bytes.
///
/// Only "no data" results consume the retry budget; each one is followed by
/// [`RETRY_DELAY_MS`] of delay if the transport can delay. Returns whatever
/// arrived, which may be shorter than `size`.
pub fn read_bounded(transport: &mut Transport, size: usize, max_retries: usize) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(size);
    let mut retries = 0;
    while buffer.len() < size && retries < max_retries {
        match transport.read_byte() {
            Some(byte) => buffer.push(byte),
            None => {
                transport.delay_ms(RETRY_DELAY_MS);
                retries += 1;
            }
        }
    }
    buffer
}

/// Compare a response against the expected literal.
///
/// Length and content must both match exactly; a matching prefix earns
/// nothing.
pub fn check_response(response: &[u8], expected: &str) -> AtResult<()> {
    if response.len() != expected.len() {
        return Err(AtError::ResponseLength {
            expected: expected.len(),
            actual: response.len(),
        });
    }
    if response != expected.as_bytes() {
        return Err(AtError::ResponseContent {
            expected: expected.to_string(),
            actual: String::from_utf8_lossy(response).into_owned(),
        });
    }
    Ok(())
}

/// [`check_response`] with diagnostics: a length mismatch logs both
/// lengths, and any non-empty wrong response also logs both strings.
pub(crate) fn verify_response(logger: &mut Logger, response: &[u8], expected: &str) -> bool {
    match check_response(response, expected) {
        Ok(()) => true,
        Err(e @ AtError::ResponseLength { .. }) => {
            logger.warn(&e.to_string());
            if !response.is_empty() {
                let mismatch = AtError::ResponseContent {
                    expected: expected.to_string(),
                    actual: String::from_utf8_lossy(response).into_owned(),
                };
                logger.warn(&mismatch.to_string());
            }
            false
        }
        Err(e) => {
            logger.warn(&e.to_string());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Transport whose reads come from a script; `None` entries are empty reads.
    fn scripted(script: Vec<Option<u8>>) -> (Transport, Rc<RefCell<Vec<u32>>>) {
        let mut script: VecDeque<Option<u8>> = script.into();
        let delays = Rc::new(RefCell::new(Vec::new()));
        let recorded = delays.clone();
        let transport = Transport::new()
            .with_read(move || script.pop_front().flatten())
            .with_delay(move |ms| recorded.borrow_mut().push(ms));
        (transport, delays)
    }

    #[test]
    fn test_read_full_response() {
        let (mut transport, delays) = scripted(b"OK\r\n".iter().map(|&b| Some(b)).collect());
        assert_eq!(read_bounded(&mut transport, 4, MAX_RETRIES), b"OK\r\n");
        assert!(delays.borrow().is_empty());
    }

    #[test]
    fn test_read_tolerates_gaps_within_budget() {
        let (mut transport, delays) = scripted(vec![Some(b'O'), None, None, Some(b'K')]);
        assert_eq!(read_bounded(&mut transport, 2, MAX_RETRIES), b"OK");
        assert_eq!(delays.borrow().as_slice(), &[RETRY_DELAY_MS, RETRY_DELAY_MS]);
    }

    #[test]
    fn test_read_stops_after_retry_budget() {
        let (mut transport, delays) = scripted(vec![Some(b'O'), None, None, None, Some(b'K')]);
        assert_eq!(read_bounded(&mut transport, 2, MAX_RETRIES), b"O");
        assert_eq!(delays.borrow().len(), MAX_RETRIES);
    }

    #[test]
    fn test_read_without_delay_function() {
        let mut transport = Transport::new().with_read(|| None);
        assert!(read_bounded(&mut transport, 5, 10).is_empty());
    }

    #[test]
    fn test_read_counts_every_empty_result() {
        let calls = Rc::new(RefCell::new(0usize));
        let counter = calls.clone();
        let mut transport = Transport::new().with_read(move || {
            *counter.borrow_mut() += 1;
            None
        });
        read_bounded(&mut transport, 8, 7);
        assert_eq!(*calls.borrow(), 7);
    }

    #[test]
    fn test_check_response_exact_match() {
        assert_eq!(check_response(b"CMD\r\n", "CMD\r\n"), Ok(()));
    }

    #[test]
    fn test_check_response_rejects_prefix() {
        assert_eq!(
            check_response(b"OK", "OK\r\n"),
            Err(AtError::ResponseLength { expected: 4, actual: 2 })
        );
    }

    #[test]
    fn test_check_response_rejects_content() {
        assert_eq!(
            check_response(b"ERR\r\n", "AOK\r\n"),
            Err(AtError::ResponseContent {
                expected: "AOK\r\n".to_string(),
                actual: "ERR\r\n".to_string(),
            })
        );
    }

    #[test]
    fn test_verify_logs_length_and_content() {
        let lines = Rc::new(RefCell::new(Vec::<String>::new()));
        let sink = lines.clone();
        let mut logger = Logger::new(Some(Box::new(move |line: &str| {
            sink.borrow_mut().push(line.to_string())
        })));

        assert!(!verify_response(&mut logger, b"OK", "OK\r\n"));
        assert_eq!(lines.borrow().len(), 2);

        lines.borrow_mut().clear();
        assert!(!verify_response(&mut logger, b"", "OK\r\n"));
        assert_eq!(lines.borrow().len(), 1);

        lines.borrow_mut().clear();
        assert!(verify_response(&mut logger, b"OK\r\n", "OK\r\n"));
        assert!(lines.borrow().is_empty());
    }
}
