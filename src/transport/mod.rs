// src/transport/mod.rs

//! Line-oriented access to the device.
//!
//! [`LineSession`] is the single owner of the device interface: every byte that
//! reaches the wire goes through it.

#[cfg(feature = "serial")]
pub mod discovery;
#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "serial")]
pub use discovery::{candidate_ports, discover, discover_on};
#[cfg(feature = "serial")]
pub use serial::SerialPortInterface;

use core::time::Duration;

use log::{debug, trace};
use nb::Result as NbResult;

use crate::common::{
    command::WireCommand,
    error::BridgeError,
    hal_traits::{DeviceClock, LineSerial},
    timing,
};

/// Upper bound on bytes discarded by a single [`LineSession::drain_input`] call.
const DRAIN_LIMIT: usize = 4 * timing::LINE_CAPACITY;

/// A line-based session over a byte-level device interface.
#[derive(Debug)]
pub struct LineSession<IF>
where
    IF: LineSerial + DeviceClock,
{
    interface: IF,
    line_buffer: [u8; timing::LINE_CAPACITY],
    /// Set while a previous write left an unterminated line on the wire.
    partial_line: bool,
}

impl<IF> LineSession<IF>
where
    IF: LineSerial + DeviceClock,
{
    pub fn new(interface: IF) -> Self {
        LineSession {
            interface,
            line_buffer: [0u8; timing::LINE_CAPACITY],
            partial_line: false,
        }
    }

    pub fn interface(&self) -> &IF {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut IF {
        &mut self.interface
    }

    /// Gives the device interface back, ending the session.
    pub fn into_inner(self) -> IF {
        self.interface
    }

    /// Writes `line` followed by a single `\n`, then flushes.
    ///
    /// The whole line, terminator and flush included, must complete within `timeout`.
    /// If an earlier write stopped partway through a line, that line is first
    /// closed with a bare `\n` so it cannot merge with this one; the device
    /// rejects the fragment and ignores the empty line.
    pub fn write_line(&mut self, line: &str, timeout: Duration) -> Result<(), BridgeError<IF::Error>> {
        let deadline = self.interface.now() + timeout;

        if self.partial_line {
            self.execute_blocking_io_until(deadline, |iface| iface.write_byte(b'\n'))
                .map_err(write_timeout)?;
            self.partial_line = false;
            debug!("-> (terminated partial line)");
        }

        for byte in line.bytes() {
            self.execute_blocking_io_until(deadline, |iface| iface.write_byte(byte))
                .map_err(write_timeout)?;
            self.partial_line = true;
        }
        self.execute_blocking_io_until(deadline, |iface| iface.write_byte(b'\n'))
            .map_err(write_timeout)?;
        self.partial_line = false;

        self.execute_blocking_io_until(deadline, |iface| iface.flush())
            .map_err(write_timeout)?;

        debug!("-> {}", line);
        Ok(())
    }

    /// Encodes and writes one protocol line.
    pub fn send(&mut self, command: &WireCommand, timeout: Duration) -> Result<(), BridgeError<IF::Error>> {
        let line = command.format_into()?;
        self.write_line(&line, timeout)
    }

    /// Reads one line, returning it without its trailing CR/LF.
    ///
    /// Fails with `Timeout` if nothing arrived within `timeout`, or with
    /// `IncompleteLine` if the terminator did not arrive in time.
    pub fn read_line(&mut self, timeout: Duration) -> Result<String, BridgeError<IF::Error>> {
        let deadline = self.interface.now() + timeout;

        let mut bytes_read = 0;
        loop {
            match self.execute_blocking_io_until(deadline, |iface| iface.read_byte()) {
                Ok(b'\n') => break,
                Ok(byte) => {
                    if bytes_read >= self.line_buffer.len() {
                        return Err(BridgeError::BufferOverflow {
                            needed: bytes_read + 1,
                            got: self.line_buffer.len(),
                        });
                    }
                    self.line_buffer[bytes_read] = byte;
                    bytes_read += 1;
                }
                Err(BridgeError::Timeout) if bytes_read > 0 => {
                    return Err(BridgeError::IncompleteLine);
                }
                Err(e) => return Err(e),
            }
        }

        let mut line = &self.line_buffer[..bytes_read];
        while let Some((&b'\r', rest)) = line.split_last() {
            line = rest;
        }
        let line = String::from_utf8_lossy(line).into_owned();
        debug!("<- {}", line);
        Ok(line)
    }

    /// Writes `command` and waits for its single-line reply.
    pub fn transact(
        &mut self,
        command: &WireCommand,
        write_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<String, BridgeError<IF::Error>> {
        self.send(command, write_timeout)?;
        self.read_line(read_timeout)
    }

    /// Discards bytes the device has already sent, without waiting for more.
    ///
    /// Returns the number of bytes dropped.
    pub fn drain_input(&mut self) -> Result<usize, BridgeError<IF::Error>> {
        let mut dropped = 0;
        while dropped < DRAIN_LIMIT {
            match self.interface.read_byte() {
                Ok(_) => dropped += 1,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => return Err(BridgeError::Io(e)),
            }
        }
        if dropped > 0 {
            trace!("drained {} stale byte(s)", dropped);
        }
        Ok(dropped)
    }

    // --- Timeout Helper ---

    /// Executes a non-blocking I/O operation (`f`) repeatedly until it stops
    /// returning `WouldBlock`, or fails with `Timeout` once `deadline` passes.
    fn execute_blocking_io_until<FN, T>(
        &mut self,
        deadline: IF::Instant,
        mut f: FN,
    ) -> Result<T, BridgeError<IF::Error>>
    where
        FN: FnMut(&mut IF) -> NbResult<T, IF::Error>,
    {
        loop {
            match f(&mut self.interface) {
                Ok(result) => return Ok(result),
                Err(nb::Error::WouldBlock) => {
                    if self.interface.now() >= deadline {
                        return Err(BridgeError::Timeout);
                    }
                    self.interface.delay_us(timing::IO_RETRY_DELAY.as_micros() as u32);
                }
                Err(nb::Error::Other(e)) => return Err(BridgeError::Io(e)),
            }
        }
    }
}

fn write_timeout<E: core::fmt::Debug>(err: BridgeError<E>) -> BridgeError<E> {
    match err {
        BridgeError::Timeout => BridgeError::WriteTimeout,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockCommError, MockInterface};
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(10);

    #[test]
    fn test_write_line_appends_newline() {
        let mock = MockInterface::new();
        let mut session = LineSession::new(mock.clone());
        session.write_line("t,1,1", TIMEOUT).unwrap();
        assert_eq!(mock.written(), b"t,1,1\n");
        assert_eq!(mock.call_count("flush"), 1);
    }

    #[test]
    fn test_send_encodes_command() {
        let mock = MockInterface::new();
        let mut session = LineSession::new(mock.clone());
        session.send(&WireCommand::DisplayClear, TIMEOUT).unwrap();
        session.send(&WireCommand::AnalogWrite { pin: 0, value: 512 }, TIMEOUT).unwrap();
        assert_eq!(mock.written_lines(), vec!["c", "a,0,512"]);
    }

    #[test]
    fn test_write_timeout() {
        let mock = MockInterface::new();
        mock.set_write_blocked(true);
        let mut session = LineSession::new(mock.clone());
        let result = session.write_line("c", TIMEOUT);
        assert!(matches!(result, Err(BridgeError::WriteTimeout)));
        // The mock advances its clock on every retry delay.
        assert!(mock.now_us() >= TIMEOUT.as_micros() as u64);
    }

    #[test]
    fn test_partial_write_terminated_before_next_line() {
        let mock = MockInterface::new();
        mock.set_write_budget(Some(3));
        let mut session = LineSession::new(mock.clone());
        let result = session.write_line("t,1,1", TIMEOUT);
        assert!(matches!(result, Err(BridgeError::WriteTimeout)));
        assert_eq!(mock.written(), b"t,1");

        mock.set_write_budget(None);
        session.write_line("c", TIMEOUT).unwrap();
        assert_eq!(mock.written_lines(), vec!["t,1", "c"]);

        // Complete lines need no extra terminator.
        session.write_line("c", TIMEOUT).unwrap();
        assert_eq!(mock.written(), b"t,1\nc\nc\n");
    }

    #[test]
    fn test_blocked_before_first_byte_adds_no_terminator() {
        let mock = MockInterface::new();
        mock.set_write_blocked(true);
        let mut session = LineSession::new(mock.clone());
        assert!(session.write_line("c", TIMEOUT).is_err());

        mock.set_write_blocked(false);
        session.write_line("g", TIMEOUT).unwrap();
        assert_eq!(mock.written(), b"g\n");
    }

    #[test]
    fn test_read_line_strips_crlf() {
        let mock = MockInterface::new();
        mock.stage_read_data(b"s2mb.py Version 1.07\r\n");
        let mut session = LineSession::new(mock);
        assert_eq!(session.read_line(TIMEOUT).unwrap(), "s2mb.py Version 1.07");
    }

    #[test]
    fn test_read_line_one_at_a_time() {
        let mock = MockInterface::new();
        mock.stage_read_data(b"first\nsecond\n");
        let mut session = LineSession::new(mock);
        assert_eq!(session.read_line(TIMEOUT).unwrap(), "first");
        assert_eq!(session.read_line(TIMEOUT).unwrap(), "second");
    }

    #[test]
    fn test_read_line_timeout_no_data() {
        let mut session = LineSession::new(MockInterface::new());
        assert!(matches!(session.read_line(TIMEOUT), Err(BridgeError::Timeout)));
    }

    #[test]
    fn test_read_line_timeout_partial_data() {
        let mock = MockInterface::new();
        mock.stage_read_data(b"10,-5,25");
        let mut session = LineSession::new(mock);
        assert!(matches!(session.read_line(TIMEOUT), Err(BridgeError::IncompleteLine)));
    }

    #[test]
    fn test_read_line_buffer_overflow() {
        let mock = MockInterface::new();
        mock.stage_read_data(&[b'x'; timing::LINE_CAPACITY + 1]);
        let mut session = LineSession::new(mock);
        assert!(matches!(
            session.read_line(TIMEOUT),
            Err(BridgeError::BufferOverflow { needed, got })
                if needed == timing::LINE_CAPACITY + 1 && got == timing::LINE_CAPACITY
        ));
    }

    #[test]
    fn test_read_line_io_error() {
        let mock = MockInterface::new();
        mock.set_read_error(true);
        let mut session = LineSession::new(mock);
        assert!(matches!(session.read_line(TIMEOUT), Err(BridgeError::Io(MockCommError))));
    }

    #[test]
    fn test_drain_input_discards_buffered_bytes() {
        let mock = MockInterface::new();
        mock.stage_read_data(b"[True, False, False]\n");
        let mut session = LineSession::new(mock);
        assert_eq!(session.drain_input().unwrap(), 21);
        assert_eq!(session.drain_input().unwrap(), 0);
    }

    #[test]
    fn test_transact_round_trip() {
        let mock = MockInterface::new();
        mock.set_version("s2mb.py Version 1.07 24 March 2018");
        let mut session = LineSession::new(mock.clone());
        let version = session.transact(&WireCommand::Version, TIMEOUT, TIMEOUT).unwrap();
        assert_eq!(version, "s2mb.py Version 1.07 24 March 2018");
        assert_eq!(mock.written_lines(), vec!["v"]);
    }
}
