// src/common/error.rs

use core::fmt;

use super::command::CodecError;
use super::response::ResponseParseError;

/// Which step of the startup handshake failed to get an answer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandshakeStage {
    /// No usable reply to the initial `g` poll.
    Poll,
    /// No reply to the `v` version query.
    Version,
    /// No candidate port answered at all (discovery).
    Discovery,
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeStage::Poll => write!(f, "no poll reply from device"),
            HandshakeStage::Version => {
                write!(f, "no version reply from device (is the bridge script flashed?)")
            }
            HandshakeStage::Discovery => write!(f, "no responding device on any candidate port"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError<E = ()>
where
    E: fmt::Debug,
{
    /// Underlying I/O error from the device interface.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// The serial port could not be opened.
    #[error("Serial port unavailable: {0}")]
    PortUnavailable(String),

    /// The device did not accept a line within the write timeout.
    #[error("Write timed out")]
    WriteTimeout,

    /// No line arrived within the read timeout.
    #[error("Read timed out")]
    Timeout,

    /// Some bytes arrived, but the read timed out before the line terminator.
    #[error("Incomplete line received before timeout")]
    IncompleteLine,

    /// The received line does not fit the line buffer.
    #[error("Line buffer overflow: needed {needed}, got {got}")]
    BufferOverflow { needed: usize, got: usize },

    /// A command could not be encoded onto the wire.
    #[error("Encoding failed: {0}")]
    Codec(#[from] CodecError),

    /// A device reply did not have the expected shape.
    #[error("Malformed device reply: {0}")]
    Protocol(#[from] ResponseParseError),

    /// The startup handshake did not complete; the scheduler must not start.
    #[error("Device not ready: {0}")]
    NotReady(HandshakeStage),
}

impl<E: fmt::Debug> BridgeError<E> {
    /// True for failures of the serial link itself, as opposed to content errors.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BridgeError::Io(_)
                | BridgeError::PortUnavailable(_)
                | BridgeError::WriteTimeout
                | BridgeError::Timeout
                | BridgeError::IncompleteLine
                | BridgeError::BufferOverflow { .. }
        )
    }
}
