// src/transport/serial.rs

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use log::info;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::common::{
    error::BridgeError,
    hal_traits::{DeviceClock, LineSerial},
};

/// A host serial port exposed as a byte-level device interface.
pub struct SerialPortInterface {
    port: Box<dyn SerialPort>,
    path: String,
}

impl core::fmt::Debug for SerialPortInterface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialPortInterface")
            .field("path", &self.path)
            .finish()
    }
}

impl SerialPortInterface {
    /// Opens `path` at `baud_rate` (8N1, no flow control) and clears both buffers.
    ///
    /// `timeout` bounds each underlying read/write call; the line session applies
    /// its own per-line deadlines on top.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, BridgeError<io::Error>> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| BridgeError::PortUnavailable(format!("{}: {}", path, e)))?;

        port.clear(ClearBuffer::All)
            .map_err(|e| BridgeError::Io(io::Error::from(e)))?;

        info!("Opened serial port: {} at {} baud", path, baud_rate);
        Ok(SerialPortInterface {
            port,
            path: path.to_owned(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn is_not_ready(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

impl LineSerial for SerialPortInterface {
    type Error = io::Error;

    fn read_byte(&mut self) -> nb::Result<u8, Self::Error> {
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| nb::Error::Other(io::Error::from(e)))?;
        if available == 0 {
            return Err(nb::Error::WouldBlock);
        }

        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) if is_not_ready(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn write_byte(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        match self.port.write(&[byte]) {
            Ok(1) => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) if is_not_ready(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        match self.port.flush() {
            Ok(()) => Ok(()),
            Err(e) if is_not_ready(&e) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }
}

impl DeviceClock for SerialPortInterface {
    type Instant = Instant;

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}
