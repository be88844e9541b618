// src/transport/discovery.rs

use std::io;

use log::{debug, info, warn};

use super::serial::SerialPortInterface;
use crate::bridge::Bridge;
use crate::common::{
    config::BridgeConfig,
    error::{BridgeError, HandshakeStage},
};

/// Device names tried when the OS cannot enumerate serial ports.
#[cfg(unix)]
const FALLBACK_PORTS: &[&str] = &[
    "/dev/ttyACM0",
    "/dev/ttyACM1",
    "/dev/ttyACM2",
    "/dev/ttyACM3",
    "/dev/ttyUSB0",
    "/dev/ttyUSB1",
    "/dev/ttyUSB2",
    "/dev/ttyUSB3",
    "/dev/ttyS0",
    "/dev/ttyS1",
];

#[cfg(not(unix))]
const FALLBACK_PORTS: &[&str] = &[
    "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9", "COM10",
];

/// Ports worth probing, as reported by the OS, or [`FALLBACK_PORTS`].
pub fn candidate_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) if !ports.is_empty() => ports.into_iter().map(|p| p.port_name).collect(),
        Ok(_) => FALLBACK_PORTS.iter().map(|p| p.to_string()).collect(),
        Err(e) => {
            warn!("Serial port enumeration failed ({}); probing default names", e);
            FALLBACK_PORTS.iter().map(|p| p.to_string()).collect()
        }
    }
}

/// Opens the first candidate port whose device completes the handshake.
pub fn discover(config: &BridgeConfig) -> Result<Bridge<SerialPortInterface>, BridgeError<io::Error>> {
    discover_on(&candidate_ports(), config)
}

/// Like [`discover`], over an explicit candidate list tried in order.
pub fn discover_on<S: AsRef<str>>(
    candidates: &[S],
    config: &BridgeConfig,
) -> Result<Bridge<SerialPortInterface>, BridgeError<io::Error>> {
    for path in candidates.iter().map(AsRef::as_ref) {
        let interface = match SerialPortInterface::open(path, config.baud_rate, config.write_timeout) {
            Ok(interface) => interface,
            Err(e) => {
                debug!("Skipping {}: {}", path, e);
                continue;
            }
        };

        match Bridge::connect(interface, config.clone()) {
            Ok(bridge) => {
                info!("Using serial port {}", path);
                return Ok(bridge);
            }
            Err(e) => info!("No bridge firmware on {}: {}", path, e),
        }
    }
    Err(BridgeError::NotReady(HandshakeStage::Discovery))
}
