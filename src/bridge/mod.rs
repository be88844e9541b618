// src/bridge/mod.rs

//! Session establishment and the background scheduler that owns the device.

pub mod scheduler;
pub mod shared;

pub use scheduler::{Phase, Scheduler, TickOutcome};
pub use shared::SharedState;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Sender};
use log::{info, warn};

use crate::common::{
    command::WireCommand,
    config::BridgeConfig,
    error::{BridgeError, HandshakeStage},
    gesture::GestureState,
    hal_traits::{DeviceClock, LineSerial},
    response::parse_poll_reply,
    timing,
};
use crate::gateway::Gateway;
use crate::transport::LineSession;

/// A device session that has completed the startup handshake.
#[derive(Debug)]
pub struct Bridge<IF>
where
    IF: LineSerial + DeviceClock,
{
    session: LineSession<IF>,
    config: BridgeConfig,
    gestures: GestureState,
    shared: Arc<SharedState>,
    device_version: String,
}

impl<IF> Bridge<IF>
where
    IF: LineSerial + DeviceClock,
{
    /// Runs the startup handshake: one `g` poll, then a `v` version query.
    ///
    /// Both must be answered within `config.handshake_timeout`. The poll reply
    /// seeds the gesture state and becomes the first published report.
    pub fn connect(interface: IF, config: BridgeConfig) -> Result<Self, BridgeError<IF::Error>> {
        let mut session = LineSession::new(interface);
        session
            .interface_mut()
            .delay_ms(timing::PORT_SETTLE_DELAY.as_millis() as u32);
        session.drain_input()?;

        let mut gestures = GestureState::new(config.shake_threshold);
        let shared = Arc::new(SharedState::new(config.suppress_first_poll));

        let line = session
            .transact(&WireCommand::Poll, config.write_timeout, config.handshake_timeout)
            .map_err(|e| not_ready(e, HandshakeStage::Poll))?;
        let reply = parse_poll_reply(&line).map_err(|e| {
            warn!("Handshake poll reply rejected: {}", e);
            BridgeError::NotReady(HandshakeStage::Poll)
        })?;
        shared.publish(gestures.observe(&reply));

        let device_version = session
            .transact(&WireCommand::Version, config.write_timeout, config.handshake_timeout)
            .map_err(|e| not_ready(e, HandshakeStage::Version))?;
        if device_version.trim().is_empty() {
            return Err(BridgeError::NotReady(HandshakeStage::Version));
        }
        info!("Device firmware: {}", device_version);

        Ok(Bridge {
            session,
            config,
            gestures,
            shared,
            device_version,
        })
    }

    /// The version string the firmware reported during the handshake.
    pub fn device_version(&self) -> &str {
        &self.device_version
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Splits the session into a request gateway and the scheduler that serves it.
    ///
    /// Nothing reaches the device until the scheduler is ticked or run.
    pub fn into_parts(self) -> (Gateway, Scheduler<IF>) {
        let (commands_tx, commands_rx) = unbounded();
        let gateway = Gateway::new(commands_tx, self.shared.clone());
        let scheduler = Scheduler::new(
            self.session,
            commands_rx,
            self.shared,
            self.gestures,
            self.config,
        );
        (gateway, scheduler)
    }

    /// Starts the scheduler on its own thread.
    pub fn spawn(self) -> io::Result<RunningBridge<IF>>
    where
        IF: Send + 'static,
    {
        let (gateway, scheduler) = self.into_parts();
        let (shutdown_tx, shutdown_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("s2m-scheduler".into())
            .spawn(move || scheduler.run(shutdown_rx))?;

        Ok(RunningBridge {
            gateway,
            shutdown: shutdown_tx,
            handle,
        })
    }
}

/// Handshake failures surface as `NotReady`, except for hard device I/O errors.
fn not_ready<E: core::fmt::Debug>(err: BridgeError<E>, stage: HandshakeStage) -> BridgeError<E> {
    match err {
        BridgeError::Io(e) => BridgeError::Io(e),
        other => {
            warn!("Handshake {:?} step failed: {}", stage, other);
            BridgeError::NotReady(stage)
        }
    }
}

/// A bridge whose scheduler thread is running.
#[derive(Debug)]
pub struct RunningBridge<IF> {
    gateway: Gateway,
    shutdown: Sender<()>,
    handle: JoinHandle<IF>,
}

impl<IF> RunningBridge<IF> {
    /// A handle for answering requests; clone it freely.
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Stops the scheduler after its current tick and waits for it.
    ///
    /// Returns the device interface, or the panic payload if the thread panicked.
    pub fn shutdown(self) -> thread::Result<IF> {
        // A full or disconnected channel means the scheduler is already stopping.
        let _ = self.shutdown.try_send(());
        self.handle.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockInterface;
    use core::time::Duration;

    const VERSION: &str = "s2mb.py Version 1.07 24 March 2018";
    const READING: &str = "-3,40,1000,false,true,0,1,0,0,17,0";

    fn config() -> BridgeConfig {
        BridgeConfig {
            handshake_timeout: Duration::from_millis(20),
            io_timeout: Duration::from_millis(10),
            write_timeout: Duration::from_millis(10),
            ..BridgeConfig::default()
        }
    }

    fn ready_device() -> MockInterface {
        let mock = MockInterface::new();
        mock.queue_poll_reply(READING);
        mock.set_version(VERSION);
        mock
    }

    #[test]
    fn test_handshake_success() {
        let mock = ready_device();
        mock.stage_read_data(b"garbage from boot\r\n");
        let bridge = Bridge::connect(mock.clone(), config()).unwrap();

        assert_eq!(bridge.device_version(), VERSION);
        assert_eq!(mock.written_lines(), vec!["g", "v"]);

        let report = bridge.shared().last_report().unwrap();
        assert!(report.gestures.tilted_left);
        assert!(report.gestures.tilted_up);
        assert!(report.reply.button_b);
    }

    #[test]
    fn test_handshake_no_poll_reply() {
        let mock = MockInterface::new();
        mock.set_version(VERSION);
        let result = Bridge::connect(mock.clone(), config());
        assert!(matches!(result, Err(BridgeError::NotReady(HandshakeStage::Poll))));
        assert_eq!(mock.written_lines(), vec!["g"]);
    }

    #[test]
    fn test_handshake_malformed_poll_reply() {
        let mock = MockInterface::new();
        mock.queue_poll_reply("not,a,reading");
        mock.set_version(VERSION);
        let result = Bridge::connect(mock, config());
        assert!(matches!(result, Err(BridgeError::NotReady(HandshakeStage::Poll))));
    }

    #[test]
    fn test_handshake_no_version() {
        let mock = MockInterface::new();
        mock.queue_poll_reply(READING);
        let result = Bridge::connect(mock, config());
        assert!(matches!(result, Err(BridgeError::NotReady(HandshakeStage::Version))));
    }

    #[test]
    fn test_handshake_io_error_propagates() {
        let mock = ready_device();
        mock.set_read_error(true);
        let result = Bridge::connect(mock, config());
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_handshake_seeds_last_z() {
        let mock = ready_device();
        mock.queue_poll_reply("0,0,2900,false,false,0,0,0,0,0,0");
        let bridge = Bridge::connect(mock, config()).unwrap();
        let (gateway, mut scheduler) = bridge.into_parts();
        assert_eq!(scheduler.gestures().last_z(), 1000);

        // Suppressed first poll, then a real one.
        assert_eq!(gateway.handle("/poll").body, "ok");
        gateway.handle("/poll");
        scheduler.tick().unwrap();
        scheduler.tick().unwrap();

        let report = gateway.shared().last_report().unwrap();
        assert!(!report.gestures.shaken);
        assert_eq!(scheduler.gestures().last_z(), 2900);
    }

    #[test]
    fn test_spawn_and_shutdown() {
        let mock = ready_device();
        let bridge = Bridge::connect(mock.clone(), config()).unwrap();
        let running = bridge.spawn().unwrap();
        assert_eq!(running.gateway().handle("/display_clear").body, "ok");

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while mock.written_lines().len() < 3 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        let mock = running.shutdown().unwrap();
        assert_eq!(mock.written_lines(), vec!["g", "v", "c"]);
    }
}
