// src/bridge/scheduler.rs

use core::fmt;
use std::sync::Arc;

use crossbeam_channel::{select, tick, Receiver, TryRecvError};
use log::{debug, info, warn};

use super::shared::SharedState;
use crate::common::{
    command::{encode_command, Command, WireCommand},
    config::BridgeConfig,
    error::BridgeError,
    gesture::GestureState,
    hal_traits::{DeviceClock, LineSerial},
    response::{parse_poll_reply, PollReply},
};
use crate::transport::LineSession;

/// Which kind of work a tick may perform. Ticks alternate strictly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Command,
    Poll,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Phase::Command => Phase::Poll,
            Phase::Poll => Phase::Command,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Command => f.write_str("command"),
            Phase::Poll => f.write_str("poll"),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was pending for this phase.
    Idle,
    /// One command was written to the device.
    Sent(&'static str),
    /// One poll round-trip completed and its report was published.
    Polled,
}

/// Sole owner of the device session once the bridge is running.
pub struct Scheduler<IF>
where
    IF: LineSerial + DeviceClock,
{
    session: LineSession<IF>,
    commands: Receiver<Command>,
    shared: Arc<SharedState>,
    gestures: GestureState,
    config: BridgeConfig,
    phase: Phase,
    link_failures: u32,
}

impl<IF> fmt::Debug for Scheduler<IF>
where
    IF: LineSerial + DeviceClock,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("phase", &self.phase)
            .field("queued", &self.commands.len())
            .field("last_z", &self.gestures.last_z())
            .field("link_failures", &self.link_failures)
            .finish()
    }
}

impl<IF> Scheduler<IF>
where
    IF: LineSerial + DeviceClock,
{
    pub fn new(
        session: LineSession<IF>,
        commands: Receiver<Command>,
        shared: Arc<SharedState>,
        gestures: GestureState,
        config: BridgeConfig,
    ) -> Self {
        Scheduler {
            session,
            commands,
            shared,
            gestures,
            config,
            phase: Phase::Command,
            link_failures: 0,
        }
    }

    /// The phase the next tick will run.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn gestures(&self) -> &GestureState {
        &self.gestures
    }

    pub fn session(&self) -> &LineSession<IF> {
        &self.session
    }

    /// Consecutive phases lost to transport errors since the device last completed one.
    pub fn link_failures(&self) -> u32 {
        self.link_failures
    }

    /// Runs one phase and advances to the other, even if the phase failed.
    ///
    /// A failed command is dropped; a failed poll leaves the published report as it was.
    pub fn tick(&mut self) -> Result<TickOutcome, BridgeError<IF::Error>> {
        let phase = self.phase;
        self.phase = phase.next();
        let result = match phase {
            Phase::Command => self.command_phase(),
            Phase::Poll => self.poll_phase(),
        };

        match &result {
            Ok(TickOutcome::Sent(_)) | Ok(TickOutcome::Polled) => self.link_failures = 0,
            Err(e) if e.is_transport() => self.link_failures = self.link_failures.saturating_add(1),
            _ => {}
        }
        result
    }

    fn command_phase(&mut self) -> Result<TickOutcome, BridgeError<IF::Error>> {
        let command = match self.commands.try_recv() {
            Ok(command) => command,
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {
                return Ok(TickOutcome::Idle)
            }
        };

        // Encode every line first so a command is never half-sent over a codec error.
        let lines = encode_command(&command)?;
        for line in &lines {
            self.session.write_line(line, self.config.write_timeout)?;
        }
        Ok(TickOutcome::Sent(command.name()))
    }

    fn poll_phase(&mut self) -> Result<TickOutcome, BridgeError<IF::Error>> {
        if !self.shared.take_poll_request() {
            return Ok(TickOutcome::Idle);
        }

        self.session.drain_input()?;
        self.session.send(&WireCommand::Poll, self.config.write_timeout)?;
        let reply = self.read_poll_reply()?;
        let report = self.gestures.observe(&reply);
        self.shared.publish(report);
        Ok(TickOutcome::Polled)
    }

    /// Reads lines until one decodes as a poll reply or `io_timeout` passes.
    ///
    /// The firmware prints its output state after each `t` line, and that echo
    /// can arrive after the poll was sent; such lines are skipped. If only
    /// rejected lines arrived, the last rejection is returned.
    fn read_poll_reply(&mut self) -> Result<PollReply, BridgeError<IF::Error>> {
        let deadline = self.session.interface().now() + self.config.io_timeout;
        let mut rejected = None;

        loop {
            let now = self.session.interface().now();
            let read = if now < deadline {
                self.session.read_line(deadline - now)
            } else {
                Err(BridgeError::Timeout)
            };
            let line = match read {
                Ok(line) => line,
                Err(BridgeError::Timeout) => {
                    return Err(rejected.map_or(BridgeError::Timeout, BridgeError::Protocol))
                }
                Err(e) => return Err(e),
            };

            match parse_poll_reply(&line) {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    debug!("skipping {:?} while awaiting poll reply: {}", line, e);
                    rejected = Some(e);
                }
            }
        }
    }

    /// Ticks every `tick_interval` until `shutdown` receives a message or disconnects.
    ///
    /// Returns the device interface once the loop has stopped.
    pub fn run(mut self, shutdown: Receiver<()>) -> IF {
        let ticker = tick(self.config.tick_interval);
        info!("Scheduler started (tick every {:?})", self.config.tick_interval);

        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(ticker) -> _ => {
                    let phase = self.phase;
                    let failures_before = self.link_failures;
                    match self.tick() {
                        Ok(outcome) => {
                            if let TickOutcome::Sent(name) = outcome {
                                debug!("sent {}", name);
                            }
                            if failures_before > 0 && self.link_failures == 0 {
                                info!("Device link recovered after {} failed phase(s)", failures_before);
                            }
                        }
                        // Only the first of a run of link errors is worth a warning.
                        Err(e) if e.is_transport() && self.link_failures > 1 => {
                            debug!("{} phase abandoned: {}", phase, e)
                        }
                        Err(e) => warn!("{} phase abandoned: {}", phase, e),
                    }
                }
            }
        }

        info!("Scheduler stopped");
        self.session.into_inner()
    }
}
