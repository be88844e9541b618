// src/gateway/mod.rs

//! The request-facing half of the bridge.
//!
//! Requests never wait on the device: commands are queued for the scheduler
//! and polls are answered from the last published report.

pub mod parser;

pub use parser::{parse_request, GatewayRequest, RequestParseError};

use std::sync::Arc;

use crossbeam_channel::Sender;
use log::{debug, warn};

use crate::bridge::SharedState;
use crate::common::command::Command;

/// Body for acknowledged commands, suppressed polls and polls with no data yet.
pub const ACK: &str = "ok";
/// Body for command names the bridge does not recognize.
pub const UNKNOWN_ACK: &str = "OK";

/// A text reply to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub body: String,
}

impl GatewayResponse {
    pub const CONTENT_TYPE: &'static str = "text/plain";
    pub const ALLOW_ORIGIN: &'static str = "*";

    fn ok(body: impl Into<String>) -> Self {
        GatewayResponse {
            status: 200,
            body: body.into(),
        }
    }
}

/// Cheap-to-clone handle shared by every request handler.
#[derive(Debug, Clone)]
pub struct Gateway {
    commands: Sender<Command>,
    shared: Arc<SharedState>,
}

impl Gateway {
    pub fn new(commands: Sender<Command>, shared: Arc<SharedState>) -> Self {
        Gateway { commands, shared }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// Number of commands waiting for the scheduler.
    pub fn queued(&self) -> usize {
        self.commands.len()
    }

    /// Answers one request path. Every outcome is a 200 response.
    pub fn handle(&self, path: &str) -> GatewayResponse {
        match parse_request(path) {
            Ok(GatewayRequest::Poll) => self.poll(),
            Ok(GatewayRequest::Command(command)) => {
                self.submit(command);
                GatewayResponse::ok(ACK)
            }
            Ok(GatewayRequest::Unknown(name)) => {
                debug!("unknown command received: {}", name);
                GatewayResponse::ok(UNKNOWN_ACK)
            }
            Err(e) => {
                warn!("dropping request {:?}: {}", path, e);
                GatewayResponse::ok(ACK)
            }
        }
    }

    /// Flags a device poll and answers with the last published report.
    pub fn poll(&self) -> GatewayResponse {
        if !self.shared.request_poll() {
            return GatewayResponse::ok(ACK);
        }
        match self.shared.last_report() {
            Some(report) => GatewayResponse::ok(report.to_string()),
            None => GatewayResponse::ok(ACK),
        }
    }

    /// Queues a command for the device, in submission order.
    pub fn submit(&self, command: Command) {
        if self.commands.send(command).is_err() {
            warn!("scheduler has stopped; command discarded");
        }
    }
}
