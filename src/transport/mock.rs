// src/transport/mock.rs

//! Scripted in-memory device used by the unit tests.
//!
//! Clones share one device, so a test can keep a handle after moving the
//! interface into a session or scheduler.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use nb::Result as NbResult;

use crate::common::hal_traits::{DeviceClock, LineSerial};

// --- Mock Instant ---
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct MockInstant(u64);

impl core::ops::Add<Duration> for MockInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        MockInstant(self.0.saturating_add(rhs.as_micros() as u64))
    }
}

impl core::ops::Sub<MockInstant> for MockInstant {
    type Output = Duration;
    fn sub(self, rhs: MockInstant) -> Duration {
        Duration::from_micros(self.0.saturating_sub(rhs.0))
    }
}

// --- Mock Comm Error ---
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MockCommError;

// --- Mock Device ---
#[derive(Debug, Default)]
struct MockDevice {
    current_time_us: u64,
    read_queue: VecDeque<u8>,
    written: Vec<u8>,
    pending_line: Vec<u8>,
    poll_replies: VecDeque<String>,
    version: Option<String>,
    echo_digital_writes: bool,
    /// Replies scheduled for a later simulated time, in due order.
    scheduled: VecDeque<(u64, Vec<u8>)>,
    processing_delay_us: u64,
    busy_until_us: u64,
    write_blocked: bool,
    /// Bytes accepted before writes start blocking; `None` is unlimited.
    write_budget: Option<usize>,
    read_error: bool,
    io_call_counts: HashMap<&'static str, u32>,
}

impl MockDevice {
    fn increment_call_count(&mut self, name: &'static str) {
        *self.io_call_counts.entry(name).or_insert(0) += 1;
    }

    /// Queues a reply line. With a processing delay, lines are handled one at a
    /// time and each reply appears only once the device has finished that line.
    fn reply(&mut self, text: &str) {
        let mut bytes = text.as_bytes().to_vec();
        bytes.extend_from_slice(b"\r\n");
        if self.processing_delay_us == 0 {
            self.read_queue.extend(bytes);
            return;
        }
        let due = self.busy_until_us.max(self.current_time_us) + self.processing_delay_us;
        self.busy_until_us = due;
        self.scheduled.push_back((due, bytes));
    }

    fn deliver_due_replies(&mut self) {
        while let Some((due, _)) = self.scheduled.front() {
            if *due > self.current_time_us {
                break;
            }
            if let Some((_, bytes)) = self.scheduled.pop_front() {
                self.read_queue.extend(bytes);
            }
        }
    }

    /// Reacts to a complete line the way the firmware would.
    fn handle_line(&mut self) {
        let line = String::from_utf8_lossy(&self.pending_line).into_owned();
        self.pending_line.clear();

        if line == "g" {
            if let Some(reply) = self.poll_replies.pop_front() {
                self.reply(&reply);
            }
        } else if line == "v" {
            if let Some(version) = self.version.clone() {
                self.reply(&version);
            }
        } else if line.starts_with("t,") && self.echo_digital_writes {
            self.reply("[True, False, False]");
        }
    }
}

// --- Mock Interface ---
#[derive(Debug, Clone, Default)]
pub(crate) struct MockInterface {
    device: Arc<Mutex<MockDevice>>,
}

impl MockInterface {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn device(&self) -> MutexGuard<'_, MockDevice> {
        self.device.lock().unwrap()
    }

    pub(crate) fn stage_read_data(&self, data: &[u8]) {
        self.device().read_queue.extend(data);
    }

    /// Queues the reply sent for the next `g` line. Without one, polls go unanswered.
    pub(crate) fn queue_poll_reply(&self, reply: &str) {
        self.device().poll_replies.push_back(reply.to_owned());
    }

    pub(crate) fn set_version(&self, version: &str) {
        self.device().version = Some(version.to_owned());
    }

    /// Makes the device print its output state after every `t` line, like the firmware.
    pub(crate) fn set_echo_digital_writes(&self, echo: bool) {
        self.device().echo_digital_writes = echo;
    }

    /// Delays every reply as if the firmware paused after reading each line.
    pub(crate) fn set_processing_delay(&self, delay: Duration) {
        self.device().processing_delay_us = delay.as_micros() as u64;
    }

    pub(crate) fn set_write_budget(&self, budget: Option<usize>) {
        self.device().write_budget = budget;
    }

    pub(crate) fn set_write_blocked(&self, blocked: bool) {
        self.device().write_blocked = blocked;
    }

    pub(crate) fn set_read_error(&self, error: bool) {
        self.device().read_error = error;
    }

    pub(crate) fn written(&self) -> Vec<u8> {
        self.device().written.clone()
    }

    pub(crate) fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.device().written)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub(crate) fn call_count(&self, name: &'static str) -> u32 {
        *self.device().io_call_counts.get(name).unwrap_or(&0)
    }

    pub(crate) fn now_us(&self) -> u64 {
        self.device().current_time_us
    }
}

impl DeviceClock for MockInterface {
    type Instant = MockInstant;

    fn now(&self) -> Self::Instant {
        MockInstant(self.device().current_time_us)
    }

    fn delay_us(&mut self, us: u32) {
        let mut device = self.device();
        device.current_time_us = device.current_time_us.saturating_add(us as u64);
    }
}

impl LineSerial for MockInterface {
    type Error = MockCommError;

    fn read_byte(&mut self) -> NbResult<u8, Self::Error> {
        let mut device = self.device();
        device.increment_call_count("read_byte");
        if device.read_error {
            return Err(nb::Error::Other(MockCommError));
        }
        device.deliver_due_replies();
        device.read_queue.pop_front().ok_or(nb::Error::WouldBlock)
    }

    fn write_byte(&mut self, byte: u8) -> NbResult<(), Self::Error> {
        let mut device = self.device();
        device.increment_call_count("write_byte");
        if device.write_blocked || device.write_budget == Some(0) {
            return Err(nb::Error::WouldBlock);
        }
        if let Some(budget) = device.write_budget.as_mut() {
            *budget -= 1;
        }
        device.written.push(byte);
        if byte == b'\n' {
            device.handle_line();
        } else {
            device.pending_line.push(byte);
        }
        Ok(())
    }

    fn flush(&mut self) -> NbResult<(), Self::Error> {
        self.device().increment_call_count("flush");
        Ok(())
    }
}
