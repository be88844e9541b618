// src/bridge/shared.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::common::gesture::PollReport;

/// State written by the Gateway and consumed by the Scheduler, or the reverse.
///
/// The poll flag coalesces: any number of requests made before the next poll
/// phase produce exactly one device poll.
#[derive(Debug, Default)]
pub struct SharedState {
    poll_pending: AtomicBool,
    ignore_next_poll: AtomicBool,
    last_report: Mutex<Option<PollReport>>,
}

impl SharedState {
    /// `suppress_first_poll` arms the one-shot suppression of the first poll request.
    pub fn new(suppress_first_poll: bool) -> Self {
        SharedState {
            poll_pending: AtomicBool::new(false),
            ignore_next_poll: AtomicBool::new(suppress_first_poll),
            last_report: Mutex::new(None),
        }
    }

    /// Records a poll request.
    ///
    /// Returns `false` if the request was swallowed by the one-shot suppression,
    /// in which case the pending flag is left untouched.
    pub fn request_poll(&self) -> bool {
        if self.ignore_next_poll.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.poll_pending.store(true, Ordering::Release);
        true
    }

    /// Clears the pending flag, returning whether it was set.
    pub fn take_poll_request(&self) -> bool {
        self.poll_pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_poll_pending(&self) -> bool {
        self.poll_pending.load(Ordering::Acquire)
    }

    pub fn is_poll_suppressed(&self) -> bool {
        self.ignore_next_poll.load(Ordering::Acquire)
    }

    pub fn publish(&self, report: PollReport) {
        *self.report_slot() = Some(report);
    }

    /// Snapshot of the most recently published report.
    pub fn last_report(&self) -> Option<PollReport> {
        *self.report_slot()
    }

    // A panic while holding the lock cannot leave a half-written `Option<PollReport>`.
    fn report_slot(&self) -> MutexGuard<'_, Option<PollReport>> {
        self.last_report.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
