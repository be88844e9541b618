// src/common/config.rs

use core::time::Duration;

use super::timing;

/// Runtime knobs for a bridge session. `Default` mirrors [`timing`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Read timeout for a poll reply during normal operation.
    pub io_timeout: Duration,
    /// Timeout for writing one line.
    pub write_timeout: Duration,
    /// Read timeout for each startup handshake reply.
    pub handshake_timeout: Duration,
    /// Interval between scheduler ticks.
    pub tick_interval: Duration,
    /// Z-axis delta above which a poll reports `shaken`.
    pub shake_threshold: i32,
    /// Answer the first `poll` request with a bare acknowledgement instead of data.
    pub suppress_first_poll: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            baud_rate: timing::BAUD_RATE,
            io_timeout: timing::POLL_REPLY_TIMEOUT,
            write_timeout: timing::WRITE_TIMEOUT,
            handshake_timeout: timing::HANDSHAKE_TIMEOUT,
            tick_interval: timing::TICK_INTERVAL,
            shake_threshold: timing::SHAKE_THRESHOLD,
            suppress_first_poll: true,
        }
    }
}
