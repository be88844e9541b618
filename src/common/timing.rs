// src/common/timing.rs

use core::time::Duration;

// === Serial Link ===

/// Baud rate used by the firmware's UART.
pub const BAUD_RATE: u32 = 115_200;

/// Maximum number of bytes in a single wire line, excluding the `\n` terminator.
/// This is the bridge's own bound. A longer line fails to encode with
/// `LineTooLong` and the whole command is dropped with a warning; the HTTP
/// caller has already been answered `ok`.
pub const LINE_CAPACITY: usize = 128;

/// Longest decoded `/scroll` text that fits in one `s,` line.
pub const MAX_SCROLL_TEXT: usize = LINE_CAPACITY - 2;

/// Delay between attempts when the device has no byte ready yet.
pub const IO_RETRY_DELAY: Duration = Duration::from_micros(100);

// === Per-operation Timeouts ===

/// Time allowed for a poll reply to arrive during normal operation.
pub const POLL_REPLY_TIMEOUT: Duration = Duration::from_millis(100);
/// Time allowed to push one encoded line into the device.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(100);
/// Time allowed for each startup handshake reply (`g` then `v`).
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);
/// Settling time after opening the port before the first handshake line.
pub const PORT_SETTLE_DELAY: Duration = Duration::from_millis(50);

// === Scheduler ===

/// Interval between scheduler ticks. One phase (poll or command) is serviced per tick.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1);

// === Gestures ===

/// Z-axis change (in milli-g) between two consecutive polls above which the board
/// counts as shaken. A change of exactly this value is not a shake.
pub const SHAKE_THRESHOLD: i32 = 2000;
