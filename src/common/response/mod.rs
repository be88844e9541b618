// src/common/response/mod.rs

mod error;
pub mod parse;

pub use error::ResponseParseError;
pub use parse::{parse_poll_reply, POLL_FIELD_COUNT};

/// One sensor snapshot as reported by the board in reply to `g`.
///
/// Field order on the wire:
/// `x,y,z,button_a,button_b,digital0,digital1,digital2,analog0,analog1,analog2`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PollReply {
    /// Accelerometer X axis, milli-g.
    pub x: i32,
    /// Accelerometer Y axis, milli-g.
    pub y: i32,
    /// Accelerometer Z axis, milli-g.
    pub z: i32,
    pub button_a: bool,
    pub button_b: bool,
    /// Digital reads of pins 0..=2. Pins driven as outputs read back as 0.
    pub digital: [u16; 3],
    /// Analog reads of pins 0..=2 (0..=1023).
    pub analog: [u16; 3],
}
