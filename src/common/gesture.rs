// src/common/gesture.rs

use core::fmt;

use super::response::PollReply;
use super::timing::SHAKE_THRESHOLD;

/// Booleans derived from the accelerometer axes; the board never sends these.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Gestures {
    pub shaken: bool,
    pub tilted_right: bool,
    pub tilted_left: bool,
    pub tilted_up: bool,
    pub tilted_down: bool,
}

impl Gestures {
    /// Tilt from the X and Y axes. Zero counts as left and down.
    fn tilt(x: i32, y: i32, shaken: bool) -> Self {
        Gestures {
            shaken,
            tilted_right: x > 0,
            tilted_left: x <= 0,
            tilted_up: y > 0,
            tilted_down: y <= 0,
        }
    }
}

/// Remembers the previous Z reading so consecutive polls can detect a shake.
///
/// Owned by the scheduler; nothing else decodes polls.
#[derive(Debug, Clone)]
pub struct GestureState {
    last_z: i32,
    shake_threshold: i32,
}

impl Default for GestureState {
    fn default() -> Self {
        Self::new(SHAKE_THRESHOLD)
    }
}

impl GestureState {
    pub fn new(shake_threshold: i32) -> Self {
        GestureState {
            last_z: 0,
            shake_threshold,
        }
    }

    /// The Z reading of the most recently observed poll (0 before the first).
    pub fn last_z(&self) -> i32 {
        self.last_z
    }

    /// Derives gestures for a decoded poll and builds its report.
    ///
    /// `last_z` is replaced by the new Z after the delta is taken, on every call.
    pub fn observe(&mut self, reply: &PollReply) -> PollReport {
        let delta = (i64::from(reply.z) - i64::from(self.last_z)).abs();
        let shaken = delta > i64::from(self.shake_threshold);
        self.last_z = reply.z;

        PollReport {
            gestures: Gestures::tilt(reply.x, reply.y, shaken),
            reply: *reply,
        }
    }
}

/// A decoded poll plus its derived gestures: the text callers receive for `poll`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub gestures: Gestures,
    pub reply: PollReply,
}

impl fmt::Display for PollReport {
    /// One `key value` line per entry, each terminated by `\n`, in fixed order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = &self.gestures;
        let r = &self.reply;
        writeln!(f, "shaken {}", g.shaken)?;
        writeln!(f, "tilted_right {}", g.tilted_right)?;
        writeln!(f, "tilted_left {}", g.tilted_left)?;
        writeln!(f, "tilted_up {}", g.tilted_up)?;
        writeln!(f, "tilted_down {}", g.tilted_down)?;
        writeln!(f, "button_a_pressed {}", r.button_a)?;
        writeln!(f, "button_b_pressed {}", r.button_b)?;
        for (pin, value) in r.digital.iter().enumerate() {
            writeln!(f, "digital_read/{} {}", pin, value)?;
        }
        for (pin, value) in r.analog.iter().enumerate() {
            writeln!(f, "analog_read/{} {}", pin, value)?;
        }
        Ok(())
    }
}
