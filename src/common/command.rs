// src/common/command.rs

//! Device command definitions and their wire encoding.
//!
//! Every line sent to the board is a single ASCII letter optionally followed by
//! comma-separated parameters, with no spaces: `d,HAPPY`, `p,2,3,9`, `c`, `g`.

use core::fmt::{self, Write};

use arrayvec::ArrayString;

use super::escape::decode_escapes;
use super::images::translate_image_name;
use super::timing::LINE_CAPACITY;

/// Buffer holding one encoded wire line, without its terminator.
pub type WireLine = ArrayString<LINE_CAPACITY>;

/// A device-bound instruction accepted from the Gateway.
///
/// Parameters are carried as received; range enforcement (pixel coordinates,
/// brightness, pin numbers) is the firmware's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show a built-in image by name (`display_image/NAME`).
    DisplayImage { name: String },
    /// Scroll text across the display (`scroll/TEXT`).
    Scroll { text: String },
    /// Set one LED's brightness (`write_pixel/X/Y/VALUE`).
    WritePixel { x: i32, y: i32, value: i32 },
    /// Blank the display (`display_clear`).
    DisplayClear,
    /// Drive an edge pin high or low (`digital_write/PIN/VALUE`).
    DigitalWrite { pin: i32, value: i32 },
    /// Write a PWM value to an edge pin (`analog_write/PIN/VALUE`).
    AnalogWrite { pin: i32, value: i32 },
    /// Zero every output and clear the display (`reset_all`).
    ResetAll,
}

/// A single line of the device protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireCommand {
    DisplayImage(String),
    Scroll(String),
    WritePixel { x: i32, y: i32, value: i32 },
    DigitalWrite { pin: i32, value: i32 },
    AnalogWrite { pin: i32, value: i32 },
    DisplayClear,
    /// Request a sensor snapshot (`g`).
    Poll,
    /// Request the firmware version string (`v`).
    Version,
}

/// Errors raised while turning a command into wire lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The encoded line does not fit the line buffer.
    #[error("encoded line too long: needed {needed}, capacity {got}")]
    LineTooLong { needed: usize, got: usize },

    /// Decoded text contains CR or LF, which would split the wire line.
    #[error("encoded line contains a line terminator")]
    EmbeddedNewline,
}

impl fmt::Display for WireCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireCommand::DisplayImage(name) => write!(f, "d,{}", name),
            WireCommand::Scroll(text) => write!(f, "s,{}", text),
            WireCommand::WritePixel { x, y, value } => write!(f, "p,{},{},{}", x, y, value),
            WireCommand::DigitalWrite { pin, value } => write!(f, "t,{},{}", pin, value),
            WireCommand::AnalogWrite { pin, value } => write!(f, "a,{},{}", pin, value),
            WireCommand::DisplayClear => f.write_str("c"),
            WireCommand::Poll => f.write_str("g"),
            WireCommand::Version => f.write_str("v"),
        }
    }
}

impl WireCommand {
    /// Formats the line into a fixed-capacity buffer, without the `\n` terminator.
    pub fn format_into(&self) -> Result<WireLine, CodecError> {
        let mut line = WireLine::new();
        if write!(line, "{}", self).is_err() {
            return Err(CodecError::LineTooLong {
                needed: self.to_string().len(),
                got: LINE_CAPACITY,
            });
        }
        if line.contains(['\r', '\n']) {
            return Err(CodecError::EmbeddedNewline);
        }
        Ok(line)
    }
}

impl Command {
    /// The request name this command is addressed by on the Gateway surface.
    pub fn name(&self) -> &'static str {
        match self {
            Command::DisplayImage { .. } => "display_image",
            Command::Scroll { .. } => "scroll",
            Command::WritePixel { .. } => "write_pixel",
            Command::DisplayClear => "display_clear",
            Command::DigitalWrite { .. } => "digital_write",
            Command::AnalogWrite { .. } => "analog_write",
            Command::ResetAll => "reset_all",
        }
    }

    /// Expands the command into the wire lines that implement it, in send order.
    ///
    /// Text arguments have `%XY` escapes decoded; image names are translated
    /// from their numbered form first.
    pub fn to_wire(&self) -> Vec<WireCommand> {
        match self {
            Command::DisplayImage { name } => {
                let name = decode_escapes(name);
                vec![WireCommand::DisplayImage(translate_image_name(&name).into_owned())]
            }
            Command::Scroll { text } => vec![WireCommand::Scroll(decode_escapes(text))],
            Command::WritePixel { x, y, value } => vec![WireCommand::WritePixel {
                x: *x,
                y: *y,
                value: *value,
            }],
            Command::DisplayClear => vec![WireCommand::DisplayClear],
            Command::DigitalWrite { pin, value } => vec![WireCommand::DigitalWrite {
                pin: *pin,
                value: *value,
            }],
            Command::AnalogWrite { pin, value } => vec![WireCommand::AnalogWrite {
                pin: *pin,
                value: *value,
            }],
            Command::ResetAll => {
                let mut lines = Vec::with_capacity(7);
                for pin in 0..3 {
                    lines.push(WireCommand::DigitalWrite { pin, value: 0 });
                }
                for pin in 0..3 {
                    lines.push(WireCommand::AnalogWrite { pin, value: 0 });
                }
                lines.push(WireCommand::DisplayClear);
                lines
            }
        }
    }
}

/// Encodes a command into its wire lines.
///
/// Fails as a whole if any line cannot be encoded, so a command is never
/// half-transmitted because of an encoding problem.
pub fn encode_command(command: &Command) -> Result<Vec<WireLine>, CodecError> {
    command.to_wire().iter().map(WireCommand::format_into).collect()
}
