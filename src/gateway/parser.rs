// src/gateway/parser.rs

use core::str::FromStr;

use crate::common::command::Command;

/// A classified inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayRequest {
    /// `poll`: read the last published report.
    Poll,
    /// A recognized device command, ready to enqueue.
    Command(Command),
    /// A name this bridge does not know; acknowledged and ignored.
    Unknown(String),
}

/// Why a recognized command could not be built from its path segments.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestParseError {
    #[error("empty request path")]
    Empty,

    #[error("{command}: missing argument {index}")]
    MissingArgument { command: String, index: usize },

    #[error("{command}: argument {index} is not an integer: {value:?}")]
    InvalidNumber {
        command: String,
        index: usize,
        value: String,
    },
}

/// Positional access to the segments after the command name.
struct Args<'a> {
    command: &'a str,
    segments: Vec<&'a str>,
}

impl<'a> Args<'a> {
    /// Argument `index`, counting from 1 as it appears in the path.
    fn text(&self, index: usize) -> Result<&'a str, RequestParseError> {
        self.segments
            .get(index - 1)
            .copied()
            .ok_or_else(|| RequestParseError::MissingArgument {
                command: self.command.to_owned(),
                index,
            })
    }

    fn number<T: FromStr>(&self, index: usize) -> Result<T, RequestParseError> {
        let raw = self.text(index)?;
        raw.trim().parse().map_err(|_| RequestParseError::InvalidNumber {
            command: self.command.to_owned(),
            index,
            value: raw.to_owned(),
        })
    }
}

/// Parses a request path such as `/write_pixel/2/3/9` or `poll`.
///
/// A leading `/` and any query string are ignored. Text arguments are kept as
/// received (still `%`-escaped); the codec decodes them before transmission.
/// Extra trailing segments are ignored.
pub fn parse_request(path: &str) -> Result<GatewayRequest, RequestParseError> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = path.split_once('?').map_or(path, |(before, _)| before);

    let mut segments = path.split('/');
    let name = match segments.next() {
        Some(name) if !name.is_empty() => name,
        _ => return Err(RequestParseError::Empty),
    };

    let args = Args {
        command: name,
        segments: segments.collect(),
    };

    let command = match name {
        "poll" => return Ok(GatewayRequest::Poll),
        "display_image" => Command::DisplayImage {
            name: args.text(1)?.to_owned(),
        },
        "scroll" => Command::Scroll {
            text: args.text(1)?.to_owned(),
        },
        "write_pixel" => Command::WritePixel {
            x: args.number(1)?,
            y: args.number(2)?,
            value: args.number(3)?,
        },
        "digital_write" => Command::DigitalWrite {
            pin: args.number(1)?,
            value: args.number(2)?,
        },
        "analog_write" => Command::AnalogWrite {
            pin: args.number(1)?,
            value: args.number(2)?,
        },
        "display_clear" => Command::DisplayClear,
        "reset_all" => Command::ResetAll,
        _ => return Ok(GatewayRequest::Unknown(name.to_owned())),
    };
    Ok(GatewayRequest::Command(command))
}
