// src/common/response/parse.rs

use super::error::ResponseParseError;
use super::PollReply;

/// Number of comma-separated fields in a well-formed poll reply.
pub const POLL_FIELD_COUNT: usize = 11;

// --- Internal Helpers ---
#[inline]
fn trim_cr_lf(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

fn parse_axis(field: &str, index: usize) -> Result<i32, ResponseParseError> {
    field
        .trim()
        .parse::<i32>()
        .map_err(|_| ResponseParseError::InvalidAxis { index })
}

fn parse_button(field: &str, index: usize) -> Result<bool, ResponseParseError> {
    match field.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ResponseParseError::InvalidButton { index }),
    }
}

fn parse_pin(field: &str, index: usize) -> Result<u16, ResponseParseError> {
    field
        .trim()
        .parse::<u16>()
        .map_err(|_| ResponseParseError::InvalidPinValue { index })
}

// --- Public Parsing Functions ---

/// Parses the board's reply to a `g` poll.
///
/// The reply is case-normalized first (the firmware prints Python booleans as
/// `True`/`False`). Anything other than exactly [`POLL_FIELD_COUNT`] fields of the
/// expected kinds is rejected.
pub fn parse_poll_reply(line: &str) -> Result<PollReply, ResponseParseError> {
    let line = trim_cr_lf(line).to_ascii_lowercase();
    if line.trim().is_empty() {
        return Err(ResponseParseError::Empty);
    }

    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != POLL_FIELD_COUNT {
        return Err(ResponseParseError::FieldCount {
            expected: POLL_FIELD_COUNT,
            got: fields.len(),
        });
    }

    Ok(PollReply {
        x: parse_axis(fields[0], 0)?,
        y: parse_axis(fields[1], 1)?,
        z: parse_axis(fields[2], 2)?,
        button_a: parse_button(fields[3], 3)?,
        button_b: parse_button(fields[4], 4)?,
        digital: [
            parse_pin(fields[5], 5)?,
            parse_pin(fields[6], 6)?,
            parse_pin(fields[7], 7)?,
        ],
        analog: [
            parse_pin(fields[8], 8)?,
            parse_pin(fields[9], 9)?,
            parse_pin(fields[10], 10)?,
        ],
    })
}
