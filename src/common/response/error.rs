// src/common/response/error.rs

/// Error type specific to poll reply parsing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ResponseParseError {
    /// The reply line was empty.
    #[error("empty reply")]
    Empty,
    /// The reply did not split into the expected number of fields.
    #[error("expected {expected} fields, got {got}")]
    FieldCount { expected: usize, got: usize },
    /// An accelerometer axis was not a signed integer.
    #[error("accelerometer field {index} is not an integer")]
    InvalidAxis { index: usize },
    /// A button field was neither `true` nor `false`.
    #[error("button field {index} is not a boolean")]
    InvalidButton { index: usize },
    /// A pin reading was not an unsigned integer.
    #[error("pin field {index} is not an unsigned integer")]
    InvalidPinValue { index: usize },
}
