//! Error types for the floodline crate

use thiserror::Error;

/// Main error type for the floodline crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("channel closed while awaiting {operation} reply")]
    ChannelClosed { operation: String },

    #[error("timed out after {millis} ms while awaiting {operation} reply")]
    ReplyTimeout { operation: String, millis: u64 },

    #[error("malformed frame during {operation}: {message}")]
    MalformedFrame { operation: String, message: String },

    #[error("failed to encode {operation}: {message}")]
    Encode { operation: String, message: String },

    #[error("failed to decode {operation}: {message}")]
    Decode { operation: String, message: String },

    #[error("joint action must contain {expected} commands, got {got}")]
    JointActionLength { expected: usize, got: usize },

    #[error("command {index} addresses train {got}, expected train {expected}")]
    JointActionOrder {
        index: usize,
        expected: u8,
        got: u8,
    },

    #[error("action '{kind}' is not legal for train {train}")]
    InvalidAction { train: u8, kind: String },

    #[error("response carries {got} {roster} records, topology declares {expected}")]
    RosterMismatch {
        roster: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("state vector length {got} does not match declared length {expected}")]
    VectorLengthMismatch { expected: usize, got: usize },

    #[error("invalid direction '{value}' in train record {train}")]
    InvalidDirection { train: u8, value: String },

    #[error("action space is empty; no candidate to choose from")]
    EmptyActionSpace,

    #[error("respond called with no pending choice")]
    NoPendingChoice,

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },
}

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
