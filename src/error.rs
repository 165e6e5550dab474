//! Unified error types for the EyeCan firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level error handling uniform. All variants are `Copy` so they can be
//! handed to event sinks and counters without allocation.
//!
//! None of these are fatal to the alert loop: parse and transport errors are
//! logged and discarded by the ingestor, and the pattern engine has no error
//! states at all.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An inbound message could not be turned into a reading.
    Parse(ParseError),
    /// The byte transport (UART / BLE) reported a problem.
    Transport(TransportError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Why a message was not accepted as a [`Reading`](crate::reading::Reading).
///
/// Every variant leaves the shared reading untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace / terminators in the buffer.
    Empty,
    /// Fewer than four fields were present.
    IncompleteFields,
    /// A field is not a decimal integer, or the message has extra fields.
    Malformed,
    /// `near_threshold > far_threshold` while the reject policy is active.
    InvertedThresholds,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty message"),
            Self::IncompleteFields => write!(f, "fewer than 4 fields"),
            Self::Malformed => write!(f, "malformed field"),
            Self::InvertedThresholds => write!(f, "near threshold above far threshold"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// More bytes arrived than fit in one message buffer.
    Overflow,
    /// The driver returned an I/O error.
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "receive buffer overflow"),
            Self::Io => write!(f, "driver I/O error"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
