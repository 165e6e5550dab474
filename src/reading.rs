//! Reading record and the text protocol it travels in.
//!
//! The perception unit sends one ASCII line per update:
//!
//! ```text
//! <signal>, <distance>, <near_threshold>, <far_threshold>\r
//! ```
//!
//! Parsing is all-or-nothing: either all four fields convert and a fresh
//! [`Reading`] comes back, or a [`ParseError`] does and the caller keeps
//! whatever it had before.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Field separator used by the perception unit.
pub const DELIMITER: &str = ", ";

/// Number of integer fields in one message.
pub const FIELD_COUNT: usize = 4;

/// Largest message a transport will hand to the parser.
pub const MAX_MESSAGE_LEN: usize = 128;

/// One distance/threshold update from the perception unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Opaque to the alert logic; carried through for diagnostics.
    pub signal: i32,
    /// Distance from the user's hand to the nearest hazard.
    pub distance: i32,
    /// At or below this distance the alert is urgent.
    pub near_threshold: i32,
    /// At or below this distance (and above near) the alert is a caution.
    pub far_threshold: i32,
}

impl Reading {
    /// Wire sentinel for "no value". Any negative distance or far threshold
    /// is treated as unset.
    pub const UNSET: i32 = -1;

    pub const fn new(signal: i32, distance: i32, near_threshold: i32, far_threshold: i32) -> Self {
        Self {
            signal,
            distance,
            near_threshold,
            far_threshold,
        }
    }

    pub fn has_distance(&self) -> bool {
        self.distance >= 0
    }

    pub fn has_far_threshold(&self) -> bool {
        self.far_threshold >= 0
    }

    /// Both thresholds are set and the near one lies beyond the far one.
    pub fn thresholds_inverted(&self) -> bool {
        self.has_far_threshold() && self.near_threshold > self.far_threshold
    }

    /// Same reading with the two thresholds exchanged.
    pub fn with_thresholds_swapped(self) -> Self {
        Self {
            near_threshold: self.far_threshold,
            far_threshold: self.near_threshold,
            ..self
        }
    }
}

/// Renders the wire form, without the trailing terminator.
impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}{d}{}{d}{}{d}{}",
            self.signal,
            self.distance,
            self.near_threshold,
            self.far_threshold,
            d = DELIMITER
        )
    }
}

/// Parse one message into a [`Reading`].
///
/// Trailing `\r`, `\n`, spaces and NULs are ignored. Fields are split on
/// `,` with surrounding spaces trimmed, so both `"1, 8, 10, 5"` and
/// `"1,8,10,5"` are accepted.
pub fn parse_reading(raw: &[u8]) -> Result<Reading, ParseError> {
    let text = core::str::from_utf8(raw).map_err(|_| ParseError::Malformed)?;
    let text = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut fields = [0i32; FIELD_COUNT];
    let mut tokens = text.split(',');
    for slot in &mut fields {
        let token = tokens.next().ok_or(ParseError::IncompleteFields)?;
        *slot = parse_field(token)?;
    }
    if tokens.next().is_some() {
        return Err(ParseError::Malformed);
    }

    let [signal, distance, near_threshold, far_threshold] = fields;
    Ok(Reading::new(signal, distance, near_threshold, far_threshold))
}

fn parse_field(token: &str) -> Result<i32, ParseError> {
    let token = token.trim_matches(' ');
    if token.is_empty() {
        return Err(ParseError::Malformed);
    }
    token.parse::<i32>().map_err(|_| ParseError::Malformed)
}
