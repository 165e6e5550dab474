//! Fuzz target: `parse_reading`
//!
//! Drives arbitrary byte sequences into the reading parser and asserts
//! that it never panics and that anything it accepts re-renders to a
//! message that parses to the same reading.
//!
//! cargo fuzz run fuzz_reading_parser

#![no_main]

use eyecan::reading::parse_reading;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(reading) = parse_reading(data) {
        let wire = reading.to_string();
        assert_eq!(parse_reading(wire.as_bytes()), Ok(reading));
    }
});
