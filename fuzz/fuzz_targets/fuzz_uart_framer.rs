//! Fuzz target: `LineFramer::on_read`
//!
//! Splits the input at an arbitrary point, feeds both halves plus an idle
//! read, and checks that no frame exceeds the message buffer, no frame
//! contains a terminator, and nothing is left pending after the idle read.
//!
//! cargo fuzz run fuzz_uart_framer

#![no_main]

use eyecan::adapters::uart::LineFramer;
use eyecan::app::commands::LinkCommand;
use eyecan::reading::MAX_MESSAGE_LEN;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |b| *b as usize).min(data.len());
    let (a, b) = data.split_at(split);

    let mut framer = LineFramer::new();
    let check = |cmd: LinkCommand| {
        if let LinkCommand::Data(p) = cmd {
            assert!(!p.is_empty());
            assert!(p.len() <= MAX_MESSAGE_LEN);
            assert!(!p.contains(&b'\r') && !p.contains(&b'\n'));
        }
    };
    framer.on_read(a, check);
    framer.on_read(b, check);
    framer.on_read(&[], check);
    assert_eq!(framer.pending(), 0);
});
