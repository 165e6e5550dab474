//! Property and fuzz-style tests for the parser, classifier and framer.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use eyecan::adapters::uart::LineFramer;
use eyecan::app::commands::LinkCommand;
use eyecan::config::CadenceConfig;
use eyecan::fsm::{classify, AlertPattern, PatternEngine};
use eyecan::reading::{parse_reading, Reading, MAX_MESSAGE_LEN};
use eyecan::state::{ConnectionState, SharedState};
use proptest::prelude::*;

fn any_reading() -> impl Strategy<Value = Reading> {
    (any::<i32>(), any::<i32>(), any::<i32>(), any::<i32>())
        .prop_map(|(s, d, n, f)| Reading::new(s, d, n, f))
}

// ── Parser ────────────────────────────────────────────────────

proptest! {
    /// Any four integers rendered in wire form parse back to exactly
    /// those fields, with or without the terminator.
    #[test]
    fn four_integers_parse_exactly(r in any_reading(), terminator in prop::sample::select(vec!["", "\r", "\r\n", "\n"])) {
        let wire = format!("{r}{terminator}");
        prop_assert_eq!(parse_reading(wire.as_bytes()), Ok(r));
    }

    /// Fewer than four numeric tokens never parses, and never disturbs the
    /// shared slot.
    #[test]
    fn short_messages_never_publish(fields in prop::collection::vec(any::<i32>(), 0..4)) {
        let state = SharedState::new();
        state.publish(Reading::new(5, 10, 2, 8), 0);
        let wire = fields.iter().map(i32::to_string).collect::<Vec<_>>().join(", ");
        if let Ok(r) = parse_reading(wire.as_bytes()) {
            state.publish(r, 1);
        }
        prop_assert_eq!(state.snapshot().reading, Some(Reading::new(5, 10, 2, 8)));
    }

    /// Arbitrary bytes never panic the parser.
    #[test]
    fn parser_total_on_arbitrary_bytes(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_reading(&bytes);
    }
}

// ── Classifier ────────────────────────────────────────────────

proptest! {
    #[test]
    fn disconnected_always_no_connection(r in prop::option::of(any_reading())) {
        prop_assert_eq!(classify(ConnectionState::Disconnected, r.as_ref()), AlertPattern::NoConnection);
    }

    /// With ordered, set thresholds the zones partition the distance axis.
    #[test]
    fn zones_partition_distance(near in 0i32..1000, gap in 0i32..1000, d in -10i32..3000) {
        let far = near + gap;
        let p = classify(ConnectionState::Connected(1), Some(&Reading::new(0, d, near, far)));
        let expected = if d < 0 || d > far {
            AlertPattern::Clear
        } else if d <= near {
            AlertPattern::Urgent
        } else {
            AlertPattern::Caution
        };
        prop_assert_eq!(p, expected);
    }

    /// Unchanged input: same pattern every tick, one transition total, and
    /// blink patterns alternate the level on every tick.
    #[test]
    fn engine_is_stable_under_unchanged_input(r in any_reading(), ticks in 2usize..20) {
        let pattern = classify(ConnectionState::Connected(1), Some(&r));
        let mut engine = PatternEngine::with_cadence(CadenceConfig::default());
        let mut level = false;
        let mut transitions = 0;
        for i in 0..ticks {
            let out = engine.step(pattern, level);
            prop_assert_eq!(out.pattern, pattern);
            if out.transition.is_some() {
                transitions += 1;
            }
            match pattern {
                AlertPattern::Urgent | AlertPattern::Caution => prop_assert_eq!(out.level, i % 2 == 0),
                AlertPattern::Clear => prop_assert!(!out.level),
                AlertPattern::NoConnection => prop_assert!(out.level),
            }
            level = out.level;
        }
        prop_assert_eq!(transitions, 1);
    }
}

// ── UART framer ───────────────────────────────────────────────

proptest! {
    /// However a stream of terminated lines is chunked, the framer yields
    /// the same messages.
    #[test]
    fn framing_is_chunking_independent(
        lines in prop::collection::vec(any_reading(), 1..6),
        cut in prop::collection::vec(1usize..16, 1..40),
    ) {
        let stream: Vec<u8> = lines.iter().flat_map(|r| format!("{r}\r").into_bytes()).collect();

        let mut whole = Vec::new();
        LineFramer::new().on_read(&stream, |c| whole.push(c));

        let mut framer = LineFramer::new();
        let mut pieces = Vec::new();
        let mut rest = stream.as_slice();
        let mut sizes = cut.iter().cycle();
        while !rest.is_empty() {
            let n = (*sizes.next().unwrap()).min(rest.len());
            framer.on_read(&rest[..n], |c| pieces.push(c));
            rest = &rest[n..];
        }

        prop_assert_eq!(&whole, &pieces);
        prop_assert_eq!(whole.len(), lines.len());
        for (cmd, r) in whole.iter().zip(&lines) {
            match cmd {
                LinkCommand::Data(p) => prop_assert_eq!(parse_reading(p), Ok(*r)),
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }

    /// Frames never exceed the message buffer.
    #[test]
    fn frames_bounded(bytes in prop::collection::vec(any::<u8>(), 0..600)) {
        let mut framer = LineFramer::new();
        framer.on_read(&bytes, |c| {
            if let LinkCommand::Data(p) = c {
                assert!(p.len() <= MAX_MESSAGE_LEN);
            }
        });
        framer.on_read(&[], |_| {});
        prop_assert_eq!(framer.pending(), 0);
    }
}
