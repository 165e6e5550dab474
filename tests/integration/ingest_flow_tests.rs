//! Transport bytes → LinkCommand → Ingestor → SharedState.

use eyecan::adapters::ble::classify_write;
use eyecan::adapters::uart::LineFramer;
use eyecan::app::commands::LinkCommand;
use eyecan::app::events::AppEvent;
use eyecan::app::ingest::Ingestor;
use eyecan::config::{LinkMode, ThresholdPolicy};
use eyecan::error::ParseError;
use eyecan::events;
use eyecan::reading::Reading;
use eyecan::state::{ConnectionState, SharedState, WIRED_HANDLE};

use crate::mock_hw::{CapturingSink, ManualClock};

#[test]
fn valid_message_publishes_exact_fields() {
    let state = SharedState::new();
    let clock = ManualClock::at(1_000);
    let mut sink = CapturingSink::new();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, ThresholdPolicy::Accept);

    assert_eq!(ing.ingest(b"3, 25, 10, 40", &mut sink), Ok(Reading::new(3, 25, 10, 40)));
    let snap = state.snapshot();
    assert_eq!(snap.reading, Some(Reading::new(3, 25, 10, 40)));
    assert_eq!(snap.reading_at_ms, 1_000);
    assert_eq!(sink.events, vec![AppEvent::ReadingAccepted(Reading::new(3, 25, 10, 40))]);
}

#[test]
fn short_message_leaves_reading_unchanged() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, ThresholdPolicy::Accept);

    ing.ingest(b"5, 10, 2, 8", &mut sink).unwrap();
    clock.advance(500);
    assert_eq!(ing.ingest(b"3, 7", &mut sink), Err(ParseError::IncompleteFields));
    assert_eq!(ing.ingest(b"", &mut sink), Err(ParseError::Empty));
    assert_eq!(ing.ingest(b"3, x, 1, 2", &mut sink), Err(ParseError::Malformed));

    let snap = state.snapshot();
    assert_eq!(snap.reading, Some(Reading::new(5, 10, 2, 8)));
    assert_eq!(snap.reading_at_ms, 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ReadingRejected(_))), 3);
}

#[test]
fn uart_stream_through_framer_into_state() {
    let state = SharedState::new();
    let clock = ManualClock::at(10);
    let mut sink = CapturingSink::new();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wired, ThresholdPolicy::Accept);
    let mut framer = LineFramer::new();

    let mut cmds = Vec::new();
    framer.on_read(b"LED ON\r1, 40, 10, 5", |c| cmds.push(c));
    framer.on_read(b"0\r", |c| cmds.push(c));
    for cmd in cmds {
        ing.handle(cmd, &mut sink);
    }

    let snap = state.snapshot();
    assert_eq!(snap.connection, ConnectionState::Connected(WIRED_HANDLE));
    assert_eq!(snap.reading, Some(Reading::new(1, 40, 10, 50)));
    assert_eq!(
        sink.events,
        vec![
            AppEvent::ReadingRejected(ParseError::Malformed),
            AppEvent::LinkUp(WIRED_HANDLE),
            AppEvent::ReadingAccepted(Reading::new(1, 40, 10, 50)),
        ]
    );
}

#[test]
fn ble_session_connect_write_disconnect() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, ThresholdPolicy::Swap);

    ing.handle(LinkCommand::Connected(4), &mut sink);
    clock.advance(100);
    ing.handle(classify_write(b"1, 8, 10, 5"), &mut sink);
    assert_eq!(state.snapshot().reading, Some(Reading::new(1, 8, 5, 10)));

    clock.advance(5_000);
    ing.handle(classify_write(b"  "), &mut sink);
    let snap = state.snapshot();
    assert_eq!(snap.activity_at_ms, 5_100);
    assert_eq!(snap.reading_at_ms, 100);

    ing.handle(LinkCommand::Disconnected, &mut sink);
    let snap = state.snapshot();
    assert_eq!(snap.connection, ConnectionState::Disconnected);
    assert!(snap.reading.is_none());
    assert_eq!(sink.events.last(), Some(&AppEvent::LinkDown));
}

#[test]
fn overflow_is_reported_and_harmless() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wired, ThresholdPolicy::Accept);

    ing.handle(LinkCommand::from_bytes(b"1, 2, 3, 4"), &mut sink);
    ing.handle(LinkCommand::Overflow, &mut sink);
    assert_eq!(state.snapshot().reading, Some(Reading::new(1, 2, 3, 4)));
    assert_eq!(sink.events.last(), Some(&AppEvent::TransportOverflow));
}

#[test]
fn newest_reading_wins_after_queue_backlog() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, ThresholdPolicy::Swap);

    events::drain(|_| {});
    for d in 1..=(events::INBOUND_DEPTH as i32 + 1) {
        assert!(events::push(LinkCommand::from_bytes(format!("0, {d}, 20, 50").as_bytes())));
    }
    events::drain(|cmd| ing.handle(cmd, &mut sink));

    let newest = events::INBOUND_DEPTH as i32 + 1;
    assert_eq!(state.snapshot().reading, Some(Reading::new(0, newest, 20, 50)));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ReadingAccepted(_))), events::INBOUND_DEPTH);
}
