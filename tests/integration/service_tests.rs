//! Integration tests: SharedState → AlertService → indicator.

use std::cell::RefCell;
use std::time::Duration;

use eyecan::app::commands::LinkCommand;
use eyecan::app::events::AppEvent;
use eyecan::app::ingest::Ingestor;
use eyecan::app::ports::{ActuatorPort, ClockPort};
use eyecan::app::service::AlertService;
use eyecan::config::{AlertConfig, LinkMode, ThresholdPolicy};
use eyecan::fsm::AlertPattern;
use eyecan::reading::Reading;
use eyecan::scheduler::StopSignal;
use eyecan::state::SharedState;

use crate::mock_hw::{CapturingSink, ManualClock, MockIndicator, RecordingPacer};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn disconnect_during_urgent_shows_no_connection_next_tick() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut hw = MockIndicator::new();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, ThresholdPolicy::Accept);
    let mut svc = AlertService::new(AlertConfig::default());
    svc.start(&mut sink);

    ing.handle(LinkCommand::Connected(1), &mut sink);
    ing.handle(LinkCommand::from_bytes(b"0, 15, 20, 50"), &mut sink);
    assert_eq!(svc.tick(&state, &mut hw, &clock, &mut sink), ms(250));
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Urgent));

    ing.handle(LinkCommand::Disconnected, &mut sink);
    assert_eq!(svc.tick(&state, &mut hw, &clock, &mut sink), ms(100));
    assert_eq!(svc.current_pattern(), Some(AlertPattern::NoConnection));
    assert!(hw.level());
    assert!(state.snapshot().reading.is_none());
    assert_eq!(
        sink.pattern_changes().last(),
        Some(&AppEvent::PatternChanged {
            from: Some(AlertPattern::Urgent),
            to: AlertPattern::NoConnection
        })
    );
}

#[test]
fn steady_state_logs_once_and_blinks_at_cadence() {
    let state = SharedState::new();
    state.connect(1, 0);
    state.publish(Reading::new(0, 35, 20, 50), 0);
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut hw = MockIndicator::new();
    let mut svc = AlertService::new(AlertConfig::default());

    for _ in 0..6 {
        assert_eq!(svc.tick(&state, &mut hw, &clock, &mut sink), ms(1000));
        assert_eq!(svc.current_pattern(), Some(AlertPattern::Caution));
    }
    assert_eq!(hw.levels, vec![true, false, true, false, true, false]);
    assert_eq!(sink.pattern_changes().len(), 1);
}

#[test]
fn new_reading_takes_effect_on_next_tick() {
    let state = SharedState::new();
    state.connect(1, 0);
    state.publish(Reading::new(0, 5, 20, 50), 0);
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut hw = MockIndicator::new();
    let mut svc = AlertService::new(AlertConfig::default());

    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert!(hw.level());
    state.publish(Reading::new(0, 500, 20, 50), 250);
    assert_eq!(svc.tick(&state, &mut hw, &clock, &mut sink), ms(50));
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Clear));
    assert!(!hw.level());
}

#[test]
fn run_loop_emits_lifecycle_and_telemetry() {
    let state = SharedState::new();
    state.connect(2, 0);
    state.publish(Reading::new(0, 10, 20, 50), 0);
    let clock = ManualClock::at(0);
    let stop = StopSignal::new();
    let pauses = RefCell::new(Vec::new());
    let mut sink = CapturingSink::new();
    let mut hw = MockIndicator::new();
    let config = AlertConfig {
        telemetry_interval_ms: 1_000,
        ..AlertConfig::default()
    };
    let mut svc = AlertService::new(config);

    svc.start(&mut sink);
    let pacer = RecordingPacer {
        clock: &clock,
        stop: &stop,
        pauses: &pauses,
        budget: 8,
    };
    let ticks = svc.run(&state, &mut hw, &clock, pacer, &mut sink, &stop);

    assert_eq!(ticks, 8);
    assert_eq!(clock.now_ms(), 2_000);
    assert!(pauses.borrow().iter().all(|p| *p == ms(250)));
    assert_eq!(sink.events.first(), Some(&AppEvent::Started));
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopped));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Telemetry(_))), 2);
    assert_eq!(hw.edges(), 8);
}

#[test]
fn silent_peer_times_out() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut hw = MockIndicator::new();
    let config = AlertConfig {
        link_timeout_ms: Some(15_000),
        ..AlertConfig::default()
    };
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, config.threshold_policy);
    let mut svc = AlertService::new(config);

    ing.handle(LinkCommand::Connected(9), &mut sink);
    ing.handle(LinkCommand::from_bytes(b"0, 100, 20, 50"), &mut sink);
    clock.set(10_000);
    ing.handle(LinkCommand::Heartbeat, &mut sink);

    clock.set(24_000);
    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Clear));

    clock.set(25_001);
    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert_eq!(svc.current_pattern(), Some(AlertPattern::NoConnection));
    assert_eq!(sink.count(|e| *e == AppEvent::LinkTimedOut), 1);
}

#[test]
fn timed_out_link_recovers_when_peer_resumes() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut hw = MockIndicator::new();
    let config = AlertConfig {
        link_timeout_ms: Some(15_000),
        ..AlertConfig::default()
    };
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, config.threshold_policy);
    let mut svc = AlertService::new(config);

    ing.handle(LinkCommand::Connected(3), &mut sink);
    ing.handle(LinkCommand::from_bytes(b"0, 15, 20, 50"), &mut sink);
    clock.set(16_000);
    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert_eq!(svc.current_pattern(), Some(AlertPattern::NoConnection));

    // The central never detached, so no new connect arrives: data alone
    // has to bring the link back.
    clock.advance(500);
    ing.handle(LinkCommand::from_bytes(b"0, 15, 20, 50"), &mut sink);
    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Urgent));
    assert_eq!(sink.count(|e| *e == AppEvent::LinkUp(3)), 2);

    // Same for a heartbeat after a second timeout.
    clock.advance(20_000);
    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert_eq!(svc.current_pattern(), Some(AlertPattern::NoConnection));
    ing.handle(LinkCommand::Heartbeat, &mut sink);
    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Clear));
    assert_eq!(sink.count(|e| *e == AppEvent::LinkTimedOut), 2);
}

#[test]
fn producer_line_with_outer_threshold_first_is_caution() {
    let state = SharedState::new();
    let clock = ManualClock::at(0);
    let mut sink = CapturingSink::new();
    let mut hw = MockIndicator::new();
    let config = AlertConfig::default();
    let mut ing = Ingestor::new(&state, &clock, LinkMode::Wireless, config.threshold_policy);
    let mut svc = AlertService::new(config);

    ing.handle(LinkCommand::Connected(1), &mut sink);
    ing.handle(LinkCommand::from_bytes(b"1, 8, 10, 5\r"), &mut sink);
    assert_eq!(svc.tick(&state, &mut hw, &clock, &mut sink), ms(1000));
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Caution));

    ing.handle(LinkCommand::from_bytes(b"1, 3, 10, 5\r"), &mut sink);
    assert_eq!(svc.tick(&state, &mut hw, &clock, &mut sink), ms(250));
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Urgent));

    ing.handle(LinkCommand::from_bytes(b"0, 12, 10, 5\r"), &mut sink);
    svc.tick(&state, &mut hw, &clock, &mut sink);
    assert_eq!(svc.current_pattern(), Some(AlertPattern::Clear));
}
