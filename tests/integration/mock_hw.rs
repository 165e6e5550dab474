//! Mock adapters for integration tests.
//!
//! Records every indicator write so tests can assert on the full level
//! history without touching real GPIO registers.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use eyecan::app::events::AppEvent;
use eyecan::app::ports::{ActuatorPort, ClockPort, EventSink};
use eyecan::scheduler::{Pacer, StopSignal};

// ── MockIndicator ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockIndicator {
    pub levels: Vec<bool>,
    level: bool,
}

#[allow(dead_code)]
impl MockIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the driven level actually changed.
    pub fn edges(&self) -> usize {
        let mut prev = false;
        let mut edges = 0;
        for &l in &self.levels {
            if l != prev {
                edges += 1;
            }
            prev = l;
        }
        edges
    }
}

impl ActuatorPort for MockIndicator {
    fn set_level(&mut self, on: bool) {
        self.level = on;
        self.levels.push(on);
    }

    fn level(&self) -> bool {
        self.level
    }
}

// ── ManualClock ───────────────────────────────────────────────

#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ── RecordingPacer ────────────────────────────────────────────

/// Advances the manual clock by each requested pause instead of sleeping,
/// and raises `stop` after `budget` pauses.
pub struct RecordingPacer<'a> {
    pub clock: &'a ManualClock,
    pub stop: &'a StopSignal,
    pub pauses: &'a RefCell<Vec<Duration>>,
    pub budget: usize,
}

impl Pacer for RecordingPacer<'_> {
    fn pause(&mut self, interval: Duration) {
        self.pauses.borrow_mut().push(interval);
        self.clock.advance(interval.as_millis() as u64);
        if self.pauses.borrow().len() >= self.budget {
            self.stop.request_stop();
        }
    }
}

// ── CapturingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct CapturingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl CapturingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn pattern_changes(&self) -> Vec<AppEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::PatternChanged { .. }))
            .copied()
            .collect()
    }
}

impl EventSink for CapturingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
