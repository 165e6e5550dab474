//! Alert pattern state machine.
//!
//! Classic embedded table-driven FSM, reduced to what an indicator needs:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  PatternTable                                                │
//! │  ┌──────────────┬───────────┬──────────┬──────────────────┐  │
//! │  │ AlertPattern │ on_enter  │ on_tick  │ interval         │  │
//! │  ├──────────────┼───────────┼──────────┼──────────────────┤  │
//! │  │ NoConnection │ (none)    │ hold on  │ 100 ms           │  │
//! │  │ Clear        │ (none)    │ hold off │  50 ms           │  │
//! │  │ Urgent       │ go dark   │ toggle   │ period / 4       │  │
//! │  │ Caution      │ go dark   │ toggle   │ period           │  │
//! │  └──────────────┴───────────┴──────────┴──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unlike a sensor FSM, the next state is not chosen by the current
//! state's handler: it is re-derived from scratch every tick by
//! [`classify`], so a fresh reading takes effect on the very next tick
//! instead of after a blink sequence finishes. The engine itself only
//! remembers which pattern it drove last, to run `on_enter` and report
//! transitions once.

pub mod context;
pub mod states;

use context::DriveContext;
use log::info;
use serde::Serialize;

use crate::config::CadenceConfig;
use crate::reading::Reading;
use crate::state::{ConnectionState, LinkSnapshot};

// ---------------------------------------------------------------------------
// Pattern identity
// ---------------------------------------------------------------------------

/// Indicator behaviour, in decreasing urgency of the link problem.
/// Must stay in sync with the table built in [`states::build_pattern_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum AlertPattern {
    /// Link down: indicator solid on.
    NoConnection = 0,
    /// Nothing close (or nothing known): indicator off.
    Clear = 1,
    /// Within the near threshold: fast blink.
    Urgent = 2,
    /// Between near and far thresholds: slow blink.
    Caution = 3,
}

impl AlertPattern {
    /// Total number of patterns, used to size the table array.
    pub const COUNT: usize = 4;

    /// Convert a table index back to `AlertPattern`. Out-of-range indices
    /// fall back to `NoConnection`, the most conspicuous output.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            1 => Self::Clear,
            2 => Self::Urgent,
            3 => Self::Caution,
            0 => Self::NoConnection,
            _ => {
                debug_assert!(false, "invalid pattern index: {idx}");
                Self::NoConnection
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Pick the pattern for a link state and reading. First match wins:
///
/// 1. link down → `NoConnection`
/// 2. no reading, distance unset, far threshold unset, or beyond far → `Clear`
/// 3. at or inside near → `Urgent`
/// 4. otherwise (inside far) → `Caution`
pub fn classify(connection: ConnectionState, reading: Option<&Reading>) -> AlertPattern {
    if connection == ConnectionState::Disconnected {
        return AlertPattern::NoConnection;
    }
    let Some(r) = reading else {
        return AlertPattern::Clear;
    };
    if !r.has_distance() || !r.has_far_threshold() || r.distance > r.far_threshold {
        AlertPattern::Clear
    } else if r.distance <= r.near_threshold {
        AlertPattern::Urgent
    } else {
        AlertPattern::Caution
    }
}

/// [`classify`] over a whole snapshot.
pub fn classify_snapshot(snapshot: &LinkSnapshot) -> AlertPattern {
    classify(snapshot.connection, snapshot.reading.as_ref())
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Runs once when a pattern becomes active.
pub type PatternActionFn = fn(&mut DriveContext);

/// Runs every tick while the pattern is active; decides the output level.
pub type PatternTickFn = fn(&mut DriveContext);

/// Picks the pause after a tick of this pattern.
pub type PatternIntervalFn = fn(&CadenceConfig) -> u32;

// ---------------------------------------------------------------------------
// Pattern descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single pattern.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct PatternDescriptor {
    pub id: AlertPattern,
    pub name: &'static str,
    pub on_enter: Option<PatternActionFn>,
    pub on_tick: PatternTickFn,
    pub interval: PatternIntervalFn,
}

/// What one engine step decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    pub pattern: AlertPattern,
    /// Set on the first tick of a new pattern; `from` is `None` on the
    /// very first tick after start.
    pub transition: Option<(Option<AlertPattern>, AlertPattern)>,
    /// Output level the indicator should be driven to.
    pub level: bool,
    /// Pause before the next tick.
    pub interval_ms: u32,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct PatternEngine {
    /// Fixed-size table indexed by `AlertPattern as usize`.
    table: [PatternDescriptor; AlertPattern::COUNT],
    cadence: CadenceConfig,
    /// Pattern driven on the previous tick.
    current: Option<usize>,
    tick_count: u64,
    pattern_entry_tick: u64,
}

impl PatternEngine {
    pub fn new(table: [PatternDescriptor; AlertPattern::COUNT], cadence: CadenceConfig) -> Self {
        Self {
            table,
            cadence,
            current: None,
            tick_count: 0,
            pattern_entry_tick: 0,
        }
    }

    /// Engine with the standard pattern table.
    pub fn with_cadence(cadence: CadenceConfig) -> Self {
        Self::new(states::build_pattern_table(), cadence)
    }

    /// Drive one tick of `pattern`, starting from the indicator's current
    /// `level`.
    pub fn step(&mut self, pattern: AlertPattern, level: bool) -> StepOutcome {
        self.tick_count += 1;
        let next_idx = pattern as usize;

        let transition = if self.current == Some(next_idx) {
            None
        } else {
            let from = self.current.map(AlertPattern::from_index);
            info!(
                "Pattern: {} -> {}",
                from.map_or("(start)", |p| self.table[p as usize].name),
                self.table[next_idx].name
            );
            self.current = Some(next_idx);
            self.pattern_entry_tick = self.tick_count;
            Some((from, pattern))
        };

        let descriptor = &self.table[next_idx];
        let mut ctx = DriveContext { level };
        if transition.is_some() {
            if let Some(enter) = descriptor.on_enter {
                enter(&mut ctx);
            }
        }
        (descriptor.on_tick)(&mut ctx);

        StepOutcome {
            pattern,
            transition,
            level: ctx.level,
            interval_ms: (descriptor.interval)(&self.cadence),
        }
    }

    /// Pattern driven on the last tick, if any.
    pub fn current_pattern(&self) -> Option<AlertPattern> {
        self.current.map(AlertPattern::from_index)
    }

    pub fn pattern_name(&self, pattern: AlertPattern) -> &'static str {
        self.table[pattern as usize].name
    }

    /// Ticks spent in the current pattern (0 on its first tick).
    pub fn ticks_in_current_pattern(&self) -> u64 {
        self.tick_count - self.pattern_entry_tick
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Forget the last pattern so the next step reports a fresh start.
    pub fn reset(&mut self) {
        self.current = None;
        self.pattern_entry_tick = self.tick_count;
    }
}
