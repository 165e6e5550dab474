//! Alert service: the pattern engine loop.
//!
//! [`AlertService`] owns the pattern FSM and the liveness policy. Each
//! tick it takes one consistent snapshot of the shared slot, picks a
//! pattern, drives the indicator and hands back the pause before the
//! next tick. All I/O flows through port traits injected at call sites.
//!
//! ```text
//!  SharedState ──snapshot──▶ ┌────────────────────────┐ ──▶ EventSink
//!                            │      AlertService      │
//!   ClockPort ──now_ms────▶  │ expiry · classify · FSM│
//!                            └───────────┬────────────┘
//!                                        ▼
//!                                  ActuatorPort
//! ```

use core::time::Duration;

use log::{info, warn};

use crate::config::{AlertConfig, LinkMode};
use crate::fsm::{classify_snapshot, AlertPattern, PatternEngine};
use crate::scheduler::{Pacer, StopSignal, TickScheduler};
use crate::state::{LinkSnapshot, SharedState};

use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ClockPort, EventSink};

// ───────────────────────────────────────────────────────────────
// AlertService
// ───────────────────────────────────────────────────────────────

pub struct AlertService {
    engine: PatternEngine,
    config: AlertConfig,
    tick_count: u64,
    /// Sum of the pauses requested so far.
    engine_time_ms: u64,
    last_telemetry_ms: u64,
}

impl AlertService {
    /// Construct the service from configuration.
    ///
    /// Does **not** emit anything. Call [`start`](Self::start) next.
    pub fn new(config: AlertConfig) -> Self {
        Self {
            engine: PatternEngine::with_cadence(config.cadence),
            config,
            tick_count: 0,
            engine_time_ms: 0,
            last_telemetry_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.engine.reset();
        sink.emit(&AppEvent::Started);
        info!(
            "AlertService started ({:?} link, blink period {} ms)",
            self.config.link_mode, self.config.cadence.blink_period_ms
        );
    }

    /// Tick until `stop` is raised, pausing through `pacer`. Emits
    /// [`AppEvent::Stopped`] on exit and returns the number of ticks run.
    pub fn run<P: Pacer>(
        &mut self,
        state: &SharedState,
        hw: &mut impl ActuatorPort,
        clock: &impl ClockPort,
        pacer: P,
        sink: &mut impl EventSink,
        stop: &StopSignal,
    ) -> u64 {
        let mut scheduler = TickScheduler::new(pacer);
        let ticks = scheduler.run(stop, || self.tick(state, &mut *hw, clock, &mut *sink));
        sink.emit(&AppEvent::Stopped);
        info!("AlertService stopped after {} ticks", ticks);
        ticks
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one engine cycle: liveness checks → snapshot → classify →
    /// drive indicator. Returns how long to wait before the next tick.
    pub fn tick(
        &mut self,
        state: &SharedState,
        hw: &mut impl ActuatorPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Duration {
        self.tick_count += 1;
        let now = clock.now_ms();

        // 1. Engine-side resets
        self.enforce_liveness(state, now, sink);

        // 2. Snapshot + classify
        let snapshot = state.snapshot();
        let pattern = classify_snapshot(&snapshot);

        // 3. FSM step + actuator
        let out = self.engine.step(pattern, hw.level());
        hw.set_level(out.level);

        if let Some((from, to)) = out.transition {
            sink.emit(&AppEvent::PatternChanged { from, to });
        }

        // 4. Telemetry on engine time
        self.engine_time_ms += u64::from(out.interval_ms);
        if self.engine_time_ms - self.last_telemetry_ms >= u64::from(self.config.telemetry_interval_ms) {
            self.last_telemetry_ms = self.engine_time_ms;
            sink.emit(&AppEvent::Telemetry(Self::build_telemetry(&snapshot, pattern, out.level)));
        }

        Duration::from_millis(u64::from(out.interval_ms))
    }

    fn enforce_liveness(&self, state: &SharedState, now: u64, sink: &mut impl EventSink) {
        if self.config.link_mode == LinkMode::Wireless {
            if let Some(timeout) = self.config.link_timeout_ms {
                let timeout = u64::from(timeout);
                if now >= timeout && state.disconnect_if_idle_before(now - timeout) {
                    warn!("Link silent for over {} ms, dropping", timeout);
                    sink.emit(&AppEvent::LinkTimedOut);
                }
            }
        }
        if let Some(stale) = self.config.stale_after_ms {
            let stale = u64::from(stale);
            if now >= stale && state.expire_reading_before(now - stale) {
                warn!("Reading older than {} ms, cleared", stale);
                sink.emit(&AppEvent::ReadingExpired);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(snapshot: &LinkSnapshot, pattern: AlertPattern, level: bool) -> TelemetryData {
        TelemetryData {
            pattern,
            connection: snapshot.connection,
            reading: snapshot.reading,
            level,
        }
    }

    /// Pattern driven on the last tick (`None` before the first tick).
    pub fn current_pattern(&self) -> Option<AlertPattern> {
        self.engine.current_pattern()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }
}
