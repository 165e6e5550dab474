//! Port traits (the hexagonal boundary between domain logic and the outside world).
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Ingestor / AlertService (domain)
//! ```
//!
//! Driven adapters (indicator pin, clock, event sinks) implement these
//! traits. The domain consumes them via generics, so the alert logic never
//! touches hardware directly and runs unchanged against host mocks.

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port for the single alert indicator.
pub trait ActuatorPort {
    /// Drive the indicator on (`true`) or off (`false`).
    fn set_level(&mut self, on: bool);

    /// Level most recently driven. Blink patterns toggle from this.
    fn level(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot. Used to stamp readings and link
/// activity; never needs wall-clock time.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

impl<T: ClockPort + ?Sized> ClockPort for &T {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, counters,
/// the BLE status characteristic).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &super::events::AppEvent) {}
}
