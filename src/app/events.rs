//! Outbound application events.
//!
//! The [`Ingestor`](super::ingest::Ingestor) and
//! [`AlertService`](super::service::AlertService) emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them: log to serial, bump diagnostics counters,
//! refresh the BLE status characteristic.

use crate::error::ParseError;
use crate::fsm::AlertPattern;
use crate::reading::Reading;
use crate::state::ConnectionState;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The alert engine has started.
    Started,

    /// The engine switched patterns. `from` is `None` on the first tick.
    PatternChanged {
        from: Option<AlertPattern>,
        to: AlertPattern,
    },

    /// A message parsed and was published as the latest reading.
    ReadingAccepted(Reading),

    /// A message was discarded; the latest reading is unchanged.
    ReadingRejected(ParseError),

    /// The peer attached.
    LinkUp(u16),

    /// The transport reported the peer gone.
    LinkDown,

    /// The peer went silent for longer than the link timeout.
    LinkTimedOut,

    /// The latest reading aged out and was cleared.
    ReadingExpired,

    /// The transport dropped an oversized message.
    TransportOverflow,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The alert engine loop has exited.
    Stopped,
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryData {
    pub pattern: AlertPattern,
    pub connection: ConnectionState,
    pub reading: Option<Reading>,
    /// Indicator level after the tick that produced this report.
    pub level: bool,
}
