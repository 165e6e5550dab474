//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART0 / USB-CDC in production), one
//! tagged line per event. Optionally feeds a shared [`Diagnostics`].

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::diagnostics::Diagnostics;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink<'a> {
    diagnostics: Option<&'a Diagnostics>,
}

impl<'a> LogEventSink<'a> {
    pub fn new() -> Self {
        Self { diagnostics: None }
    }

    /// Also count every event in `diagnostics`.
    pub fn with_diagnostics(diagnostics: &'a Diagnostics) -> Self {
        Self {
            diagnostics: Some(diagnostics),
        }
    }
}

impl EventSink for LogEventSink<'_> {
    fn emit(&mut self, event: &AppEvent) {
        if let Some(diag) = self.diagnostics {
            diag.record(event);
        }
        match event {
            AppEvent::Telemetry(t) => {
                let out = if t.level { "ON" } else { "OFF" };
                match t.reading {
                    Some(r) => info!(
                        "TELEM | pattern={:?} | link={:?} | reading={} | out={}",
                        t.pattern, t.connection, r, out
                    ),
                    None => info!(
                        "TELEM | pattern={:?} | link={:?} | reading=unset | out={}",
                        t.pattern, t.connection, out
                    ),
                }
                if let Some(diag) = self.diagnostics {
                    let d = diag.snapshot();
                    info!(
                        "DIAG  | ok={} rejected={} overflow={} drops={} expired={} changes={}",
                        d.accepted, d.rejected, d.overflows, d.link_drops, d.expiries, d.pattern_changes
                    );
                }
            }
            AppEvent::PatternChanged { from, to } => match from {
                Some(from) => info!("PATTERN | {:?} -> {:?}", from, to),
                None => info!("PATTERN | (start) -> {:?}", to),
            },
            AppEvent::ReadingAccepted(r) => {
                info!(
                    "READING | signal={} dist={} near={} far={}",
                    r.signal, r.distance, r.near_threshold, r.far_threshold
                );
            }
            AppEvent::ReadingRejected(e) => {
                warn!("REJECT | {}", e);
            }
            AppEvent::LinkUp(handle) => {
                info!("LINK | up, handle={}", handle);
            }
            AppEvent::LinkDown => {
                info!("LINK | down");
            }
            AppEvent::LinkTimedOut => {
                warn!("LINK | timed out");
            }
            AppEvent::ReadingExpired => {
                info!("READING | expired");
            }
            AppEvent::TransportOverflow => {
                warn!("LINK | receive overflow");
            }
            AppEvent::Started => {
                info!("START | alert engine running");
            }
            AppEvent::Stopped => {
                info!("STOP | alert engine halted");
            }
        }
    }
}
