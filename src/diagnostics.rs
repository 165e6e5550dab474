//! Runtime diagnostics.
//!
//! Lock-free counters fed from [`AppEvent`]s, plus heap figures collected
//! on demand. The log sink records every event here and prints a snapshot
//! alongside each telemetry line.

use core::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;

use crate::app::events::AppEvent;

/// Event counters. All methods take `&self`; share one instance between
/// the ingest and engine sinks.
#[derive(Debug, Default)]
pub struct Diagnostics {
    accepted: AtomicU32,
    rejected: AtomicU32,
    overflows: AtomicU32,
    link_drops: AtomicU32,
    expiries: AtomicU32,
    pattern_changes: AtomicU32,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSnapshot {
    pub accepted: u32,
    pub rejected: u32,
    pub overflows: u32,
    /// Disconnects plus link timeouts.
    pub link_drops: u32,
    pub expiries: u32,
    pub pattern_changes: u32,
}

impl Diagnostics {
    pub const fn new() -> Self {
        Self {
            accepted: AtomicU32::new(0),
            rejected: AtomicU32::new(0),
            overflows: AtomicU32::new(0),
            link_drops: AtomicU32::new(0),
            expiries: AtomicU32::new(0),
            pattern_changes: AtomicU32::new(0),
        }
    }

    pub fn record(&self, event: &AppEvent) {
        let counter = match event {
            AppEvent::ReadingAccepted(_) => &self.accepted,
            AppEvent::ReadingRejected(_) => &self.rejected,
            AppEvent::TransportOverflow => &self.overflows,
            AppEvent::LinkDown | AppEvent::LinkTimedOut => &self.link_drops,
            AppEvent::ReadingExpired => &self.expiries,
            AppEvent::PatternChanged { .. } => &self.pattern_changes,
            AppEvent::Started
            | AppEvent::LinkUp(_)
            | AppEvent::Telemetry(_)
            | AppEvent::Stopped => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            link_drops: self.link_drops.load(Ordering::Relaxed),
            expiries: self.expiries.load(Ordering::Relaxed),
            pattern_changes: self.pattern_changes.load(Ordering::Relaxed),
        }
    }
}

/// Heap figures collected on demand.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RuntimeMetrics {
    pub uptime_secs: u64,
    pub heap_free: u32,
    pub heap_min_free: u32,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect(uptime_secs: u64) -> Self {
        use esp_idf_svc::sys::*;
        let heap_free = unsafe { esp_get_free_heap_size() };
        let heap_min_free = unsafe { esp_get_minimum_free_heap_size() };
        Self {
            uptime_secs,
            heap_free,
            heap_min_free,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(uptime_secs: u64) -> Self {
        // Synthetic figures so simulation exercises the same report path.
        let heap_free: u32 = 180_224;
        Self {
            uptime_secs,
            heap_free,
            heap_min_free: heap_free - 16_384,
        }
    }
}

/// Install a panic hook that logs the reason before the default handler
/// resets the chip. The indicator is left as it was; the watchdog reboot
/// brings it back up in `NoConnection`.
pub fn install_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        match info.location() {
            Some(loc) => log::error!("PANIC: {} at {}:{}", reason, loc.file(), loc.line()),
            None => log::error!("PANIC: {}", reason),
        }
    }));
}
