//! The shared "latest reading + link" slot.
//!
//! Written by the ingest task, read by the pattern engine. Both sides go
//! through one blocking mutex holding a `Copy` snapshot, so the engine
//! can never see a reading whose fields come from two different messages,
//! and a link reset clears the reading in the same critical section.
//!
//! ```text
//!  Ingestor ──publish/connect/disconnect──▶ SharedState ──snapshot──▶ AlertService
//!                                              ▲
//!                       expire / time out ─────┘  (engine-side resets)
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::reading::Reading;

/// Connection handle reported for the wired link, which has no real one.
pub const WIRED_HANDLE: u16 = 0;

/// Whether the perception unit is currently attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected(u16),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }
}

/// A consistent view of everything the engine decides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub connection: ConnectionState,
    /// `None` until the first message parses, and again after a reset.
    pub reading: Option<Reading>,
    /// Clock time the current reading was published.
    pub reading_at_ms: u64,
    /// Clock time of the last data, heartbeat or connect from the peer.
    pub activity_at_ms: u64,
    /// Handle of a link dropped for silence while the transport still
    /// holds it. Fresh activity on that link brings it back up.
    pub idle_handle: Option<u16>,
}

impl LinkSnapshot {
    pub const INITIAL: Self = Self {
        connection: ConnectionState::Disconnected,
        reading: None,
        reading_at_ms: 0,
        activity_at_ms: 0,
        idle_handle: None,
    };

    fn resume_idle_link(&mut self) -> Option<u16> {
        let handle = self.idle_handle.take()?;
        self.connection = ConnectionState::Connected(handle);
        Some(handle)
    }
}

/// The one shared slot. Inject a reference into both tasks.
pub struct SharedState {
    inner: Mutex<CriticalSectionRawMutex, Cell<LinkSnapshot>>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(LinkSnapshot::INITIAL)),
        }
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        self.inner.lock(Cell::get)
    }

    /// Replace the reading wholesale. Returns the handle if this brought a
    /// timed-out link back up.
    pub fn publish(&self, reading: Reading, now_ms: u64) -> Option<u16> {
        self.update(|s| {
            s.reading = Some(reading);
            s.reading_at_ms = now_ms;
            s.activity_at_ms = now_ms;
            s.resume_idle_link()
        })
    }

    /// Mark the link up with `handle` and publish `reading`, in one
    /// critical section. Returns `true` if the link was down before.
    pub fn publish_connected(&self, reading: Reading, handle: u16, now_ms: u64) -> bool {
        self.update(|s| {
            let was_down = !s.connection.is_connected();
            s.connection = ConnectionState::Connected(handle);
            s.idle_handle = None;
            s.reading = Some(reading);
            s.reading_at_ms = now_ms;
            s.activity_at_ms = now_ms;
            was_down
        })
    }

    /// Mark the link up. A new handle starts with no reading.
    pub fn connect(&self, handle: u16, now_ms: u64) {
        self.update(|s| {
            if s.connection != ConnectionState::Connected(handle) {
                s.reading = None;
            }
            s.connection = ConnectionState::Connected(handle);
            s.idle_handle = None;
            s.activity_at_ms = now_ms;
        });
    }

    /// Mark the link down and forget the reading.
    pub fn disconnect(&self) {
        self.update(|s| {
            s.connection = ConnectionState::Disconnected;
            s.idle_handle = None;
            s.reading = None;
        });
    }

    /// Record peer activity without touching the reading. Returns the
    /// handle if this brought a timed-out link back up.
    pub fn touch(&self, now_ms: u64) -> Option<u16> {
        self.update(|s| {
            s.activity_at_ms = now_ms;
            s.resume_idle_link()
        })
    }

    /// Clear the reading only if it was published before `cutoff_ms`.
    /// Returns `true` if something was cleared.
    pub fn expire_reading_before(&self, cutoff_ms: u64) -> bool {
        self.update(|s| {
            if s.reading.is_some() && s.reading_at_ms < cutoff_ms {
                s.reading = None;
                true
            } else {
                false
            }
        })
    }

    /// Disconnect only if the link is up and has been silent since before
    /// `cutoff_ms`. Returns `true` if the link was dropped.
    pub fn disconnect_if_idle_before(&self, cutoff_ms: u64) -> bool {
        self.update(|s| {
            if let ConnectionState::Connected(handle) = s.connection {
                if s.activity_at_ms < cutoff_ms {
                    s.connection = ConnectionState::Disconnected;
                    s.idle_handle = Some(handle);
                    s.reading = None;
                    return true;
                }
            }
            false
        })
    }

    fn update<R>(&self, f: impl FnOnce(&mut LinkSnapshot) -> R) -> R {
        self.inner.lock(|cell| {
            let mut snapshot = cell.get();
            let out = f(&mut snapshot);
            cell.set(snapshot);
            out
        })
    }
}
