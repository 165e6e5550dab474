//! Inbound link command queue.
//!
//! Commands are produced by:
//! - the UART reader thread (one `Data` per framed line, `Overflow`)
//! - BLE GATT callbacks (`Connected`, `Disconnected`, `Data`, `Heartbeat`)
//!
//! and consumed by the ingest task, which applies them to the shared
//! reading slot one at a time, in arrival order.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ UART reader │────▶│   INBOUND    │     │              │
//! │             │     │  (bounded    │────▶│ Ingest task  │
//! │ GATT events │────▶│   channel)   │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```

use std::sync::{Mutex, PoisonError};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use log::warn;

use crate::app::commands::LinkCommand;

/// Maximum number of pending commands.
pub const INBOUND_DEPTH: usize = 8;

/// Transport → ingest task.
pub static INBOUND: Channel<CriticalSectionRawMutex, LinkCommand, INBOUND_DEPTH> = Channel::new();

/// Serialises queue compaction between producers.
static COMPACT_LOCK: Mutex<()> = Mutex::new(());

/// Queue a command without blocking. Used for data and heartbeats.
///
/// If the ingest task is behind, the oldest droppable command is evicted
/// so the newest reading always gets through. Link events are never
/// evicted. Returns `false` only if `cmd` itself could not be queued,
/// which happens when every queued entry is a link event.
pub fn push(cmd: LinkCommand) -> bool {
    match INBOUND.try_send(cmd) {
        Ok(()) => true,
        Err(TrySendError::Full(cmd)) => evict_oldest_then_push(cmd),
    }
}

fn evict_oldest_then_push(cmd: LinkCommand) -> bool {
    let _guard = COMPACT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);

    let mut backlog: heapless::Vec<LinkCommand, INBOUND_DEPTH> = heapless::Vec::new();
    while backlog.len() < INBOUND_DEPTH {
        match INBOUND.try_receive() {
            Ok(queued) => {
                // Cannot fail: the loop stops at capacity.
                let _ = backlog.push(queued);
            }
            Err(_) => break,
        }
    }

    if let Some(idx) = backlog.iter().position(LinkCommand::is_droppable) {
        let evicted = backlog.remove(idx);
        warn!("Inbound queue full, evicted oldest {} command", evicted.kind());
    }

    for queued in backlog {
        if let Err(TrySendError::Full(lost)) = INBOUND.try_send(queued) {
            warn!("Inbound queue full, lost queued {} command", lost.kind());
        }
    }
    match INBOUND.try_send(cmd) {
        Ok(()) => true,
        Err(TrySendError::Full(dropped)) => {
            warn!("Inbound queue full of link events, dropped {} command", dropped.kind());
            false
        }
    }
}

/// Queue a command, waiting for room. Used for connect/disconnect so a
/// link reset is never lost.
pub fn push_blocking(cmd: LinkCommand) {
    futures_lite::future::block_on(INBOUND.send(cmd));
}

/// Wait for the next command. Called from the ingest task only.
pub fn receive_blocking() -> LinkCommand {
    futures_lite::future::block_on(INBOUND.receive())
}

/// Pop the next command if one is pending.
pub fn try_receive() -> Option<LinkCommand> {
    INBOUND.try_receive().ok()
}

/// Drain all pending commands into a callback, in FIFO order.
pub fn drain(mut handler: impl FnMut(LinkCommand)) {
    while let Some(cmd) = try_receive() {
        handler(cmd);
    }
}

/// Number of pending commands.
pub fn pending() -> usize {
    INBOUND.len()
}
