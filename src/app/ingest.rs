//! Reading ingestor: the only writer of the shared reading slot.
//!
//! ```text
//!  UART / BLE ──LinkCommand──▶ Ingestor ──publish / connect / disconnect──▶ SharedState
//!                                 │
//!                                 └──▶ EventSink (accepted / rejected / link)
//! ```
//!
//! A message either parses completely and replaces the slot, or it is
//! logged and dropped with the slot untouched.

use log::{debug, info, warn};

use crate::config::{LinkMode, ThresholdPolicy};
use crate::error::ParseError;
use crate::reading::{parse_reading, Reading};
use crate::state::{SharedState, WIRED_HANDLE};

use super::commands::LinkCommand;
use super::events::AppEvent;
use super::ports::{ClockPort, EventSink};

pub struct Ingestor<'a, C: ClockPort> {
    state: &'a SharedState,
    clock: C,
    link_mode: LinkMode,
    policy: ThresholdPolicy,
}

impl<'a, C: ClockPort> Ingestor<'a, C> {
    pub fn new(state: &'a SharedState, clock: C, link_mode: LinkMode, policy: ThresholdPolicy) -> Self {
        Self {
            state,
            clock,
            link_mode,
            policy,
        }
    }

    /// Parse one message and, on success, publish it as the latest reading.
    ///
    /// In wired mode the first accepted reading also brings the link up.
    pub fn ingest(&mut self, raw: &[u8], sink: &mut impl EventSink) -> Result<Reading, ParseError> {
        let reading = match parse_reading(raw).and_then(|r| self.apply_policy(r)) {
            Ok(r) => r,
            Err(e) => {
                warn!("Ingest: dropped message ({}), {} bytes", e, raw.len());
                sink.emit(&AppEvent::ReadingRejected(e));
                return Err(e);
            }
        };

        let now = self.clock.now_ms();
        match self.link_mode {
            LinkMode::Wired => {
                if self.state.publish_connected(reading, WIRED_HANDLE, now) {
                    info!("Ingest: wired link up");
                    sink.emit(&AppEvent::LinkUp(WIRED_HANDLE));
                }
            }
            LinkMode::Wireless => {
                if let Some(handle) = self.state.publish(reading, now) {
                    Self::report_resumed(handle, sink);
                }
            }
        }
        debug!("Ingest: reading {}", reading);
        sink.emit(&AppEvent::ReadingAccepted(reading));
        Ok(reading)
    }

    /// Apply one transport command to the shared state.
    pub fn handle(&mut self, cmd: LinkCommand, sink: &mut impl EventSink) {
        match cmd {
            LinkCommand::Data(payload) => {
                // Rejections are already logged and reported by `ingest`.
                let _ = self.ingest(&payload, sink);
            }
            LinkCommand::Connected(handle) => {
                if self.link_mode == LinkMode::Wired {
                    debug!("Ingest: ignoring connect event on wired link");
                    return;
                }
                self.state.connect(handle, self.clock.now_ms());
                info!("Ingest: link up (handle {})", handle);
                sink.emit(&AppEvent::LinkUp(handle));
            }
            LinkCommand::Disconnected => {
                if self.link_mode == LinkMode::Wired {
                    debug!("Ingest: ignoring disconnect event on wired link");
                    return;
                }
                self.state.disconnect();
                info!("Ingest: link down, reading cleared");
                sink.emit(&AppEvent::LinkDown);
            }
            LinkCommand::Heartbeat => {
                debug!("Ingest: heartbeat");
                if let Some(handle) = self.state.touch(self.clock.now_ms()) {
                    Self::report_resumed(handle, sink);
                }
            }
            LinkCommand::Overflow => {
                warn!("Ingest: transport overflow, partial message discarded");
                sink.emit(&AppEvent::TransportOverflow);
            }
        }
    }

    fn report_resumed(handle: u16, sink: &mut impl EventSink) {
        info!("Ingest: link {} active again after timeout", handle);
        sink.emit(&AppEvent::LinkUp(handle));
    }

    fn apply_policy(&self, reading: Reading) -> Result<Reading, ParseError> {
        if !reading.thresholds_inverted() {
            return Ok(reading);
        }
        match self.policy {
            ThresholdPolicy::Accept => Ok(reading),
            ThresholdPolicy::Reject => Err(ParseError::InvertedThresholds),
            ThresholdPolicy::Swap => Ok(reading.with_thresholds_swapped()),
        }
    }
}
