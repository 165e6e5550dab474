//! EyeCan alert firmware library.
//!
//! Distance readings arrive over UART or BLE, are parsed by the ingestor
//! into one shared slot, and a pattern engine turns the latest slot into
//! an indicator pattern. Everything except the transports and the pin is
//! pure logic and runs on the host. ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod events;
pub mod fsm;
pub mod reading;
pub mod scheduler;
pub mod state;

mod esp_link_shims;
