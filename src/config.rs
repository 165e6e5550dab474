//! System configuration parameters
//!
//! All tunable parameters for the EyeCan alert controller. Defaults match
//! the behaviour of the deployed firmware; the binary can override them
//! at build time with an `EYECAN_CONFIG_JSON` blob.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Which transport feeds readings into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkMode {
    /// UART from the companion computer. No connect/disconnect events; the
    /// link counts as up once the first reading parses.
    Wired,
    /// BLE GATT writes with explicit connect/disconnect events.
    Wireless,
}

/// What to do with a reading whose near threshold lies beyond its far one.
///
/// The deployed producers send the outer threshold first
/// (`"1, 8, 10, 5"`), so `Swap` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// Publish as received. Only correct for producers that send the
    /// inner threshold first.
    Accept,
    /// Drop the message with `ParseError::InvertedThresholds`.
    Reject,
    /// Publish with near/far exchanged.
    Swap,
}

/// Pacing table for the pattern engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Poll interval while the link is down (indicator held on).
    pub no_connection_interval_ms: u32,
    /// Poll interval while clear (indicator held off).
    pub clear_interval_ms: u32,
    /// Caution toggles once per period.
    pub blink_period_ms: u32,
    /// Urgent toggles every `blink_period_ms / urgent_divisor`.
    pub urgent_divisor: u32,
}

impl CadenceConfig {
    pub fn caution_interval_ms(&self) -> u32 {
        self.blink_period_ms
    }

    pub fn urgent_interval_ms(&self) -> u32 {
        self.blink_period_ms / self.urgent_divisor.max(1)
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            no_connection_interval_ms: 100,
            clear_interval_ms: 50,
            blink_period_ms: 1000,
            urgent_divisor: 4,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    // --- Link ---
    pub link_mode: LinkMode,
    /// Advertised BLE name (wireless mode).
    pub device_name: heapless::String<24>,
    /// UART baud rate (wired mode).
    pub uart_baud: u32,
    /// Expected keep-alive period of the remote peer.
    pub heartbeat_interval_ms: u32,
    /// Drop the link after this long without data or heartbeat.
    /// `None` keeps the link up until the transport says otherwise.
    pub link_timeout_ms: Option<u32>,

    // --- Readings ---
    pub threshold_policy: ThresholdPolicy,
    /// Forget a reading that has not been refreshed for this long.
    /// `None` keeps the last reading until it is overwritten.
    pub stale_after_ms: Option<u32>,

    // --- Timing ---
    pub cadence: CadenceConfig,
    /// Telemetry report interval (milliseconds of engine time).
    pub telemetry_interval_ms: u32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        // Fits: 17 bytes into 24.
        let _ = device_name.push_str("BLE-Server-EyeCan");
        Self {
            link_mode: LinkMode::Wireless,
            device_name,
            uart_baud: 115_200,
            heartbeat_interval_ms: 5_000,
            link_timeout_ms: None,

            threshold_policy: ThresholdPolicy::Swap,
            stale_after_ms: None,

            cadence: CadenceConfig::default(),
            telemetry_interval_ms: 60_000,
        }
    }
}

impl AlertConfig {
    /// Range-check every field. Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), Error> {
        let c = &self.cadence;
        if c.no_connection_interval_ms == 0 || c.clear_interval_ms == 0 {
            return Err(Error::Config("poll intervals must be non-zero"));
        }
        if c.blink_period_ms == 0 {
            return Err(Error::Config("blink period must be non-zero"));
        }
        if c.urgent_divisor == 0 || c.urgent_divisor > c.blink_period_ms {
            return Err(Error::Config("urgent divisor must be in 1..=blink period"));
        }
        if self.telemetry_interval_ms == 0 {
            return Err(Error::Config("telemetry interval must be non-zero"));
        }
        if self.uart_baud == 0 {
            return Err(Error::Config("uart baud must be non-zero"));
        }
        if self.device_name.is_empty() {
            return Err(Error::Config("device name must not be empty"));
        }
        if let Some(timeout) = self.link_timeout_ms {
            if timeout <= self.heartbeat_interval_ms {
                return Err(Error::Config("link timeout must exceed heartbeat interval"));
            }
        }
        if self.stale_after_ms == Some(0) {
            return Err(Error::Config("stale_after_ms must be non-zero"));
        }
        Ok(())
    }

    /// Parse a JSON override (missing fields take their defaults) and
    /// validate it.
    pub fn from_json(raw: &[u8]) -> Result<Self, Error> {
        let config: Self =
            serde_json::from_slice(raw).map_err(|_| Error::Config("invalid config JSON"))?;
        config.validate()?;
        Ok(config)
    }
}
