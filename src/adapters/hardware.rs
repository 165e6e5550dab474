//! Hardware adapter: bridges the alert indicator to the domain port.
//!
//! The indicator is any embedded-hal 1.0 [`StatefulOutputPin`]: on the
//! board it is the GPIO driving the LED / vibration motor (an
//! `esp-idf-hal` `PinDriver` in input-output mode), on the host a mock
//! pin. This is the only module in the system that drives the output.

use embedded_hal::digital::StatefulOutputPin;
use log::warn;

use crate::app::ports::ActuatorPort;

/// Drives one active-high indicator pin.
pub struct IndicatorAdapter<P: StatefulOutputPin> {
    pin: P,
    /// Level last commanded; used when the pin cannot be read back.
    level: bool,
}

impl<P: StatefulOutputPin> IndicatorAdapter<P> {
    /// Wrap `pin` and force it off, so the first engine tick starts from
    /// a known level.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("Indicator: initial set_low failed");
        }
        Self { pin, level: false }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: StatefulOutputPin> ActuatorPort for IndicatorAdapter<P> {
    fn set_level(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        match result {
            Ok(()) => self.level = on,
            Err(_) => warn!("Indicator: failed to drive pin {}", if on { "high" } else { "low" }),
        }
    }

    fn level(&self) -> bool {
        self.level
    }
}

impl<P: StatefulOutputPin> IndicatorAdapter<P> {
    /// Read the level back from the output register.
    pub fn read_back(&mut self) -> Option<bool> {
        self.pin.is_set_high().ok()
    }
}
