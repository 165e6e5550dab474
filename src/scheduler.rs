//! Tick scheduler for the pattern engine.
//!
//! The engine decides how long to wait after each tick; the scheduler
//! only owns *how* that wait happens and when the loop stops.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  TickScheduler::run                                          │
//! │                                                              │
//! │   ┌──────────┐   interval   ┌──────────┐                     │
//! │   │  tick()  │─────────────▶│  Pacer   │── pause(interval) ─┐│
//! │   └────▲─────┘              └──────────┘                    ││
//! │        │                                                    ││
//! │        └──────────── StopSignal not raised ◀────────────────┘│
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pacer is a trait so host tests can record intervals instead of
//! sleeping; on device it is a FreeRTOS-backed thread sleep.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Pacing
// ═══════════════════════════════════════════════════════════════

/// Waits between ticks.
pub trait Pacer {
    fn pause(&mut self, interval: Duration);
}

/// Pacer that blocks the calling thread. On ESP-IDF `std::thread::sleep`
/// maps to `vTaskDelay`, so other tasks (the ingest thread, the BLE stack)
/// keep running.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

// ═══════════════════════════════════════════════════════════════
//  Stop signal
// ═══════════════════════════════════════════════════════════════

/// One-way flag that ends a [`TickScheduler::run`] loop at the next tick
/// boundary. Safe to raise from any thread.
#[derive(Debug, Default)]
pub struct StopSignal {
    stop: AtomicBool,
}

impl StopSignal {
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
        }
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct TickScheduler<P: Pacer> {
    pacer: P,
}

impl<P: Pacer> TickScheduler<P> {
    pub fn new(pacer: P) -> Self {
        Self { pacer }
    }

    /// Call `tick` and pause for the interval it returns, until `stop` is
    /// raised. The signal is checked before every tick, so a signal raised
    /// during a pause takes effect before the next tick runs.
    ///
    /// Returns the number of ticks executed.
    pub fn run(&mut self, stop: &StopSignal, mut tick: impl FnMut() -> Duration) -> u64 {
        let mut ticks: u64 = 0;
        while !stop.is_stop_requested() {
            let interval = tick();
            ticks += 1;
            debug!("Scheduler: tick {} -> pause {} ms", ticks, interval.as_millis());
            self.pacer.pause(interval);
        }
        info!("Scheduler: stopped after {} ticks", ticks);
        ticks
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    pub fn into_pacer(self) -> P {
        self.pacer
    }
}
