//! EyeCan Firmware: main entry point
//!
//! Two tasks around one shared slot:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartLink / BleLink ──LinkCommand──▶ events::INBOUND           │
//! │  IndicatorAdapter   LogEventSink   Esp32TimeAdapter            │
//! │  (ActuatorPort)     (EventSink)    (ClockPort)                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ingest thread:  Ingestor ──▶ SharedState                      │
//! │  main thread:    SharedState ──▶ AlertService ──▶ indicator    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::peripherals::Peripherals;
use log::{info, warn};

use eyecan::adapters::ble::BleLink;
use eyecan::adapters::hardware::IndicatorAdapter;
use eyecan::adapters::log_sink::LogEventSink;
use eyecan::adapters::time::Esp32TimeAdapter;
use eyecan::adapters::uart::UartLink;
use eyecan::app::ingest::Ingestor;
use eyecan::app::service::AlertService;
use eyecan::config::{AlertConfig, LinkMode};
use eyecan::diagnostics::{self, Diagnostics, RuntimeMetrics};
use eyecan::events;
use eyecan::scheduler::{StopSignal, ThreadPacer};
use eyecan::state::SharedState;

static STATE: SharedState = SharedState::new();
static DIAGNOSTICS: Diagnostics = Diagnostics::new();
static STOP: StopSignal = StopSignal::new();

/// Build-time override, e.g. `EYECAN_CONFIG_JSON='{"link_mode":"Wired"}'`.
fn load_config() -> AlertConfig {
    match option_env!("EYECAN_CONFIG_JSON") {
        Some(raw) => match AlertConfig::from_json(raw.as_bytes()) {
            Ok(cfg) => {
                info!("Config: build-time override applied");
                cfg
            }
            Err(e) => {
                warn!("Config: override rejected ({}), using defaults", e);
                AlertConfig::default()
            }
        },
        None => AlertConfig::default(),
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EyeCan v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Config ─────────────────────────────────────────────
    let config = load_config();
    let clock = Esp32TimeAdapter::new();
    let metrics = RuntimeMetrics::collect(clock.uptime_secs());
    info!(
        "Boot: link={:?} policy={:?} heap_free={}",
        config.link_mode, config.threshold_policy, metrics.heap_free
    );

    // ── 3. Indicator ──────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let pin = PinDriver::input_output(peripherals.pins.gpio13)?;
    let mut hw = IndicatorAdapter::new(pin);

    // ── 4. Transport ──────────────────────────────────────────
    // Kept alive for the life of the firmware.
    let _ble = match config.link_mode {
        LinkMode::Wired => {
            UartLink::new(
                peripherals.uart1,
                peripherals.pins.gpio17,
                peripherals.pins.gpio16,
                config.uart_baud,
            )?
            .spawn()?;
            None
        }
        LinkMode::Wireless => {
            let mut ble = BleLink::new(config.device_name.clone(), &STATE);
            ble.start();
            Some(ble)
        }
    };

    // ── 5. Ingest task ────────────────────────────────────────
    let (link_mode, policy) = (config.link_mode, config.threshold_policy);
    std::thread::Builder::new()
        .name("ingest".into())
        .stack_size(6 * 1024)
        .spawn(move || {
            let mut sink = LogEventSink::with_diagnostics(&DIAGNOSTICS);
            let mut ingestor = Ingestor::new(&STATE, clock, link_mode, policy);
            loop {
                let cmd = events::receive_blocking();
                ingestor.handle(cmd, &mut sink);
            }
        })?;

    // ── 6. Alert engine (this thread) ─────────────────────────
    let mut sink = LogEventSink::with_diagnostics(&DIAGNOSTICS);
    let mut service = AlertService::new(config);
    service.start(&mut sink);
    info!("System ready. Entering alert loop.");
    service.run(&STATE, &mut hw, &clock, ThreadPacer, &mut sink, &STOP);

    Ok(())
}
