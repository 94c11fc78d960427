//! M.A.S.H. firmware entry point
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  AcquisitionPipeline  RelayBank      LogEventSink  Esp32Time   │
//! │  (SensorPort)         (ActuatorPort) (EventSink)   (Clock)     │
//! │  HostLinkSink<UartTransport> (EventSink + HostTransport)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  LivenessWatchdog · command dispatch · scheduling      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  TaskWatchdog (hung-loop backstop)                             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Delay, FreeRtos};
use log::{error, info};

use mash::adapters::host_link::{HostLinkSink, UartTransport};
use mash::adapters::log_sink::LogEventSink;
use mash::adapters::time::Esp32TimeAdapter;
use mash::app::events::AppEvent;
use mash::app::ports::{ActuatorPort, Clock, EventSink, HostTransport};
use mash::app::service::AppService;
use mash::config::SystemConfig;
use mash::diagnostics;
use mash::drivers::hw_init;
use mash::drivers::i2c_bus::SysI2c;
use mash::drivers::relay::RelayBank;
use mash::drivers::watchdog::TaskWatchdog;
use mash::sensors::acquisition::AcquisitionPipeline;
use mash::sensors::scd41::Scd41;

/// Host bytes drained per loop iteration.
const RX_BURST: usize = 64;
/// Loop period.  Well under the watchdog check interval.
const LOOP_PERIOD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  M.A.S.H. v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;

    // ── 2. Actuators first, so nothing runs while we boot ─────
    let mut relays = RelayBank::new(&config.relays);
    relays.init()?;

    // ── 3. Buses ──────────────────────────────────────────────
    hw_init::init_uart()?;
    hw_init::init_i2c()?;
    let twdt = TaskWatchdog::new();

    let mut pipeline = AcquisitionPipeline::from_config(
        SysI2c::new(),
        SysI2c::new(),
        Delay::new_default(),
        &config,
        || Scd41::new(config.sensor_address, Delay::new_default()),
    )?;

    let clock = Esp32TimeAdapter::new();
    let mut sinks = (LogEventSink::new(), HostLinkSink::new(UartTransport));
    let mut app = AppService::new(&config);

    // ── 4. Sensors + watchdog ─────────────────────────────────
    if let Err(e) = app.start(&mut pipeline, &mut relays, &clock, &mut sinks) {
        // Fatal: never run actuators on an unverified sensing subsystem.
        let report = diagnostics::run_self_test(&mut pipeline);
        error!("FATAL: sensor init failed (mux_present={})", report.mux_present);
        loop {
            relays.shutdown_all();
            // Repeated so a gateway that connects late still sees it.
            sinks.emit(&AppEvent::InitFailed(e));
            twdt.feed();
            FreeRtos::delay_ms(1000);
        }
    }

    let report = diagnostics::run_self_test(&mut pipeline);
    if let Ok(json) = serde_json::to_string(&report) {
        info!("DIAG: {}", json);
    }

    // ── 5. Control loop ───────────────────────────────────────
    let mut rx = heapless::Vec::<u8, RX_BURST>::new();
    loop {
        twdt.feed();

        rx.clear();
        while !rx.is_full() {
            match sinks.1.transport_mut().read_byte() {
                Some(b) => {
                    let _ = rx.push(b);
                }
                None => break,
            }
        }
        let now = clock.now_ms();
        if !rx.is_empty() {
            app.on_host_bytes(&rx, now, &mut relays, &mut sinks);
        }

        app.poll(now, &mut pipeline, &mut relays, &mut sinks);

        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}
