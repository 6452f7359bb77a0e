//! Filament Bridge Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   SystemClock     │
//! │  (SensorPort)      RingLogSink    (ConfigPort) (Clock)         │
//! │  WsTransport                                                   │
//! │  (Transport)                                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            BridgeService (pure logic)                  │    │
//! │  │  PrinterClient · SensorMonitor · PausePolicy           │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::{Result, anyhow};
use log::{debug, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use filament_bridge::adapters::hardware::HardwareAdapter;
use filament_bridge::adapters::log_sink::LogEventSink;
use filament_bridge::adapters::nvs::NvsAdapter;
use filament_bridge::adapters::ring_log::RingLogSink;
use filament_bridge::adapters::time::SystemClock;
use filament_bridge::adapters::websocket::WsTransport;
use filament_bridge::app::ports::{Clock, ConfigPort};
use filament_bridge::app::service::BridgeService;
use filament_bridge::config::BridgeConfig;
use filament_bridge::pins;

/// Station credentials baked in at build time.
const WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(s) => s,
    None => "",
};
const WIFI_PASS: &str = match option_env!("WIFI_PASS") {
    Some(s) => s,
    None => "",
};

/// How often the status report is written to the debug log.
const REPORT_INTERVAL_MS: u64 = 30_000;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Filament Bridge v{}               ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Load settings from NVS (or defaults) ───────────────
    let settings = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {}", e))?;
    let config = match settings.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Settings load failed ({}), using defaults", e);
            BridgeConfig::default()
        }
    };
    info!("Printer address: {:?}", config.printer_address);

    // ── 3. Network + wall clock ───────────────────────────────
    let _wifi = connect_wifi(peripherals.modem, sysloop)?;
    let _sntp = EspSntp::new_default()?;

    // ── 4. Sensor inputs ──────────────────────────────────────
    // SAFETY: pin numbers come from `pins` and are not claimed elsewhere.
    let mut runout = PinDriver::input(unsafe { AnyIOPin::new(pins::FILAMENT_RUNOUT_GPIO) })?;
    runout.set_pull(Pull::Up)?;
    let mut movement = PinDriver::input(unsafe { AnyIOPin::new(pins::MOVEMENT_SENSOR_GPIO) })?;
    movement.set_pull(Pull::Up)?;
    let mut hw = HardwareAdapter::new(runout, movement);

    // ── 5. Construct app service ──────────────────────────────
    let clock = SystemClock::new();
    let mut sink = RingLogSink::new(LogEventSink::new(), SystemClock::new());
    let mut app = BridgeService::new(config, WsTransport::new());
    app.start(&mut sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    let mut last_report_ms = 0;
    loop {
        app.tick(&clock, &mut hw, &mut sink);

        let now = clock.now_ms();
        if now.saturating_sub(last_report_ms) >= REPORT_INTERVAL_MS {
            last_report_ms = now;
            match app.status_report().to_json() {
                Ok(json) => debug!("Status after {} ticks: {}", app.tick_count(), json),
                Err(e) => warn!("Status report failed: {}", e),
            }
        }

        // Config auto-save (5s debounce after last change).
        app.auto_save_if_needed(now, &settings);

        FreeRtos::delay_ms(app.config().control_loop_interval_ms);
    }
}

fn connect_wifi(
    modem: Modem,
    sysloop: EspSystemEventLoop,
) -> Result<BlockingWifi<EspWifi<'static>>> {
    let mut wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), None)?, sysloop)?;

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| anyhow!("SSID too long"))?,
        password: WIFI_PASS
            .try_into()
            .map_err(|_| anyhow!("WiFi password too long"))?,
        auth_method: if WIFI_PASS.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;

    wifi.start()?;
    info!("WiFi started, connecting to '{}'", WIFI_SSID);
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("WiFi connected");
    Ok(wifi)
}
