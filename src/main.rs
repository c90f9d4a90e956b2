//! FlameNode Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FlameAdc        Dht11          WifiLink      MqttSession      │
//! │  (AnalogChannel) (ClimateDriver)(NetworkLink) (Messaging)      │
//! │  SystemClock     HardwareRng    LogEventSink  PinDriver(relay) │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            TelemetryLoop (pure logic)                  │    │
//! │  │  SensorReader · ActuatorController · ConnectionManager │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use esp_idf_hal::gpio::{IOPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;
use log::{debug, info, warn};

use flamenode::adapters::entropy::HardwareRng;
use flamenode::adapters::hardware::{Dht11, FlameAdc};
use flamenode::adapters::log_sink::LogEventSink;
use flamenode::adapters::mqtt::MqttSession;
use flamenode::adapters::time::SystemClock;
use flamenode::adapters::wifi::WifiLink;
use flamenode::app::service::TelemetryLoop;
use flamenode::config::{self, NodeConfig};
use flamenode::connection::{ConnectionManager, RetryStep};
use flamenode::drivers::relay::{ActuatorController, Polarity};
use flamenode::drivers::watchdog::Watchdog;
use flamenode::pins;
use flamenode::sensors::SensorReader;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  FlameNode v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;

    // ── 2. Relay first: safe level before anything else ───────
    let polarity = if pins::RELAY_ACTIVE_LOW {
        Polarity::ActiveLow
    } else {
        Polarity::ActiveHigh
    };
    let relay_pin = PinDriver::output(peripherals.pins.gpio27).context("relay GPIO")?;
    // Output reset level is LOW, which energises an active-low relay.
    let relay = ActuatorController::new(relay_pin, polarity, config::RELAY_SETTLE_MS);

    // ── 3. Configuration ──────────────────────────────────────
    let config = NodeConfig::default();
    config.validate().context("build configuration rejected")?;
    match serde_json::to_string(&config) {
        Ok(json) => info!("Config: {}", json),
        Err(e) => warn!("Config: could not render ({})", e),
    }

    let watchdog = Watchdog::new(config::WATCHDOG_TIMEOUT_MS);

    // ── 4. Sensors ────────────────────────────────────────────
    let flame = FlameAdc::new(pins::FLAME_ADC1_CHANNEL).context("flame ADC")?;
    let mut dht_pin =
        PinDriver::input_output_od(peripherals.pins.gpio26.downgrade()).context("DHT GPIO")?;
    dht_pin.set_pull(Pull::Up)?;
    let sensors = SensorReader::new(flame, Dht11::new(dht_pin));

    // ── 5. Network ────────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let wifi = EspWifi::new(peripherals.modem, sysloop, Some(nvs)).context("WiFi driver")?;
    let connection = ConnectionManager::new(
        WifiLink::new(wifi),
        MqttSession::new(&config.broker),
        HardwareRng::new(),
        &config,
    );

    // ── 6. Telemetry loop ─────────────────────────────────────
    let mut app = TelemetryLoop::new(sensors, relay, connection, &config);
    let mut clock = SystemClock::new();
    let mut sink = LogEventSink::new();
    app.start(&mut sink);

    // Reconnect never gives up; it only keeps the watchdog fed.
    let mut gate = |step: RetryStep| {
        debug!("Reconnect: {:?}", step);
        watchdog.feed();
        true
    };

    info!("System ready. Entering telemetry loop.");

    loop {
        if let Err(e) = app.tick(&mut clock, &mut sink, &mut gate) {
            warn!("Loop: {}", e);
        }
        watchdog.feed();
        clock.delay_ms(config.timing.loop_idle_ms);
    }
}
