//! Port traits — the hexagonal boundary between the telemetry loop and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ TelemetryLoop (domain)
//! ```
//!
//! Every collaborator the loop consumes (WiFi, MQTT, ADC, DHT11, clock,
//! RNG) is reached through one of these traits.  The relay output uses
//! [`embedded_hal::digital::OutputPin`] directly, and blocking waits use
//! [`embedded_hal::delay::DelayNs`], so any HAL pin / delay plugs in.

use core::net::Ipv4Addr;

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Network link (WiFi station)
// ───────────────────────────────────────────────────────────────

/// Link-layer association status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Up,
    Down,
    Connecting,
}

/// The network link underneath the messaging session.
pub trait NetworkLink {
    /// Start (or restart) association with the given credentials.
    /// Returns immediately; progress is observed through [`link_status`].
    ///
    /// [`link_status`]: NetworkLink::link_status
    fn begin_link(&mut self, ssid: &str, credential: &str);

    fn link_status(&mut self) -> LinkStatus;

    /// Station address once the link is up.
    fn local_address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Messaging-protocol session (MQTT)
// ───────────────────────────────────────────────────────────────

/// One MQTT client, configured once with the broker host and port.
pub trait MessagingSession {
    /// Perform the protocol handshake under `client_id`.
    fn connect(&mut self, client_id: &str) -> bool;

    fn connected(&self) -> bool;

    /// Send one message.  `true` only means the transport accepted it.
    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool;

    /// Service keepalives and incoming traffic.
    fn service(&mut self);

    /// Transport-specific result code of the last handshake.
    fn state_code(&self) -> i32;
}

// ───────────────────────────────────────────────────────────────
// Sensors
// ───────────────────────────────────────────────────────────────

/// Raw analog channel with a native range of `0..=4095`.
pub trait AnalogChannel {
    fn read_raw(&mut self) -> u16;
}

/// Digital temperature / humidity sensor.  A failed measurement is
/// reported as `f32::NAN`.
pub trait ClimateDriver {
    fn init(&mut self);
    fn read_humidity_percent(&mut self) -> f32;
    fn read_temperature_celsius(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Time and entropy
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Source of randomness for MQTT client identifiers.
pub trait EntropySource {
    fn next_u16(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The loop emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, test recorder, ...).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
