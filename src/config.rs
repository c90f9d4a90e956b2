//! Compiled-in node configuration.
//!
//! There is no runtime configuration surface: credentials, broker address,
//! topic, threshold and timings are constants baked into the image.
//! [`NodeConfig::default()`] gathers them into one struct that the rest of
//! the firmware borrows from.

use serde::Serialize;

// --- Network ---
pub const WIFI_SSID: &str = "po1";
pub const WIFI_PASSWORD: &str = "299792ps";

// --- Broker ---
pub const MQTT_BROKER_HOST: &str = "test.mosquitto.org";
pub const MQTT_BROKER_PORT: u16 = 1883;
pub const MQTT_TOPIC: &str = "tippaphanun/5f29d93c/sensor/data";
pub const MQTT_CLIENT_ID_PREFIX: &str = "ESP32Client-";

// --- Thresholds ---
/// Flame intensity (0–100) strictly above which the relay fires.
pub const FLAME_THRESHOLD: u8 = 75;

// --- Timing ---
/// Periodic climate + light publish window.
pub const PUBLISH_INTERVAL_MS: u64 = 5_000;
/// Minimum time the relay stays energised once triggered.
pub const RELAY_DWELL_MS: u64 = 3_000;
/// Hold-off after the relay releases before it may be re-armed.
pub const RELAY_SETTLE_MS: u64 = 100;
/// Link-status polling step while waiting for WiFi association.
pub const LINK_POLL_MS: u32 = 500;
/// Delay between failed MQTT handshakes.
pub const SESSION_RETRY_MS: u32 = 5_000;
/// Idle yield between loop iterations.
pub const LOOP_IDLE_MS: u32 = 10;
/// Task watchdog timeout.  Must exceed the longest stretch between feeds:
/// one MQTT handshake wait plus one retry delay.
pub const WATCHDOG_TIMEOUT_MS: u32 = 30_000;

pub type Ssid = heapless::String<32>;
pub type Password = heapless::String<64>;
pub type Host = heapless::String<64>;
pub type Topic = heapless::String<128>;

/// Immutable alarm threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThresholdConfig {
    /// 0..=100; an intensity strictly greater than this is an alarm.
    pub flame_threshold: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            flame_threshold: FLAME_THRESHOLD,
        }
    }
}

/// WiFi station credentials.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkConfig {
    pub ssid: Ssid,
    #[serde(skip_serializing)]
    pub password: Password,
}

/// MQTT broker endpoint and topic.
#[derive(Debug, Clone, Serialize)]
pub struct BrokerConfig {
    pub host: Host,
    pub port: u16,
    pub topic: Topic,
    pub client_id_prefix: heapless::String<16>,
}

impl BrokerConfig {
    /// `mqtt://host:port` URL for the transport.
    pub fn url(&self) -> heapless::String<96> {
        use core::fmt::Write;
        let mut url = heapless::String::new();
        let _ = write!(url, "mqtt://{}:{}", self.host, self.port);
        url
    }
}

/// Loop and reconnect timing.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TimingConfig {
    pub publish_interval_ms: u64,
    pub relay_dwell_ms: u64,
    pub relay_settle_ms: u64,
    pub link_poll_ms: u32,
    pub session_retry_ms: u32,
    pub loop_idle_ms: u32,
}

/// Everything the node needs at boot.
#[derive(Debug, Clone, Serialize)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub broker: BrokerConfig,
    pub thresholds: ThresholdConfig,
    pub timing: TimingConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                ssid: fixed(WIFI_SSID),
                password: fixed(WIFI_PASSWORD),
            },
            broker: BrokerConfig {
                host: fixed(MQTT_BROKER_HOST),
                port: MQTT_BROKER_PORT,
                topic: fixed(MQTT_TOPIC),
                client_id_prefix: fixed(MQTT_CLIENT_ID_PREFIX),
            },
            thresholds: ThresholdConfig::default(),
            timing: TimingConfig {
                publish_interval_ms: PUBLISH_INTERVAL_MS,
                relay_dwell_ms: RELAY_DWELL_MS,
                relay_settle_ms: RELAY_SETTLE_MS,
                link_poll_ms: LINK_POLL_MS,
                session_retry_ms: SESSION_RETRY_MS,
                loop_idle_ms: LOOP_IDLE_MS,
            },
        }
    }
}

// Constants must fit their fixed-capacity fields.
const _: () = assert!(WIFI_SSID.len() <= 32);
const _: () = assert!(WIFI_PASSWORD.len() <= 64);
const _: () = assert!(MQTT_BROKER_HOST.len() <= 64);
const _: () = assert!(MQTT_TOPIC.len() <= 128);
const _: () = assert!(MQTT_CLIENT_ID_PREFIX.len() <= 16);

/// Copy a constant into a fixed-capacity string (capacity checked above).
fn fixed<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl NodeConfig {
    /// Reject values that would leave the node unable to do its job.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError::ValidationFailed;

        if self.thresholds.flame_threshold > 100 {
            return Err(ValidationFailed("flame_threshold must be 0..=100"));
        }
        let ssid = self.network.ssid.as_str();
        if ssid.is_empty() || !ssid.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            return Err(ValidationFailed("ssid must be 1-32 printable ASCII bytes"));
        }
        let pw = self.network.password.len();
        if pw != 0 && !(8..=64).contains(&pw) {
            return Err(ValidationFailed("password must be empty or 8-64 bytes"));
        }
        if self.broker.host.is_empty() {
            return Err(ValidationFailed("broker host is empty"));
        }
        if self.broker.port == 0 {
            return Err(ValidationFailed("broker port must be non-zero"));
        }
        if self.broker.topic.is_empty() {
            return Err(ValidationFailed("topic is empty"));
        }
        let t = &self.timing;
        if t.publish_interval_ms == 0 || t.relay_dwell_ms == 0 {
            return Err(ValidationFailed("interval and dwell must be non-zero"));
        }
        if t.link_poll_ms == 0 || t.session_retry_ms == 0 {
            return Err(ValidationFailed("retry steps must be non-zero"));
        }
        Ok(())
    }
}
