//! MQTT session adapter.
//!
//! Implements [`MessagingSession`] on top of the ESP-IDF MQTT client.  The
//! client is rebuilt on every `connect` because the client id is part of
//! its configuration; the handshake result is awaited with a bounded wait
//! so that retry pacing stays with the connection manager.
//!
//! State codes use the PubSubClient numbering (`STATE_*`).
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`
//!   with an event callback tracking CONNACK / disconnect.
//! - **all other targets**: an in-memory broker recording every publish.

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, AtomicI32, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttEvent, EventPayload, MqttClientConfiguration, QoS,
};
use log::{debug, info};
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::MessagingSession;
use crate::config::BrokerConfig;

pub const STATE_CONNECTION_TIMEOUT: i32 = -4;
pub const STATE_CONNECTION_LOST: i32 = -3;
pub const STATE_CONNECT_FAILED: i32 = -2;
pub const STATE_DISCONNECTED: i32 = -1;
pub const STATE_CONNECTED: i32 = 0;

/// Longest wait for the broker's CONNACK.
#[cfg(target_os = "espidf")]
const CONNACK_TIMEOUT_MS: u32 = 15_000;
#[cfg(target_os = "espidf")]
const CONNACK_POLL_MS: u32 = 50;

/// Shared between the session and the client's event task.
#[cfg(target_os = "espidf")]
struct SessionFlags {
    connected: AtomicBool,
    rc: AtomicI32,
}

pub struct MqttSession {
    url: heapless::String<96>,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    flags: Arc<SessionFlags>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimBroker {
    connected: bool,
    rc: i32,
    refuse_next: u32,
    published: Vec<(String, Vec<u8>)>,
}

impl MqttSession {
    /// Configure the broker endpoint.  No network traffic until `connect`.
    pub fn new(broker: &BrokerConfig) -> Self {
        let url = broker.url();
        info!("MQTT: broker {}", url);
        Self {
            url,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            flags: Arc::new(SessionFlags {
                connected: AtomicBool::new(false),
                rc: AtomicI32::new(STATE_DISCONNECTED),
            }),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker {
                rc: STATE_DISCONNECTED,
                ..SimBroker::default()
            },
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Refuse the next `n` handshakes (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_refuse(&mut self, n: u32) {
        self.sim.refuse_next = n;
    }

    /// Drop the session as if the broker closed it (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        self.sim.connected = false;
        self.sim.rc = STATE_CONNECTION_LOST;
    }

    /// Every message accepted so far (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn published(&self) -> &[(String, Vec<u8>)] {
        &self.sim.published
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, client_id: &str) -> bool {
        use esp_idf_hal::delay::FreeRtos;

        self.client = None;
        self.flags.connected.store(false, Ordering::Release);
        self.flags.rc.store(STATE_DISCONNECTED, Ordering::Release);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            ..Default::default()
        };
        let flags = Arc::clone(&self.flags);
        let client = EspMqttClient::new_cb(&self.url, &conf, move |event: EspMqttEvent<'_>| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    flags.connected.store(true, Ordering::Release);
                    flags.rc.store(STATE_CONNECTED, Ordering::Release);
                }
                EventPayload::Disconnected => {
                    let was_up = flags.connected.swap(false, Ordering::AcqRel);
                    let rc = if was_up {
                        STATE_CONNECTION_LOST
                    } else {
                        STATE_CONNECT_FAILED
                    };
                    flags.rc.store(rc, Ordering::Release);
                }
                EventPayload::Error(e) => warn!("MQTT: transport error {:?}", e),
                _ => {}
            }
        });
        let client = match client {
            Ok(c) => c,
            Err(e) => {
                warn!("MQTT: client init failed — {}", e);
                self.flags.rc.store(STATE_CONNECT_FAILED, Ordering::Release);
                return false;
            }
        };
        self.client = Some(client);

        let mut waited = 0;
        while waited < CONNACK_TIMEOUT_MS {
            if self.flags.connected.load(Ordering::Acquire) {
                return true;
            }
            if self.flags.rc.load(Ordering::Acquire) == STATE_CONNECT_FAILED {
                break;
            }
            FreeRtos::delay_ms(CONNACK_POLL_MS);
            waited += CONNACK_POLL_MS;
        }
        if waited >= CONNACK_TIMEOUT_MS {
            self.flags
                .rc
                .store(STATE_CONNECTION_TIMEOUT, Ordering::Release);
        }
        self.client = None;
        false
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, client_id: &str) -> bool {
        if self.sim.refuse_next > 0 {
            self.sim.refuse_next -= 1;
            self.sim.connected = false;
            self.sim.rc = STATE_CONNECT_FAILED;
            return false;
        }
        debug!("MQTT(sim): CONNACK for {}", client_id);
        self.sim.connected = true;
        self.sim.rc = STATE_CONNECTED;
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_connected(&self) -> bool {
        self.client.is_some() && self.flags.connected.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connected(&self) -> bool {
        self.sim.connected
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        match self.client.as_mut() {
            Some(client) => client
                .publish(topic, QoS::AtMostOnce, false, payload)
                .map_err(|e| debug!("MQTT: publish error {}", e))
                .is_ok(),
            None => false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.sim.connected {
            return false;
        }
        self.sim.published.push((topic.to_string(), payload.to_vec()));
        true
    }

    #[cfg(target_os = "espidf")]
    fn platform_state(&self) -> i32 {
        self.flags.rc.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_state(&self) -> i32 {
        self.sim.rc
    }
}

// ───────────────────────────────────────────────────────────────
// MessagingSession
// ───────────────────────────────────────────────────────────────

impl MessagingSession for MqttSession {
    fn connect(&mut self, client_id: &str) -> bool {
        self.platform_connect(client_id)
    }

    fn connected(&self) -> bool {
        self.platform_connected()
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        self.platform_publish(topic, payload)
    }

    fn service(&mut self) {
        // The ESP-IDF client runs keepalives on its own task; only surface
        // a silent drop here.
        if !self.platform_connected() && self.platform_state() == STATE_CONNECTION_LOST {
            debug!("MQTT: session dropped, reconnect pending");
        }
    }

    fn state_code(&self) -> i32 {
        self.platform_state()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
