//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | relay safe, loop running");
            }
            AppEvent::Connected { client_id, address } => match address {
                Some(ip) => info!("SESSION | up as {} from {}", client_id, ip),
                None => info!("SESSION | up as {}", client_id),
            },
            AppEvent::FlameAlarm {
                intensity,
                threshold,
            } => {
                warn!("ALARM | flame {}% > threshold {}%", intensity, threshold);
            }
            AppEvent::RelayEngaged { until_ms } => {
                info!("RELAY | engaged until t={}ms", until_ms);
            }
            AppEvent::RelayReleased => {
                info!("RELAY | released");
            }
            AppEvent::ClimateSkipped(cause) => {
                warn!("TELEM | periodic skipped: {}", cause);
            }
            AppEvent::Published(r) => {
                info!("TELEM | {:?}={} sent", r.kind, r.value);
            }
            AppEvent::PublishFailed { reading, cause } => {
                warn!("TELEM | {:?}={} lost: {}", reading.kind, reading.value, cause);
            }
        }
    }
}
