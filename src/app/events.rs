//! Outbound application events.
//!
//! The [`TelemetryLoop`](super::service::TelemetryLoop) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  They are diagnostics
//! only; the wire telemetry goes through the messaging session.

use core::net::Ipv4Addr;

use crate::connection::ClientId;
use crate::error::{PublishFailure, SensorFailure};
use crate::telemetry::Reading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The loop has been constructed and the relay driven to its safe level.
    Started,

    /// Network link and MQTT session are (re)established.
    Connected {
        client_id: ClientId,
        address: Option<Ipv4Addr>,
    },

    /// Flame intensity crossed the alarm threshold.
    FlameAlarm { intensity: u8, threshold: u8 },

    /// Relay energised until `until_ms`.
    RelayEngaged { until_ms: u64 },

    /// Relay dwell expired and the output returned to its safe level.
    RelayReleased,

    /// Climate read failed; periodic publish skipped this iteration.
    ClimateSkipped(SensorFailure),

    /// One telemetry message went out.
    Published(Reading),

    /// One telemetry message was refused.
    PublishFailed { reading: Reading, cause: PublishFailure },
}
