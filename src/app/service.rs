//! Telemetry loop — the hexagonal core.
//!
//! [`TelemetryLoop`] owns every piece of process-lifetime state: sensors,
//! relay, connection, and the periodic window.  `main` builds it once and
//! calls [`TelemetryLoop::tick`] forever.  All I/O flows through port
//! traits, so the loop runs unchanged against mock adapters.
//!
//! ```text
//!  SensorReader ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                   │     TelemetryLoop       │
//!  Actuator     ◀───│ alarm · window · relay  │──▶ ConnectionManager
//!                   └────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::config::{NodeConfig, ThresholdConfig, Topic};
use crate::connection::{ConnectionManager, RetryGate};
use crate::drivers::relay::{ActuatorController, EngageOutcome};
use crate::error::{Result, SensorFailure};
use crate::schedule::ScheduleClock;
use crate::sensors::SensorReader;
use crate::telemetry::Reading;

use super::events::AppEvent;
use super::ports::{
    AnalogChannel, ClimateDriver, Clock, EntropySource, EventSink, MessagingSession, NetworkLink,
};

// ───────────────────────────────────────────────────────────────
// Tick outcome
// ───────────────────────────────────────────────────────────────

/// What the periodic branch did this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicOutcome {
    NotDue,
    /// Climate read failed; the window was left open.
    SensorFailed(SensorFailure),
    /// Window consumed; `delivered` of the three messages were accepted.
    Published { delivered: u8 },
}

/// Summary of one [`TelemetryLoop::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Flame intensity sampled on the alarm path.
    pub flame_intensity: u8,
    /// Intensity exceeded the threshold.
    pub alarm: bool,
    /// The out-of-band light message was accepted by the transport.
    pub alarm_published: bool,
    pub periodic: PeriodicOutcome,
}

// ───────────────────────────────────────────────────────────────
// TelemetryLoop
// ───────────────────────────────────────────────────────────────

pub struct TelemetryLoop<A, C, P, L, S, E> {
    sensors: SensorReader<A, C>,
    relay: ActuatorController<P>,
    connection: ConnectionManager<L, S, E>,
    schedule: ScheduleClock,
    thresholds: ThresholdConfig,
    dwell_ms: u64,
    topic: Topic,
}

impl<A, C, P, L, S, E> TelemetryLoop<A, C, P, L, S, E>
where
    A: AnalogChannel,
    C: ClimateDriver,
    P: OutputPin,
    L: NetworkLink,
    S: MessagingSession,
    E: EntropySource,
{
    pub fn new(
        sensors: SensorReader<A, C>,
        relay: ActuatorController<P>,
        connection: ConnectionManager<L, S, E>,
        config: &NodeConfig,
    ) -> Self {
        Self {
            sensors,
            relay,
            connection,
            schedule: ScheduleClock::new(config.timing.publish_interval_ms),
            thresholds: config.thresholds,
            dwell_ms: config.timing.relay_dwell_ms,
            topic: config.broker.topic.clone(),
        }
    }

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "TelemetryLoop started (threshold={}, window={}ms, dwell={}ms)",
            self.thresholds.flame_threshold,
            self.schedule.interval_ms(),
            self.dwell_ms
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one iteration: connectivity → alarm path → periodic window.
    ///
    /// `clock` is both the time source and the delay used by blocking
    /// reconnect waits.  Only a reconnect refused by `gate` returns `Err`;
    /// sensor and publish failures are handled inside the iteration.
    pub fn tick(
        &mut self,
        clock: &mut (impl Clock + DelayNs),
        sink: &mut impl EventSink,
        gate: &mut impl RetryGate,
    ) -> Result<TickOutcome> {
        // 1. Connectivity
        if !self.connection.is_connected() {
            self.connection.ensure_connected(clock, gate)?;
            sink.emit(&AppEvent::Connected {
                client_id: self.connection.client_id().clone(),
                address: self.connection.local_address(),
            });
        }

        // 2. Keepalives
        self.connection.service_session();

        // 3. Relay dwell
        let now = clock.now_ms();
        if self.relay.poll(now) {
            sink.emit(&AppEvent::RelayReleased);
        }

        // 4. Alarm path
        let flame_intensity = self.sensors.read_flame_intensity();
        let threshold = self.thresholds.flame_threshold;
        let alarm = flame_intensity > threshold;
        let mut alarm_published = false;
        if alarm {
            sink.emit(&AppEvent::FlameAlarm {
                intensity: flame_intensity,
                threshold,
            });
            match self.relay.engage(now, self.dwell_ms) {
                EngageOutcome::Engaged { until_ms } => {
                    sink.emit(&AppEvent::RelayEngaged { until_ms });
                }
                EngageOutcome::AlreadyEngaged { .. } => {}
                EngageOutcome::Settling { until_ms } => {
                    debug!("Relay settling, re-arm at t={}ms", until_ms);
                }
            }
            alarm_published = self.publish(Reading::light(flame_intensity), sink);
        }

        // 5. Periodic window
        let periodic = if self.schedule.is_due(now) {
            self.periodic(now, sink)
        } else {
            PeriodicOutcome::NotDue
        };

        Ok(TickOutcome {
            flame_intensity,
            alarm,
            alarm_published,
            periodic,
        })
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn relay(&self) -> &ActuatorController<P> {
        &self.relay
    }

    pub fn schedule(&self) -> &ScheduleClock {
        &self.schedule
    }

    pub fn connection(&self) -> &ConnectionManager<L, S, E> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager<L, S, E> {
        &mut self.connection
    }

    // ── Internal ──────────────────────────────────────────────

    fn periodic(&mut self, now: u64, sink: &mut impl EventSink) -> PeriodicOutcome {
        let climate = match self.sensors.read_climate() {
            Ok(c) => c,
            Err(failure) => {
                warn!("Failed to read from DHT sensor: {}", failure);
                sink.emit(&AppEvent::ClimateSkipped(failure));
                return PeriodicOutcome::SensorFailed(failure);
            }
        };
        self.schedule.mark_published(now);

        let light = self.sensors.read_flame_intensity();
        let readings = [
            Reading::temperature(climate.temperature_c),
            Reading::humidity(climate.humidity_pct),
            Reading::light(light),
        ];
        let mut delivered = 0;
        for reading in readings {
            if self.publish(reading, sink) {
                delivered += 1;
            }
        }
        PeriodicOutcome::Published { delivered }
    }

    fn publish(&mut self, reading: Reading, sink: &mut impl EventSink) -> bool {
        let sent = reading.to_payload().and_then(|payload| {
            info!(
                "Publishing {}: {}",
                reading.kind.label(),
                core::str::from_utf8(&payload).unwrap_or("<non-utf8>")
            );
            self.connection.publish(&self.topic, &payload)
        });

        match sent {
            Ok(()) => {
                sink.emit(&AppEvent::Published(reading));
                true
            }
            Err(cause) => {
                warn!("Publish of {} refused: {}", reading.kind.label(), cause);
                sink.emit(&AppEvent::PublishFailed { reading, cause });
                false
            }
        }
    }
}
