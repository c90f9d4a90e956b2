//! Integration tests for the TelemetryLoop → sensors / relay / session
//! pipeline, driven entirely by simulated time.

use flamenode::app::events::AppEvent;
use flamenode::app::service::{PeriodicOutcome, TickOutcome};
use flamenode::connection::{Forever, MaxAttempts};
use flamenode::error::{ConnectError, Error, SensorFailure};

use crate::mock_hw::Rig;

const TEMP_23: &str = r#"{"type":"temp","value":23}"#;
const HUMID_61: &str = r#"{"type":"humid","value":61}"#;
const LIGHT_100: &str = r#"{"type":"light","value":100}"#;

/// Raw ADC value that remaps to intensity 10.
const RAW_INTENSITY_10: u16 = 3685;

fn tick_at(rig: &mut Rig, t: u64) -> TickOutcome {
    rig.clock.at(t);
    rig.app
        .tick(&mut rig.clock, &mut rig.sink, &mut Forever)
        .unwrap()
}

// ── Periodic window ───────────────────────────────────────────

#[test]
fn first_window_publishes_temp_humid_light_in_order() {
    let mut rig = Rig::new();
    rig.dht.set(61.2, 23.7);
    rig.adc.set(RAW_INTENSITY_10);

    let out = tick_at(&mut rig, 0);

    assert_eq!(out.periodic, PeriodicOutcome::Published { delivered: 3 });
    assert_eq!(
        rig.session.payloads(),
        vec![
            TEMP_23.to_string(),
            HUMID_61.to_string(),
            r#"{"type":"light","value":10}"#.to_string(),
        ]
    );
    let topics: Vec<String> = rig
        .session
        .0
        .borrow()
        .published
        .iter()
        .map(|(t, _)| t.clone())
        .collect();
    assert!(topics.iter().all(|t| t == "tippaphanun/5f29d93c/sensor/data"));
}

#[test]
fn periodic_fires_at_most_once_per_window() {
    let mut rig = Rig::new();

    tick_at(&mut rig, 0);
    for t in [1_000, 2_500, 4_999] {
        assert_eq!(tick_at(&mut rig, t).periodic, PeriodicOutcome::NotDue);
    }
    assert_eq!(rig.session.payloads().len(), 3);

    let out = tick_at(&mut rig, 5_000);
    assert_eq!(out.periodic, PeriodicOutcome::Published { delivered: 3 });
    assert_eq!(rig.session.payloads().len(), 6);
    assert_eq!(rig.app.schedule().last_publish_ms(), Some(5_000));
}

#[test]
fn nan_temperature_aborts_before_any_publish() {
    let mut rig = Rig::new();
    rig.dht.set(61.2, f32::NAN);

    let out = tick_at(&mut rig, 0);

    assert_eq!(
        out.periodic,
        PeriodicOutcome::SensorFailed(SensorFailure::TemperatureUnavailable)
    );
    assert!(rig.session.payloads().is_empty());
    assert_eq!(rig.app.schedule().last_publish_ms(), None);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::ClimateSkipped(_))),
        1
    );
}

#[test]
fn failed_climate_read_retries_on_the_next_iteration() {
    let mut rig = Rig::new();
    tick_at(&mut rig, 0);

    rig.dht.set(f32::NAN, 20.0);
    let out = tick_at(&mut rig, 5_000);
    assert_eq!(
        out.periodic,
        PeriodicOutcome::SensorFailed(SensorFailure::HumidityUnavailable)
    );
    assert_eq!(rig.app.schedule().last_publish_ms(), Some(0));

    rig.dht.set(61.2, 23.7);
    let out = tick_at(&mut rig, 5_010);
    assert_eq!(out.periodic, PeriodicOutcome::Published { delivered: 3 });
    assert_eq!(rig.app.schedule().last_publish_ms(), Some(5_010));
}

#[test]
fn publish_failures_are_independent_and_still_consume_window() {
    let mut rig = Rig::new();
    tick_at(&mut rig, 0);
    rig.session.0.borrow_mut().reject_publish = true;

    let out = tick_at(&mut rig, 5_000);

    assert_eq!(out.periodic, PeriodicOutcome::Published { delivered: 0 });
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::PublishFailed { .. })),
        3
    );
    assert_eq!(rig.app.schedule().last_publish_ms(), Some(5_000));
}

// ── Alarm path ────────────────────────────────────────────────

#[test]
fn dark_reading_neither_actuates_nor_publishes_alarm() {
    let mut rig = Rig::new();
    rig.adc.set(4095);

    let out = tick_at(&mut rig, 0);

    assert_eq!(out.flame_intensity, 0);
    assert!(!out.alarm);
    assert!(!out.alarm_published);
    assert!(rig.relay.is_high(), "active-low relay must idle HIGH");
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FlameAlarm { .. })), 0);
    assert_eq!(rig.session.payloads().len(), 3);
}

#[test]
fn full_flame_engages_relay_and_publishes_immediately() {
    let mut rig = Rig::new();
    tick_at(&mut rig, 0);
    rig.session.clear();

    rig.adc.set(0);
    let out = tick_at(&mut rig, 1_000);

    assert_eq!(out.flame_intensity, 100);
    assert!(out.alarm);
    assert!(out.alarm_published);
    assert_eq!(out.periodic, PeriodicOutcome::NotDue);
    assert!(!rig.relay.is_high(), "relay energised (LOW)");
    assert_eq!(rig.session.payloads(), vec![LIGHT_100.to_string()]);
    assert!(rig.sink.events.contains(&AppEvent::FlameAlarm {
        intensity: 100,
        threshold: 75
    }));
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::RelayEngaged { until_ms: 4_000 })
    );
}

#[test]
fn threshold_is_strictly_greater_than() {
    let mut rig = Rig::new();
    // 1023 → 75, exactly at the threshold.
    rig.adc.set(1023);
    let out = tick_at(&mut rig, 0);
    assert_eq!(out.flame_intensity, 75);
    assert!(!out.alarm);

    // 982 → 76.
    rig.adc.set(982);
    let out = tick_at(&mut rig, 100);
    assert!(out.alarm);
}

#[test]
fn alarm_publish_precedes_periodic_and_both_send_light() {
    let mut rig = Rig::new();
    rig.dht.set(61.2, 23.7);
    rig.adc.set(0);

    tick_at(&mut rig, 0);

    assert_eq!(
        rig.session.payloads(),
        vec![
            LIGHT_100.to_string(),
            TEMP_23.to_string(),
            HUMID_61.to_string(),
            LIGHT_100.to_string(),
        ]
    );
}

#[test]
fn periodic_light_is_a_fresh_sample() {
    let mut rig = Rig::new();
    // Alarm path reads 0 (intensity 100); periodic re-read sees darkness.
    rig.adc.queue(&[0, 4095]);

    tick_at(&mut rig, 0);

    let payloads = rig.session.payloads();
    assert_eq!(payloads.first().map(String::as_str), Some(LIGHT_100));
    assert_eq!(
        payloads.last().map(String::as_str),
        Some(r#"{"type":"light","value":0}"#)
    );
}

// ── Relay dwell ───────────────────────────────────────────────

#[test]
fn relay_holds_for_full_dwell_regardless_of_readings() {
    let mut rig = Rig::new();
    tick_at(&mut rig, 0);

    rig.adc.set(0);
    tick_at(&mut rig, 1_000);
    rig.adc.set(4095);

    for t in [1_500, 2_000, 3_999] {
        tick_at(&mut rig, t);
        assert!(!rig.relay.is_high(), "still engaged at t={t}");
    }

    tick_at(&mut rig, 4_000);
    assert!(rig.relay.is_high());
    assert_eq!(rig.sink.count(|e| *e == AppEvent::RelayReleased), 1);
}

#[test]
fn persistent_flame_does_not_extend_dwell() {
    let mut rig = Rig::new();
    rig.adc.set(0);

    for t in [0, 1_000, 2_000, 2_999] {
        tick_at(&mut rig, t);
    }

    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::RelayEngaged { .. })),
        1
    );
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FlameAlarm { .. })), 4);

    tick_at(&mut rig, 3_000);
    assert_eq!(rig.sink.count(|e| *e == AppEvent::RelayReleased), 1);
}

#[test]
fn relay_rearms_after_settle_hold_off() {
    let mut rig = Rig::new();
    rig.adc.set(0);
    tick_at(&mut rig, 0);

    // Released at 3000; the same iteration may not re-arm.
    tick_at(&mut rig, 3_000);
    assert!(rig.relay.is_high());

    tick_at(&mut rig, 3_100);
    assert!(!rig.relay.is_high());
    assert!(
        rig.sink
            .events
            .contains(&AppEvent::RelayEngaged { until_ms: 6_100 })
    );
}

#[test]
fn alarm_while_settling_still_reports_without_engaging() {
    let mut rig = Rig::new();
    rig.adc.set(0);
    tick_at(&mut rig, 0);
    rig.session.clear();

    // Released at 3000, re-arm not allowed before 3100.
    let out = tick_at(&mut rig, 3_000);

    assert!(out.alarm);
    assert!(out.alarm_published);
    assert!(rig.relay.is_high());
    assert_eq!(rig.session.payloads(), vec![LIGHT_100.to_string()]);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::FlameAlarm { .. })), 2);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::RelayEngaged { .. })),
        1
    );
    assert_eq!(rig.app.relay().rearm_at_ms(), 3_100);
}

// ── Connectivity ──────────────────────────────────────────────

#[test]
fn first_tick_connects_and_services_every_iteration() {
    let mut rig = Rig::new();

    for t in [0, 10, 20] {
        tick_at(&mut rig, t);
    }

    assert_eq!(rig.session.attempts(), 1);
    assert_eq!(rig.session.0.borrow().serviced, 3);
    assert_eq!(rig.sink.events.first(), Some(&AppEvent::Started));
    assert!(matches!(rig.sink.events.get(1), Some(AppEvent::Connected { .. })));
}

#[test]
fn dropped_session_reconnects_with_new_client_id() {
    let mut rig = Rig::new();
    tick_at(&mut rig, 0);

    rig.session.drop_session();
    tick_at(&mut rig, 100);

    let ids = rig.session.0.borrow().client_ids.clone();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert!(ids.iter().all(|id| id.starts_with("ESP32Client-")));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::Connected { .. })),
        2
    );
}

#[test]
fn cancelled_reconnect_surfaces_error_without_sampling() {
    let mut rig = Rig::new();
    rig.session.0.borrow_mut().refuse_remaining = u32::MAX;

    let err = rig
        .app
        .tick(&mut rig.clock, &mut rig.sink, &mut MaxAttempts(2))
        .unwrap_err();

    assert_eq!(
        err,
        Error::Connect(ConnectError::Cancelled {
            link_polls: 0,
            session_attempts: 2
        })
    );
    assert_eq!(rig.dht.reads.get(), 0);
    assert!(rig.session.payloads().is_empty());
    // Two refused handshakes, each followed by the 5 s retry delay.
    assert_eq!(rig.clock.now(), 10_000);
}
