//! Fuzz target: sensor normalisation and wire encoding.
//!
//! Feeds arbitrary raw ADC values and arbitrary DHT floats (NaN, infinities,
//! subnormals included) through the flame remap, the climate validation and
//! the JSON encoder, and asserts that every accepted value respects its
//! documented range.
//!
//! cargo fuzz run fuzz_sensor_readings

#![no_main]

use flamenode::app::ports::ClimateDriver;
use flamenode::sensors::climate::ClimateSensor;
use flamenode::sensors::flame::remap_flame;
use flamenode::telemetry::Reading;
use libfuzzer_sys::fuzz_target;

struct Replay {
    humidity: f32,
    temperature: f32,
}

impl ClimateDriver for Replay {
    fn init(&mut self) {}
    fn read_humidity_percent(&mut self) -> f32 {
        self.humidity
    }
    fn read_temperature_celsius(&mut self) -> f32 {
        self.temperature
    }
}

fuzz_target!(|data: &[u8]| {
    for chunk in data.chunks_exact(10) {
        let raw = u16::from_le_bytes([chunk[0], chunk[1]]);
        let humidity = f32::from_le_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]);
        let temperature = f32::from_le_bytes([chunk[6], chunk[7], chunk[8], chunk[9]]);

        let intensity = remap_flame(raw);
        assert!(intensity <= 100, "intensity out of range for raw={raw}");

        let mut sensor = ClimateSensor::new(Replay {
            humidity,
            temperature,
        });
        if let Ok(c) = sensor.read() {
            assert!((0..=100).contains(&c.humidity_pct));
            assert!((-40..=80).contains(&c.temperature_c));
            for r in [
                Reading::temperature(c.temperature_c),
                Reading::humidity(c.humidity_pct),
                Reading::light(intensity),
            ] {
                let payload = r.to_payload().expect("integer readings always encode");
                assert!(payload.starts_with(br#"{"type":""#));
            }
        }
    }
});
