//! KY-015 (DHT11) temperature / humidity sensor.
//!
//! The driver reports NaN when the single-wire exchange fails (timing,
//! checksum).  This layer turns NaN and physically impossible values into
//! a [`SensorFailure`] and truncates valid readings to whole units.

use crate::app::ports::ClimateDriver;
use crate::error::SensorFailure;

/// Plausible range for the DHT sensor family.
const TEMPERATURE_RANGE_C: core::ops::RangeInclusive<f32> = -40.0..=80.0;
const HUMIDITY_RANGE_PCT: core::ops::RangeInclusive<f32> = 0.0..=100.0;

/// Validated climate sample, truncated to integer degrees / percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClimateReading {
    pub temperature_c: i32,
    pub humidity_pct: i32,
}

pub struct ClimateSensor<C> {
    driver: C,
}

impl<C: ClimateDriver> ClimateSensor<C> {
    /// Wrap and initialise the driver.
    pub fn new(mut driver: C) -> Self {
        driver.init();
        Self { driver }
    }

    /// Humidity first, then temperature; either one invalid fails the read.
    pub fn read(&mut self) -> Result<ClimateReading, SensorFailure> {
        let humidity = self.driver.read_humidity_percent();
        let temperature = self.driver.read_temperature_celsius();

        if humidity.is_nan() {
            return Err(SensorFailure::HumidityUnavailable);
        }
        if temperature.is_nan() {
            return Err(SensorFailure::TemperatureUnavailable);
        }
        if !HUMIDITY_RANGE_PCT.contains(&humidity) {
            return Err(SensorFailure::HumidityOutOfRange);
        }
        if !TEMPERATURE_RANGE_C.contains(&temperature) {
            return Err(SensorFailure::TemperatureOutOfRange);
        }

        // `as` truncates towards zero: 23.7 → 23, -0.5 → 0.
        Ok(ClimateReading {
            temperature_c: temperature as i32,
            humidity_pct: humidity as i32,
        })
    }
}
