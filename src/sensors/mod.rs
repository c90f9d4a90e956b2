//! Sensor subsystem — individual sensors and the aggregating [`SensorReader`].
//!
//! The flame channel is read on every loop iteration (alarm path); the
//! climate sensor only when the periodic window is due.

pub mod climate;
pub mod flame;

use crate::app::ports::{AnalogChannel, ClimateDriver};
use crate::error::SensorFailure;
use climate::{ClimateReading, ClimateSensor};
use flame::FlameSensor;

/// Owns both sensors and hands validated readings to the loop.
pub struct SensorReader<A, C> {
    flame: FlameSensor<A>,
    climate: ClimateSensor<C>,
}

impl<A: AnalogChannel, C: ClimateDriver> SensorReader<A, C> {
    pub fn new(flame_channel: A, climate_driver: C) -> Self {
        Self {
            flame: FlameSensor::new(flame_channel),
            climate: ClimateSensor::new(climate_driver),
        }
    }

    /// Flame intensity `0..=100`.  Never fails.
    pub fn read_flame_intensity(&mut self) -> u8 {
        self.flame.read().intensity
    }

    /// Temperature / humidity, or the reason this cycle has no climate data.
    pub fn read_climate(&mut self) -> Result<ClimateReading, SensorFailure> {
        self.climate.read()
    }
}
