//! Hardware adapter — bridges the sensor peripherals to domain port traits.
//!
//! | Type       | Implements      | Peripheral                       |
//! |------------|-----------------|----------------------------------|
//! | `FlameAdc` | `AnalogChannel` | ADC1 oneshot, 12-bit, 12 dB      |
//! | `Dht11`    | `ClimateDriver` | DHT11 single-wire bus (GPIO 26)  |
//!
//! ## Dual-target design
//!
//! On ESP-IDF both talk to real hardware.  On host/test they read from
//! static atomics so simulations can inject values.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_hal::{
    delay::Ets,
    gpio::{AnyIOPin, InputOutput, PinDriver},
};
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::{info, warn};

use crate::app::ports::{AnalogChannel, ClimateDriver};
use crate::sensors::flame::ADC_FULL_SCALE;

// ── Error type ────────────────────────────────────────────────

/// Errors while bringing up the sensor peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── Simulation injection ──────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_FLAME_RAW: AtomicU16 = AtomicU16::new(ADC_FULL_SCALE);
#[cfg(not(target_os = "espidf"))]
static SIM_HUMIDITY_BITS: AtomicU32 = AtomicU32::new(f32::NAN.to_bits());
#[cfg(not(target_os = "espidf"))]
static SIM_TEMPERATURE_BITS: AtomicU32 = AtomicU32::new(f32::NAN.to_bits());

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_flame_raw(raw: u16) {
    SIM_FLAME_RAW.store(raw, Ordering::Relaxed);
}

/// NaN simulates a failed bus exchange.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_climate(humidity_pct: f32, temperature_c: f32) {
    SIM_HUMIDITY_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
    SIM_TEMPERATURE_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
}

// ───────────────────────────────────────────────────────────────
// Flame sensor ADC
// ───────────────────────────────────────────────────────────────

pub struct FlameAdc {
    #[cfg(target_os = "espidf")]
    unit: adc_oneshot_unit_handle_t,
    #[cfg(target_os = "espidf")]
    channel: u32,
}

impl FlameAdc {
    /// Create ADC1 in oneshot mode and configure `channel` for the full
    /// 0..3.3 V swing of the sensor module.
    #[cfg(target_os = "espidf")]
    pub fn new(channel: u32) -> Result<Self, HwInitError> {
        let init_cfg = adc_oneshot_unit_init_cfg_t {
            unit_id: adc_unit_t_ADC_UNIT_1,
            ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
            ..Default::default()
        };
        let mut unit: adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: called once from main on the boot path.
        let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut unit) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }

        let chan_cfg = adc_oneshot_chan_cfg_t {
            atten: adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        // SAFETY: `unit` was just created above.
        let ret = unsafe { adc_oneshot_config_channel(unit, channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }

        info!("hw: ADC1 CH{} configured (flame)", channel);
        Ok(Self { unit, channel })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(channel: u32) -> Result<Self, HwInitError> {
        log::info!("hw(sim): flame ADC on CH{}", channel);
        Ok(Self {})
    }
}

impl AnalogChannel for FlameAdc {
    /// A failed conversion reads as full-scale (no flame) so that a flaky
    /// ADC can never fire the relay.
    #[cfg(target_os = "espidf")]
    fn read_raw(&mut self) -> u16 {
        let mut raw: i32 = 0;
        // SAFETY: `unit` is owned by this adapter; single-threaded access.
        let ret = unsafe { adc_oneshot_read(self.unit, self.channel, &mut raw) };
        if ret != ESP_OK as i32 {
            warn!("hw: ADC1 read failed (rc={})", ret);
            return ADC_FULL_SCALE;
        }
        raw.clamp(0, i32::from(ADC_FULL_SCALE)) as u16
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_raw(&mut self) -> u16 {
        SIM_FLAME_RAW.load(Ordering::Relaxed)
    }
}

#[cfg(target_os = "espidf")]
impl Drop for FlameAdc {
    fn drop(&mut self) {
        // SAFETY: handle created in `new`, released exactly once.
        unsafe {
            adc_oneshot_del_unit(self.unit);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// DHT11
// ───────────────────────────────────────────────────────────────

/// The DHT11 needs at least a second between exchanges; one exchange
/// serves both the humidity and the temperature getter.
const DHT_SAMPLE_REUSE_MS: u64 = 1_000;

/// Last bus exchange, failed ones included (as a NaN pair), so nothing
/// touches the bus again inside the sensor's minimum interval.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
struct SampleCache {
    /// `(taken_at_ms, humidity, temperature)`.
    last: Option<(u64, f32, f32)>,
}

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
impl SampleCache {
    fn fresh(&self, now_ms: u64) -> Option<(f32, f32)> {
        self.last
            .filter(|(taken, _, _)| now_ms.saturating_sub(*taken) < DHT_SAMPLE_REUSE_MS)
            .map(|(_, h, t)| (h, t))
    }

    fn store(&mut self, now_ms: u64, humidity: f32, temperature: f32) -> (f32, f32) {
        self.last = Some((now_ms, humidity, temperature));
        (humidity, temperature)
    }
}

pub struct Dht11 {
    #[cfg(target_os = "espidf")]
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
    #[cfg(target_os = "espidf")]
    delay: Ets,
    #[cfg(target_os = "espidf")]
    cache: SampleCache,
}

impl Dht11 {
    #[cfg(target_os = "espidf")]
    pub fn new(pin: PinDriver<'static, AnyIOPin, InputOutput>) -> Self {
        Self {
            pin,
            delay: Ets,
            cache: SampleCache::default(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {}
    }

    /// `(humidity, temperature)`, NaN on a failed exchange.
    #[cfg(target_os = "espidf")]
    fn sample(&mut self) -> (f32, f32) {
        use dht_sensor::dht11;

        // SAFETY: reads the high-resolution timer, no preconditions.
        let now_ms = (unsafe { esp_timer_get_time() } as u64) / 1_000;
        if let Some(sample) = self.cache.fresh(now_ms) {
            return sample;
        }

        if let Err(e) = self.pin.set_high() {
            warn!("hw: DHT11 line idle-high failed: {:?}", e);
            return self.cache.store(now_ms, f32::NAN, f32::NAN);
        }
        match dht11::blocking::read(&mut self.delay, &mut self.pin) {
            Ok(r) => self.cache.store(
                now_ms,
                f32::from(r.relative_humidity),
                f32::from(r.temperature),
            ),
            Err(e) => {
                warn!("hw: DHT11 read failed: {:?}", e);
                self.cache.store(now_ms, f32::NAN, f32::NAN)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn sample(&mut self) -> (f32, f32) {
        (
            f32::from_bits(SIM_HUMIDITY_BITS.load(Ordering::Relaxed)),
            f32::from_bits(SIM_TEMPERATURE_BITS.load(Ordering::Relaxed)),
        )
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for Dht11 {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateDriver for Dht11 {
    #[cfg(target_os = "espidf")]
    fn init(&mut self) {
        // Idle-high for the bus; the sensor needs ~1 s after power-up.
        if let Err(e) = self.pin.set_high() {
            warn!("hw: DHT11 init failed: {:?}", e);
        }
        info!("hw: DHT11 ready");
    }

    #[cfg(not(target_os = "espidf"))]
    fn init(&mut self) {
        log::info!("hw(sim): DHT11 ready");
    }

    fn read_humidity_percent(&mut self) -> f32 {
        self.sample().0
    }

    fn read_temperature_celsius(&mut self) -> f32 {
        self.sample().1
    }
}
