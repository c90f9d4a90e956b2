//! GPIO / peripheral pin assignments for the FlameNode board (ESP32-WROOM).
//!
//! Single source of truth — drivers and `main` reference this module rather
//! than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// KY-026 flame sensor, analog output.  ADC1 channel 6 (GPIO 34, input-only).
/// Full-scale (4095) in darkness, falls towards 0 as IR intensity rises.
pub const FLAME_ADC_GPIO: i32 = 34;

/// ADC1 channel wired to [`FLAME_ADC_GPIO`].
pub const FLAME_ADC1_CHANNEL: u32 = 6;

/// KY-015 (DHT11) single-wire data line, open-drain with pull-up.
pub const DHT_DATA_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Suppression relay module input.
pub const RELAY_GPIO: i32 = 27;

/// The relay module energises its coil when the input is pulled LOW.
pub const RELAY_ACTIVE_LOW: bool = true;
