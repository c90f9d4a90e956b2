//! Random source for MQTT client identifiers.
//!
//! - **`target_os = "espidf"`**: the hardware RNG (`esp_random`), which is
//!   truly random once the radio is running.
//! - **all other targets**: xorshift32 seeded from the host clock, or from
//!   a fixed seed for reproducible runs.

use crate::app::ports::EntropySource;

pub struct HardwareRng {
    #[cfg(not(target_os = "espidf"))]
    state: u32,
}

impl Default for HardwareRng {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareRng {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0x5EED);
        Self::seeded(nanos)
    }

    /// Deterministic sequence (simulation only).
    #[cfg(not(target_os = "espidf"))]
    pub fn seeded(seed: u32) -> Self {
        // xorshift has a fixed point at zero.
        Self {
            state: if seed == 0 { 0x9E37_79B9 } else { seed },
        }
    }
}

impl EntropySource for HardwareRng {
    #[cfg(target_os = "espidf")]
    fn next_u16(&mut self) -> u16 {
        // SAFETY: reads the RNG register, no preconditions.
        (unsafe { esp_idf_svc::sys::esp_random() } >> 16) as u16
    }

    #[cfg(not(target_os = "espidf"))]
    fn next_u16(&mut self) -> u16 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x >> 16) as u16
    }
}
