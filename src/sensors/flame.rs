//! KY-026 flame sensor (IR phototransistor, analog output).
//!
//! The module's analog output sits at full scale in darkness and drops
//! towards 0 as IR intensity rises, so the remap onto 0..=100 is inverted:
//! raw 4095 → 0 (dark), raw 0 → 100 (full flame).  Integer arithmetic
//! truncates towards zero, then the result is clamped.

use crate::app::ports::AnalogChannel;

/// Native full-scale reading of the 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4095;

/// Map a raw ADC sample onto flame intensity `0..=100`.
///
/// Never fails: raw values above full scale clamp to 0.
pub fn remap_flame(raw: u16) -> u8 {
    let raw = i32::from(raw);
    let full = i32::from(ADC_FULL_SCALE);
    let mapped = (raw - full) * 100 / -full;
    mapped.clamp(0, 100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlameReading {
    pub raw: u16,
    pub intensity: u8,
}

pub struct FlameSensor<A> {
    channel: A,
}

impl<A: AnalogChannel> FlameSensor<A> {
    pub fn new(channel: A) -> Self {
        Self { channel }
    }

    pub fn read(&mut self) -> FlameReading {
        let raw = self.channel.read_raw();
        FlameReading {
            raw,
            intensity: remap_flame(raw),
        }
    }
}
