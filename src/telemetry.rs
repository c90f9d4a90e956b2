//! Telemetry readings and their wire encoding.
//!
//! Every event goes out as one compact JSON object on the node's topic:
//!
//! ```text
//! {"type":"temp","value":23}
//! {"type":"humid","value":61}
//! {"type":"light","value":100}
//! ```
//!
//! Values are integers after sensor-specific normalisation.  Readings are
//! built per sample and dropped once published.

use serde::Serialize;

use crate::error::PublishFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadingKind {
    #[serde(rename = "temp")]
    Temperature,
    #[serde(rename = "humid")]
    Humidity,
    /// Flame (IR light) intensity, 0..=100.
    #[serde(rename = "light")]
    LightIntensity,
}

impl ReadingKind {
    /// Label used in the serial log.
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temp",
            Self::Humidity => "Humid",
            Self::LightIntensity => "Flame",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reading {
    #[serde(rename = "type")]
    pub kind: ReadingKind,
    pub value: i32,
}

impl Reading {
    pub fn temperature(celsius: i32) -> Self {
        Self {
            kind: ReadingKind::Temperature,
            value: celsius,
        }
    }

    pub fn humidity(percent: i32) -> Self {
        Self {
            kind: ReadingKind::Humidity,
            value: percent,
        }
    }

    pub fn light(intensity: u8) -> Self {
        Self {
            kind: ReadingKind::LightIntensity,
            value: i32::from(intensity),
        }
    }

    /// Serialise to the wire payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, PublishFailure> {
        serde_json::to_vec(self).map_err(|_| PublishFailure::Encode)
    }
}
