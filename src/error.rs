//! Unified error types for the FlameNode firmware.
//!
//! One enum per failure domain, each with a hand-written `Display`.  Sensor,
//! relay and publish failures are recovered inside the telemetry loop; only a
//! cancelled reconnect escapes a tick as [`Error`].

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Failure surfaced by a telemetry-loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A reconnect was abandoned by its retry gate.
    Connect(ConnectError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(e) => write!(f, "connect: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor failures
// ---------------------------------------------------------------------------

/// The climate sensor returned an invalid measurement.
///
/// The caller must skip the whole periodic publish for this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFailure {
    /// Humidity read came back NaN (timing / checksum failure on the bus).
    HumidityUnavailable,
    /// Temperature read came back NaN.
    TemperatureUnavailable,
    /// Humidity outside 0..=100 %RH.
    HumidityOutOfRange,
    /// Temperature outside the sensor's physical range.
    TemperatureOutOfRange,
}

impl fmt::Display for SensorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HumidityUnavailable => write!(f, "humidity reading unavailable"),
            Self::TemperatureUnavailable => write!(f, "temperature reading unavailable"),
            Self::HumidityOutOfRange => write!(f, "humidity out of physical range"),
            Self::TemperatureOutOfRange => write!(f, "temperature out of physical range"),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO level write failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Communications failures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkFailure {
    /// The access point dropped or refused association.
    AssociationLost,
    /// The driver rejected the begin request.
    BeginRejected,
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssociationLost => write!(f, "WiFi association lost"),
            Self::BeginRejected => write!(f, "WiFi driver rejected connect"),
        }
    }
}

/// Broker refused or never answered the handshake; carries the transport's
/// state code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionFailure {
    pub rc: i32,
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MQTT handshake failed, rc={}", self.rc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishFailure {
    /// The payload could not be serialised.
    Encode,
    /// The transport refused the message.
    Rejected,
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode => write!(f, "payload encoding failed"),
            Self::Rejected => write!(f, "MQTT publish rejected"),
        }
    }
}

/// A reconnect stopped before the session came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// The retry gate refused another link poll or session attempt.
    Cancelled { link_polls: u32, session_attempts: u32 },
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled {
                link_polls,
                session_attempts,
            } => write!(
                f,
                "reconnect cancelled after {} link polls and {} session attempts",
                link_polls, session_attempts
            ),
        }
    }
}

impl From<ConnectError> for Error {
    fn from(e: ConnectError) -> Self {
        Self::Connect(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A compiled-in configuration value failed validation.
/// The `&'static str` names the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
