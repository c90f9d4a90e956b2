//! Application core — the telemetry loop and its port boundary.
//!
//! All interaction with hardware and the network happens through the
//! **port traits** in [`ports`], keeping this layer testable on the host.

pub mod events;
pub mod ports;
pub mod service;
