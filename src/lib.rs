//! FlameNode firmware library.
//!
//! Exposes the pure-logic modules for integration testing.  All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the whole library builds and tests on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod connection;
pub mod error;
pub mod pins;
pub mod schedule;
pub mod telemetry;

pub mod adapters;
pub mod drivers;
pub mod sensors;
