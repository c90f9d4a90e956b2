//! Output drivers and board supervision.

pub mod relay;
pub mod watchdog;
