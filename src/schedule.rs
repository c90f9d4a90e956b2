//! Periodic publish window.
//!
//! The alarm path publishes whenever it must; climate + light telemetry
//! goes out at most once per window.  A window is only consumed by a
//! *successful* climate read: [`ScheduleClock::mark_published`] is the
//! single place that moves the window forward.

/// Monotonic bookkeeping for the periodic publish.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleClock {
    interval_ms: u64,
    /// `None` until the first periodic publish; the first window is due
    /// immediately.
    last_publish_ms: Option<u64>,
}

impl ScheduleClock {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_publish_ms: None,
        }
    }

    /// `true` when `now - last_publish >= interval`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_publish_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    pub fn mark_published(&mut self, now_ms: u64) {
        self.last_publish_ms = Some(now_ms);
    }

    pub fn last_publish_ms(&self) -> Option<u64> {
        self.last_publish_ms
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}
