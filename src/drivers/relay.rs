//! Suppression relay driver.
//!
//! ```text
//!            engage(now, d)              poll(now >= until)
//!   Idle ───────────────────▶ Engaged ───────────────────────▶ Idle
//!     ▲                        │ engage(..) ignored                │
//!     └──── settle hold-off ◀──┘ until the dwell expires ◀─────────┘
//! ```
//!
//! Once engaged the output stays at its active level for the full dwell,
//! whatever the sensors say in the meantime.  Release is detected by
//! polling from the loop, not by a timer interrupt.  After a release the
//! relay cannot be re-armed for a short settle hold-off.
//!
//! The pin is any `embedded-hal` [`OutputPin`]; polarity is configurable
//! because common relay modules energise on LOW.

use embedded_hal::digital::{OutputPin, PinState};
use log::{info, warn};

use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    fn level(self, active: bool) -> PinState {
        match (self, active) {
            (Self::ActiveHigh, true) | (Self::ActiveLow, false) => PinState::High,
            (Self::ActiveHigh, false) | (Self::ActiveLow, true) => PinState::Low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorState {
    Idle,
    Engaged { until_ms: u64 },
}

/// Result of an [`ActuatorController::engage`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngageOutcome {
    /// Output driven active until `until_ms`.
    Engaged { until_ms: u64 },
    /// Already engaged; the running dwell is not extended.
    AlreadyEngaged { until_ms: u64 },
    /// Just released; re-arming is allowed from `until_ms`.
    Settling { until_ms: u64 },
}

pub struct ActuatorController<P> {
    pin: P,
    polarity: Polarity,
    state: ActuatorState,
    settle_ms: u64,
    rearm_at_ms: u64,
}

impl<P: OutputPin> ActuatorController<P> {
    /// Take ownership of the pin and drive it to the safe level.
    pub fn new(pin: P, polarity: Polarity, settle_ms: u64) -> Self {
        let mut ctl = Self {
            pin,
            polarity,
            state: ActuatorState::Idle,
            settle_ms,
            rearm_at_ms: 0,
        };
        if let Err(e) = ctl.drive(false) {
            warn!("Relay: failed to drive safe level at init — {}", e);
        }
        ctl
    }

    /// Energise the relay for `duration_ms` starting at `now_ms`.
    pub fn engage(&mut self, now_ms: u64, duration_ms: u64) -> EngageOutcome {
        if let ActuatorState::Engaged { until_ms } = self.state {
            return EngageOutcome::AlreadyEngaged { until_ms };
        }
        if now_ms < self.rearm_at_ms {
            return EngageOutcome::Settling {
                until_ms: self.rearm_at_ms,
            };
        }

        let until_ms = now_ms.saturating_add(duration_ms);
        if let Err(e) = self.drive(true) {
            warn!("Relay: engage write failed — {}", e);
        }
        self.state = ActuatorState::Engaged { until_ms };
        info!("FIRE! Relay ON (until t={}ms)", until_ms);
        EngageOutcome::Engaged { until_ms }
    }

    /// Release the relay if its dwell has elapsed.  Returns `true` on the
    /// poll that performed the release.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match self.state {
            ActuatorState::Engaged { until_ms } if now_ms >= until_ms => {
                if let Err(e) = self.drive(false) {
                    warn!("Relay: release write failed — {}", e);
                }
                self.state = ActuatorState::Idle;
                self.rearm_at_ms = now_ms.saturating_add(self.settle_ms);
                info!("Relay OFF");
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn is_engaged(&self) -> bool {
        matches!(self.state, ActuatorState::Engaged { .. })
    }

    /// Earliest time a new `engage` is honoured.
    pub fn rearm_at_ms(&self) -> u64 {
        self.rearm_at_ms
    }

    fn drive(&mut self, active: bool) -> Result<(), ActuatorError> {
        self.pin
            .set_state(self.polarity.level(active))
            .map_err(|_| ActuatorError::GpioWriteFailed)
    }
}
