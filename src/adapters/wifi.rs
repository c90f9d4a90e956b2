//! WiFi station-mode adapter.
//!
//! Implements [`NetworkLink`], the hexagonal boundary for the link layer.
//! `begin_link` only starts association; the connection manager polls
//! [`NetworkLink::link_status`] until the station has an address.
//!
//! The station driver does not re-associate on its own.  A link that was up
//! and went away, or an association still pending after
//! [`ASSOCIATION_POLL_LIMIT`] polls, reports `Down` so the manager begins
//! again.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation that associates after a configurable
//!   number of status polls.

use core::net::Ipv4Addr;

use log::{error, info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

use crate::app::ports::{LinkStatus, NetworkLink};
use crate::error::LinkFailure;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), LinkFailure> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkFailure::BeginRejected);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkFailure> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkFailure::BeginRejected);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

/// `Connecting` polls after `begin_link` before the attempt is abandoned
/// (10 s at the default 500 ms poll step).
pub const ASSOCIATION_POLL_LIMIT: u32 = 20;

pub struct WifiLink {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    begun: bool,
    was_up: bool,
    pending_polls: u32,
    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

#[cfg(not(target_os = "espidf"))]
struct SimRadio {
    polls_to_associate: u32,
    polls_since_begin: u32,
    associated: bool,
    /// AP gone; nothing associates until the next `begin_link`.
    lost: bool,
    begins: u32,
}

impl WifiLink {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            wifi,
            begun: false,
            was_up: false,
            pending_polls: 0,
        }
    }

    /// Simulated station that reports `Up` on the `polls_to_associate`-th
    /// status poll after `begin_link`.
    #[cfg(not(target_os = "espidf"))]
    pub fn new(polls_to_associate: u32) -> Self {
        Self {
            begun: false,
            was_up: false,
            pending_polls: 0,
            sim: SimRadio {
                polls_to_associate,
                polls_since_begin: 0,
                associated: false,
                lost: false,
                begins: 0,
            },
        }
    }

    /// Drop the simulated association, as if the AP went away.  Like the
    /// real driver, the station stays disassociated until begun again.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_drop(&mut self) {
        info!("WiFi(sim): association lost");
        self.sim.associated = false;
        self.sim.lost = true;
    }

    /// Number of `begin_link` calls that reached the radio.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_begins(&self) -> u32 {
        self.sim.begins
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkFailure> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| LinkFailure::BeginRejected)?,
            password: password.try_into().map_err(|_| LinkFailure::BeginRejected)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&conf)
            .map_err(|_| LinkFailure::BeginRejected)?;
        if self.wifi.is_started().unwrap_or(false) {
            // Abort a stale attempt; fails harmlessly when already idle.
            if let Err(e) = self.wifi.disconnect() {
                log::debug!("WiFi: disconnect before re-begin: {}", e);
            }
        } else {
            self.wifi.start().map_err(|_| LinkFailure::BeginRejected)?;
        }
        self.wifi.connect().map_err(|_| LinkFailure::BeginRejected)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin(&mut self, ssid: &str, _password: &str) -> Result<(), LinkFailure> {
        info!("WiFi(sim): associating with '{}'", ssid);
        self.sim.polls_since_begin = 0;
        self.sim.associated = false;
        self.sim.lost = false;
        self.sim.begins += 1;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_up(&mut self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_up(&mut self) -> bool {
        if self.begun && !self.sim.associated && !self.sim.lost {
            self.sim.polls_since_begin += 1;
            self.sim.associated = self.sim.polls_since_begin >= self.sim.polls_to_associate;
        }
        self.sim.associated
    }

    #[cfg(target_os = "espidf")]
    fn platform_address(&self) -> Option<Ipv4Addr> {
        self.wifi
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|info| info.ip)
            .filter(|ip| !ip.is_unspecified())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_address(&self) -> Option<Ipv4Addr> {
        self.sim.associated.then_some(Ipv4Addr::new(192, 168, 4, 2))
    }
}

// ───────────────────────────────────────────────────────────────
// NetworkLink
// ───────────────────────────────────────────────────────────────

impl NetworkLink for WifiLink {
    fn begin_link(&mut self, ssid: &str, credential: &str) {
        let result = validate_ssid(ssid)
            .and_then(|()| validate_password(credential))
            .and_then(|()| self.platform_begin(ssid, credential));
        self.was_up = false;
        self.pending_polls = 0;
        match result {
            Ok(()) => self.begun = true,
            Err(e) => {
                error!("WiFi: {} (SSID='{}')", e, ssid);
                self.begun = false;
            }
        }
    }

    fn link_status(&mut self) -> LinkStatus {
        if self.platform_is_up() {
            self.was_up = true;
            self.pending_polls = 0;
            return LinkStatus::Up;
        }
        if self.was_up {
            warn!("WiFi: {}", LinkFailure::AssociationLost);
            self.was_up = false;
            self.begun = false;
        }
        if !self.begun {
            return LinkStatus::Down;
        }

        self.pending_polls += 1;
        if self.pending_polls >= ASSOCIATION_POLL_LIMIT {
            warn!("WiFi: no association after {} polls", self.pending_polls);
            self.begun = false;
            return LinkStatus::Down;
        }
        LinkStatus::Connecting
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.platform_address()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
