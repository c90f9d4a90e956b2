//! Connection manager — WiFi link plus MQTT session.
//!
//! ```text
//!                 ensure_connected()
//!  Disconnected ─────────────────────▶ Connecting ──────────▶ Connected
//!        ▲                               │  link poll (500 ms)     │
//!        │                               │  handshake retry (5 s)  │
//!        └──── gate refused ◀────────────┘                         │
//!        └──────────────── link or session dropped ◀───────────────┘
//! ```
//!
//! ## Reconnection policy
//!
//! The node has nothing better to do while offline, so reconnecting never
//! gives up on its own: link-status is polled at a fixed step until the
//! station is associated, then the handshake is retried at a fixed delay
//! with a fresh random client id each time.  A [`RetryGate`] is consulted
//! before every poll and every handshake; [`Forever`] keeps the unbounded
//! behaviour, [`MaxAttempts`] and [`Deadline`] bound it.

use core::fmt::Write;
use core::net::Ipv4Addr;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::app::ports::{Clock, EntropySource, LinkStatus, MessagingSession, NetworkLink};
use crate::config::{NetworkConfig, NodeConfig};
use crate::error::{ConnectError, LinkFailure, PublishFailure, SessionFailure};

pub type ClientId = heapless::String<32>;

/// Connection state as observed by the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Where a reconnect is about to spend time next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// About to wait one poll step for the link; `polls` already made.
    LinkPoll { polls: u32 },
    /// About to attempt a handshake; `attempt` already failed.
    Session { attempt: u32 },
}

// ───────────────────────────────────────────────────────────────
// Retry gates
// ───────────────────────────────────────────────────────────────

/// Decides whether a blocking reconnect may keep going.
pub trait RetryGate {
    fn proceed(&mut self, step: RetryStep) -> bool;
}

/// Never cancel.
pub struct Forever;

impl RetryGate for Forever {
    fn proceed(&mut self, _step: RetryStep) -> bool {
        true
    }
}

/// Allow at most `n` link polls and `n` handshake attempts.
pub struct MaxAttempts(pub u32);

impl RetryGate for MaxAttempts {
    fn proceed(&mut self, step: RetryStep) -> bool {
        match step {
            RetryStep::LinkPoll { polls } => polls < self.0,
            RetryStep::Session { attempt } => attempt < self.0,
        }
    }
}

/// Cancel once the clock reaches `until_ms`.
pub struct Deadline<K> {
    clock: K,
    until_ms: u64,
}

impl<K: Clock> Deadline<K> {
    pub fn new(clock: K, until_ms: u64) -> Self {
        Self { clock, until_ms }
    }
}

impl<K: Clock> RetryGate for Deadline<K> {
    fn proceed(&mut self, _step: RetryStep) -> bool {
        self.clock.now_ms() < self.until_ms
    }
}

impl<F: FnMut(RetryStep) -> bool> RetryGate for F {
    fn proceed(&mut self, step: RetryStep) -> bool {
        self(step)
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectionManager
// ───────────────────────────────────────────────────────────────

pub struct ConnectionManager<L, S, E> {
    link: L,
    session: S,
    entropy: E,
    network: NetworkConfig,
    client_id_prefix: heapless::String<16>,
    link_poll_ms: u32,
    session_retry_ms: u32,
    state: ConnectionState,
    client_id: ClientId,
}

impl<L, S, E> ConnectionManager<L, S, E>
where
    L: NetworkLink,
    S: MessagingSession,
    E: EntropySource,
{
    pub fn new(link: L, session: S, entropy: E, config: &NodeConfig) -> Self {
        Self {
            link,
            session,
            entropy,
            network: config.network.clone(),
            client_id_prefix: config.broker.client_id_prefix.clone(),
            link_poll_ms: config.timing.link_poll_ms,
            session_retry_ms: config.timing.session_retry_ms,
            state: ConnectionState::Disconnected,
            client_id: ClientId::new(),
        }
    }

    /// Link up *and* session established.
    pub fn is_connected(&mut self) -> bool {
        self.link.link_status() == LinkStatus::Up && self.session.connected()
    }

    pub fn state(&mut self) -> ConnectionState {
        if self.state == ConnectionState::Connected && !self.is_connected() {
            self.state = ConnectionState::Disconnected;
        }
        self.state
    }

    /// Block until link and session are both up, or `gate` refuses to wait
    /// any longer.
    pub fn ensure_connected(
        &mut self,
        delay: &mut impl DelayNs,
        gate: &mut impl RetryGate,
    ) -> Result<(), ConnectError> {
        if self.is_connected() {
            self.state = ConnectionState::Connected;
            return Ok(());
        }
        self.state = ConnectionState::Connecting;

        let mut polls = 0u32;
        let mut attempts = 0u32;
        loop {
            if let Err(e) = self.bring_up_link(delay, gate, &mut polls, attempts) {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
            if self.session.connected() {
                break;
            }

            if !gate.proceed(RetryStep::Session { attempt: attempts }) {
                self.state = ConnectionState::Disconnected;
                return Err(ConnectError::Cancelled {
                    link_polls: polls,
                    session_attempts: attempts,
                });
            }
            attempts += 1;

            self.client_id = self.fresh_client_id();
            info!("Attempting MQTT connection... (client id {})", self.client_id);
            if self.session.connect(&self.client_id) {
                info!("MQTT connected");
                break;
            }

            let failure = SessionFailure {
                rc: self.session.state_code(),
            };
            warn!(
                "{} — try again in {} seconds",
                failure,
                self.session_retry_ms / 1000
            );
            delay.delay_ms(self.session_retry_ms);
        }

        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Send one message on the established session.  A silently dropped
    /// session is only noticed by the next [`is_connected`] check.
    ///
    /// [`is_connected`]: ConnectionManager::is_connected
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishFailure> {
        if self.session.publish(topic, payload) {
            Ok(())
        } else {
            Err(PublishFailure::Rejected)
        }
    }

    /// Keepalives and inbound traffic; call once per loop iteration.
    pub fn service_session(&mut self) {
        self.session.service();
    }

    /// Client id of the most recent handshake attempt.
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn local_address(&self) -> Option<Ipv4Addr> {
        self.link.local_address()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    // ── Internal ──────────────────────────────────────────────

    fn bring_up_link(
        &mut self,
        delay: &mut impl DelayNs,
        gate: &mut impl RetryGate,
        polls: &mut u32,
        attempts: u32,
    ) -> Result<(), ConnectError> {
        let mut began = false;
        loop {
            match self.link.link_status() {
                LinkStatus::Up => break,
                LinkStatus::Down => {
                    if began {
                        warn!("WiFi: {}, restarting association", LinkFailure::AssociationLost);
                    }
                    info!("Connecting to {}", self.network.ssid);
                    self.link
                        .begin_link(&self.network.ssid, &self.network.password);
                    began = true;
                }
                LinkStatus::Connecting => debug!("."),
            }

            if !gate.proceed(RetryStep::LinkPoll { polls: *polls }) {
                return Err(ConnectError::Cancelled {
                    link_polls: *polls,
                    session_attempts: attempts,
                });
            }
            delay.delay_ms(self.link_poll_ms);
            *polls += 1;
        }

        if *polls > 0 || began {
            info!("WiFi connected");
            match self.link.local_address() {
                Some(ip) => info!("IP address: {}", ip),
                None => info!("IP address: (pending)"),
            }
        }
        Ok(())
    }

    /// `<prefix><hex>` with the suffix drawn from `[0, 0xffff)`.
    fn fresh_client_id(&mut self) -> ClientId {
        let suffix = self.entropy.next_u16() % 0xffff;
        let mut id = ClientId::new();
        // 16-byte prefix plus at most four hex digits fits.
        let _ = write!(id, "{}{:x}", self.client_id_prefix, suffix);
        id
    }
}
