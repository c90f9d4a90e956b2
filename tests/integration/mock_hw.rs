//! Mock adapters for integration tests.
//!
//! Every mock hands out a shared handle (`Rc<RefCell<..>>` / `Rc<Cell<..>>`)
//! so a test can script inputs and inspect the recorded history after the
//! adapter has been moved into the telemetry loop.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::net::Ipv4Addr;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use flamenode::app::events::AppEvent;
use flamenode::app::ports::{
    AnalogChannel, ClimateDriver, Clock, EntropySource, EventSink, LinkStatus, MessagingSession,
    NetworkLink,
};
use flamenode::app::service::TelemetryLoop;
use flamenode::config::NodeConfig;
use flamenode::connection::ConnectionManager;
use flamenode::drivers::relay::{ActuatorController, Polarity};
use flamenode::sensors::SensorReader;

// ── Clock ─────────────────────────────────────────────────────

/// Simulated time; delays advance it instantly.
#[derive(Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

#[allow(dead_code)]
impl SimClock {
    pub fn at(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns) / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

// ── Network link ──────────────────────────────────────────────

#[derive(Default)]
pub struct LinkState {
    /// Status polls after `begin_link` before the link reports `Up`.
    pub up_after_polls: u32,
    /// Never comes up.
    pub dead: bool,
    pub begun: bool,
    pub polls_since_begin: u32,
    pub begins: u32,
    pub last_ssid: String,
}

#[derive(Clone, Default)]
pub struct MockLink(pub Rc<RefCell<LinkState>>);

#[allow(dead_code)]
impl MockLink {
    pub fn up_after(polls: u32) -> Self {
        let link = Self::default();
        link.0.borrow_mut().up_after_polls = polls;
        link
    }

    /// Already associated before the first poll.
    pub fn associated() -> Self {
        let link = Self::default();
        link.0.borrow_mut().begun = true;
        link
    }

    pub fn drop_link(&self) {
        let mut s = self.0.borrow_mut();
        s.begun = false;
        s.polls_since_begin = 0;
    }

    pub fn is_up(&self) -> bool {
        let s = self.0.borrow();
        s.begun && !s.dead && s.polls_since_begin >= s.up_after_polls
    }
}

impl NetworkLink for MockLink {
    fn begin_link(&mut self, ssid: &str, _credential: &str) {
        let mut s = self.0.borrow_mut();
        s.begun = true;
        s.polls_since_begin = 0;
        s.begins += 1;
        s.last_ssid = ssid.to_string();
    }

    fn link_status(&mut self) -> LinkStatus {
        if self.is_up() {
            return LinkStatus::Up;
        }
        let mut s = self.0.borrow_mut();
        if !s.begun {
            return LinkStatus::Down;
        }
        s.polls_since_begin += 1;
        drop(s);
        if self.is_up() {
            LinkStatus::Up
        } else {
            LinkStatus::Connecting
        }
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        self.is_up().then_some(Ipv4Addr::new(10, 0, 0, 7))
    }
}

// ── Messaging session ─────────────────────────────────────────

#[derive(Default)]
pub struct SessionState {
    pub connected: bool,
    /// Handshakes still to refuse; `u32::MAX` refuses forever.
    pub refuse_remaining: u32,
    pub reject_publish: bool,
    pub client_ids: Vec<String>,
    pub published: Vec<(String, String)>,
    pub serviced: u32,
    pub rc: i32,
}

#[derive(Clone, Default)]
pub struct MockSession(pub Rc<RefCell<SessionState>>);

#[allow(dead_code)]
impl MockSession {
    pub fn refusing(n: u32) -> Self {
        let s = Self::default();
        s.0.borrow_mut().refuse_remaining = n;
        s
    }

    pub fn drop_session(&self) {
        self.0.borrow_mut().connected = false;
    }

    pub fn payloads(&self) -> Vec<String> {
        self.0.borrow().published.iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn attempts(&self) -> usize {
        self.0.borrow().client_ids.len()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().published.clear();
    }
}

impl MessagingSession for MockSession {
    fn connect(&mut self, client_id: &str) -> bool {
        let mut s = self.0.borrow_mut();
        s.client_ids.push(client_id.to_string());
        if s.refuse_remaining > 0 {
            if s.refuse_remaining != u32::MAX {
                s.refuse_remaining -= 1;
            }
            s.connected = false;
            s.rc = -2;
            return false;
        }
        s.connected = true;
        s.rc = 0;
        true
    }

    fn connected(&self) -> bool {
        self.0.borrow().connected
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> bool {
        let mut s = self.0.borrow_mut();
        if !s.connected || s.reject_publish {
            return false;
        }
        let text = String::from_utf8_lossy(payload).into_owned();
        s.published.push((topic.to_string(), text));
        true
    }

    fn service(&mut self) {
        self.0.borrow_mut().serviced += 1;
    }

    fn state_code(&self) -> i32 {
        self.0.borrow().rc
    }
}

// ── Sensors ───────────────────────────────────────────────────

/// Flame ADC: scripted raw values, then a steady fallback.
#[derive(Clone)]
pub struct FakeAdc {
    script: Rc<RefCell<VecDeque<u16>>>,
    steady: Rc<Cell<u16>>,
}

impl Default for FakeAdc {
    fn default() -> Self {
        Self {
            script: Rc::default(),
            steady: Rc::new(Cell::new(4095)),
        }
    }
}

#[allow(dead_code)]
impl FakeAdc {
    pub fn set(&self, raw: u16) {
        self.script.borrow_mut().clear();
        self.steady.set(raw);
    }

    pub fn queue(&self, raws: &[u16]) {
        self.script.borrow_mut().extend(raws.iter().copied());
    }
}

impl AnalogChannel for FakeAdc {
    fn read_raw(&mut self) -> u16 {
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.steady.get())
    }
}

/// DHT11: fixed `(humidity, temperature)`, NaN for a failed exchange.
#[derive(Clone)]
pub struct FakeDht {
    values: Rc<Cell<(f32, f32)>>,
    pub reads: Rc<Cell<u32>>,
}

impl Default for FakeDht {
    fn default() -> Self {
        Self {
            values: Rc::new(Cell::new((50.0, 20.0))),
            reads: Rc::default(),
        }
    }
}

impl FakeDht {
    pub fn set(&self, humidity: f32, temperature: f32) {
        self.values.set((humidity, temperature));
    }
}

impl ClimateDriver for FakeDht {
    fn init(&mut self) {}

    fn read_humidity_percent(&mut self) -> f32 {
        self.reads.set(self.reads.get() + 1);
        self.values.get().0
    }

    fn read_temperature_celsius(&mut self) -> f32 {
        self.values.get().1
    }
}

// ── Relay pin ─────────────────────────────────────────────────

/// Output pin remembering its last level (`Some(true)` = HIGH).
#[derive(Clone, Default)]
pub struct LevelPin(pub Rc<Cell<Option<bool>>>);

impl LevelPin {
    pub fn is_high(&self) -> bool {
        self.0.get() == Some(true)
    }
}

impl ErrorType for LevelPin {
    type Error = Infallible;
}

impl OutputPin for LevelPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(Some(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(Some(true));
        Ok(())
    }
}

// ── Entropy ───────────────────────────────────────────────────

/// Counts up by a fixed step so consecutive client ids differ.
pub struct StepEntropy(pub u16);

impl EntropySource for StepEntropy {
    fn next_u16(&mut self) -> u16 {
        self.0 = self.0.wrapping_add(0x0101);
        self.0
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Assembled rig ─────────────────────────────────────────────

pub type Manager = ConnectionManager<MockLink, MockSession, StepEntropy>;
pub type Loop = TelemetryLoop<FakeAdc, FakeDht, LevelPin, MockLink, MockSession, StepEntropy>;

pub fn manager(link: MockLink, session: MockSession) -> Manager {
    ConnectionManager::new(link, session, StepEntropy(0), &NodeConfig::default())
}

/// Telemetry loop on the default configuration plus handles to every mock.
pub struct Rig {
    pub app: Loop,
    pub clock: SimClock,
    pub link: MockLink,
    pub session: MockSession,
    pub adc: FakeAdc,
    pub dht: FakeDht,
    pub relay: LevelPin,
    pub sink: RecordingSink,
}

impl Rig {
    pub fn new() -> Self {
        let link = MockLink::associated();
        let session = MockSession::default();
        let adc = FakeAdc::default();
        let dht = FakeDht::default();
        let relay = LevelPin::default();
        let config = NodeConfig::default();

        let sensors = SensorReader::new(adc.clone(), dht.clone());
        let actuator = ActuatorController::new(
            relay.clone(),
            Polarity::ActiveLow,
            config.timing.relay_settle_ms,
        );
        let connection = manager(link.clone(), session.clone());
        let mut sink = RecordingSink::default();
        let mut app = TelemetryLoop::new(sensors, actuator, connection, &config);
        app.start(&mut sink);

        Self {
            app,
            clock: SimClock::default(),
            link,
            session,
            adc,
            dht,
            relay,
            sink,
        }
    }
}
