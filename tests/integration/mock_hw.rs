//! Mock adapters for integration tests.
//!
//! Records every transport call so tests can assert on the full frame
//! history without a printer or real GPIO.

use std::cell::Cell;
use std::collections::VecDeque;
use std::time::Duration;

use filament_bridge::app::events::BridgeEvent;
use filament_bridge::app::ports::{
    Clock, ConfigError, ConfigPort, EventSink, RawSample, SensorPort, Transport, TransportEvent,
};
use filament_bridge::config::BridgeConfig;
use filament_bridge::error::TransportError;
use serde_json::Value;

// ── MockTransport ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    pub connected: bool,
    pub connects: Vec<String>,
    pub disconnects: usize,
    pub sent: Vec<String>,
    pub fail_sends: bool,
    /// A session is open and reconnecting on its own until `disconnect`.
    pub retrying: bool,
    inbound: VecDeque<TransportEvent>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inbound event; connection state follows immediately, as it
    /// does with the IDF client.
    pub fn inject(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => self.connected = true,
            TransportEvent::Disconnected => self.connected = false,
            _ => {}
        }
        self.inbound.push_back(event);
    }

    /// The transport's own reconnect succeeds, if a session is still open.
    pub fn reconnect_lands(&mut self) {
        if self.retrying {
            self.inject(TransportEvent::Connected);
        }
    }

    pub fn inject_json(&mut self, v: &Value) {
        self.inject(TransportEvent::Text(v.to_string()));
    }

    /// Sent frames that are JSON commands (keep-alives excluded).
    pub fn commands(&self) -> Vec<Value> {
        self.sent
            .iter()
            .filter_map(|s| serde_json::from_str(s).ok())
            .collect()
    }

    pub fn commands_with_code(&self, code: u64) -> Vec<Value> {
        self.commands()
            .into_iter()
            .filter(|v| v["Data"]["Cmd"].as_u64() == Some(code))
            .collect()
    }

    pub fn last_request_id(&self) -> Option<String> {
        self.commands()
            .last()
            .and_then(|v| v["Data"]["RequestID"].as_str().map(str::to_owned))
    }
}

impl Transport for MockTransport {
    fn connect(&mut self, uri: &str, _reconnect: Duration) -> Result<(), TransportError> {
        self.connects.push(uri.to_owned());
        self.retrying = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.connected = false;
        self.retrying = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.fail_sends {
            return Err(TransportError::SendFailed);
        }
        self.sent.push(text.to_owned());
        Ok(())
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.inbound.pop_front()
    }
}

// ── MockSensors ───────────────────────────────────────────────

pub struct MockSensors {
    pub sample: RawSample,
}

#[allow(dead_code)]
impl MockSensors {
    pub fn new() -> Self {
        Self {
            sample: RawSample {
                movement_level: false,
                filament_present: true,
            },
        }
    }

    /// Flip the encoder level, as moving filament does.
    pub fn toggle_movement(&mut self) {
        self.sample.movement_level = !self.sample.movement_level;
    }

    pub fn set_filament_present(&mut self, present: bool) {
        self.sample.filament_present = present;
    }
}

impl Default for MockSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockSensors {
    fn sample(&mut self) -> RawSample {
        self.sample
    }
}

// ── ManualClock ───────────────────────────────────────────────

pub struct ManualClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn unix_secs(&self) -> u64 {
        1_700_000_000 + self.now.get() / 1000
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<BridgeEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&BridgeEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BridgeEvent) {
        self.events.push(event.clone());
    }
}

// ── MemorySettings ────────────────────────────────────────────

#[derive(Default)]
pub struct MemorySettings {
    pub saved: std::cell::RefCell<Vec<BridgeConfig>>,
}

impl ConfigPort for MemorySettings {
    fn load(&self) -> Result<BridgeConfig, ConfigError> {
        Ok(self.saved.borrow().last().cloned().unwrap_or_default())
    }

    fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.saved.borrow_mut().push(config.clone());
        Ok(())
    }
}
