//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService (domain)
//! ```
//!
//! Driven adapters (GPIO sensors, the printer WebSocket, clocks, event
//! sinks, settings storage) implement these traits.  The
//! [`BridgeService`](super::service::BridgeService) consumes them via
//! generics, so the domain core never touches hardware or sockets directly.

use core::time::Duration;

use crate::config::BridgeConfig;
use crate::error::TransportError;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Logic levels of both filament sensors, already mapped to domain meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// Raw level of the movement encoder.  Only changes matter, not polarity.
    pub movement_level: bool,
    /// Runout switch reports filament present.
    pub filament_present: bool,
}

/// Read-side port: the domain calls this once per control cycle.
pub trait SensorPort {
    fn sample(&mut self) -> RawSample;
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain ↔ printer WebSocket)
// ───────────────────────────────────────────────────────────────

/// Asynchronous happenings on the printer connection, queued by the
/// transport between control cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    /// A complete text frame.
    Text(String),
    /// A binary frame of the given length (unsupported by the protocol).
    Binary(usize),
    Error(String),
}

/// Message-oriented, persistent connection to the printer.
///
/// Implementations own reconnection after an unexpected drop (retrying
/// every `reconnect_interval`); the client only decides *where* to connect.
pub trait Transport {
    /// Open a connection to `uri`.  Completion is reported later as
    /// [`TransportEvent::Connected`].
    fn connect(&mut self, uri: &str, reconnect_interval: Duration) -> Result<(), TransportError>;

    /// Close the connection and stop reconnecting.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Send one text frame.
    fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// Next queued inbound event, if any.  Never blocks.
    fn poll_event(&mut self) -> Option<TransportEvent>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait Clock {
    /// Monotonic milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Wall-clock seconds since the Unix epoch, or 0 before time sync.
    fn unix_secs(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / status surface)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`BridgeEvent`](super::events::BridgeEvent)s
/// through this port.  Adapters decide where they go (serial log, in-memory
/// ring buffer for the status page, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::BridgeEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent settings)
// ───────────────────────────────────────────────────────────────

/// Loads and persists bridge configuration.
///
/// Implementations MUST call [`BridgeConfig::validate`] before persisting.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`BridgeConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<BridgeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &BridgeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
