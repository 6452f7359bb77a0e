//! Printer connection client.
//!
//! Owns the [`Transport`], the connection endpoint, the adopted device
//! identity, the [`PrinterStatus`] snapshot and the [`AckTracker`].  The
//! control loop calls [`PrinterClient::housekeeping`] once per cycle, then
//! reads state and issues commands.

use core::fmt;
use core::time::Duration;

use log::{debug, error, info, warn};
use serde_json::Value;

use super::ack::{AckMatching, AckTracker, PendingCommand};
use super::protocol::{self, Command, Inbound, KEEPALIVE_FRAME};
use super::status::PrinterStatus;
use crate::app::events::BridgeEvent;
use crate::app::ports::{Clock, EventSink, Transport, TransportEvent};
use crate::config::BridgeConfig;

/// Interval handed to the transport for its own reconnect attempts.
pub const RECONNECT_INTERVAL: Duration = Duration::from_millis(3000);

/// Minimum spacing between keep-alive frames.
pub const KEEPALIVE_INTERVAL_MS: u64 = 29_900;

/// Result of [`PrinterClient::send_command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// An ack-required command was requested while another was in flight.
    SkippedAlreadyPending,
    SkippedDisconnected,
    /// Encoding or the transport write failed.
    Failed,
}

impl SendOutcome {
    pub fn is_sent(self) -> bool {
        self == Self::Sent
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::SkippedAlreadyPending => write!(f, "skipped: ack pending"),
            Self::SkippedDisconnected => write!(f, "skipped: not connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

pub struct PrinterClient<T: Transport> {
    transport: T,
    /// Address the transport was last pointed at.  Empty = none.
    address: String,
    mainboard_id: Option<String>,
    status: PrinterStatus,
    ack: AckTracker,
    last_keepalive_ms: u64,
}

impl<T: Transport> PrinterClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            address: String::new(),
            mainboard_id: None,
            status: PrinterStatus::default(),
            ack: AckTracker::default(),
            last_keepalive_ms: 0,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn status(&self) -> &PrinterStatus {
        &self.status
    }

    pub fn mainboard_id(&self) -> Option<&str> {
        self.mainboard_id.as_deref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn is_waiting_for_ack(&self) -> bool {
        self.ack.is_waiting()
    }

    pub fn pending(&self) -> Option<&PendingCommand> {
        self.ack.pending()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ── Per-cycle work ────────────────────────────────────────

    /// Reconnect check, inbound drain, then ack timeout or keep-alive.
    pub fn housekeeping(
        &mut self,
        clock: &impl Clock,
        config: &BridgeConfig,
        sink: &mut impl EventSink,
    ) {
        self.ack
            .set_matching(AckMatching::from_strict(config.strict_ack_matching));

        if config.printer_address != self.address {
            self.retarget(&config.printer_address, sink);
        }

        while let Some(event) = self.transport.poll_event() {
            self.handle_transport_event(event, clock, sink);
        }

        let now = clock.now_ms();
        if let Some(expired) = self.ack.expire(now) {
            sink.emit(&BridgeEvent::AckTimedOut {
                command: expired.command,
                request_id: expired.request_id,
            });
        } else if self.transport.is_connected()
            && now.saturating_sub(self.last_keepalive_ms) >= KEEPALIVE_INTERVAL_MS
        {
            self.last_keepalive_ms = now;
            if let Err(e) = self.transport.send_text(KEEPALIVE_FRAME) {
                warn!("Keep-alive failed: {}", e);
            }
        }
    }

    fn retarget(&mut self, address: &str, sink: &mut impl EventSink) {
        // The old session may still be retrying while the link is down.
        if !self.address.is_empty() {
            info!("Printer address changed, closing session to {}", self.address);
            self.transport.disconnect();
        }
        self.ack.reset();
        self.address = address.to_owned();

        if self.address.is_empty() {
            info!("No printer address configured");
            return;
        }

        let uri = protocol::endpoint_uri(&self.address);
        info!("Connecting to printer at {}", uri);
        sink.emit(&BridgeEvent::Connecting(uri.clone()));
        if let Err(e) = self.transport.connect(&uri, RECONNECT_INTERVAL) {
            error!("Failed to start printer connection: {}", e);
        }
    }

    fn handle_transport_event(
        &mut self,
        event: TransportEvent,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        match event {
            TransportEvent::Connected => {
                info!("Printer connected");
                sink.emit(&BridgeEvent::Connected);
                self.send_command(Command::Status, false, clock.now_ms(), clock.unix_secs());
            }
            TransportEvent::Disconnected => {
                info!("Printer disconnected");
                self.ack.reset();
                sink.emit(&BridgeEvent::Disconnected);
            }
            TransportEvent::Text(text) => self.handle_text(&text, clock.now_ms(), sink),
            TransportEvent::Binary(len) => {
                debug!("Ignoring {} byte binary frame", len);
            }
            TransportEvent::Error(msg) => {
                warn!("Printer connection error: {}", msg);
            }
        }
    }

    /// Route one inbound text frame.
    pub fn handle_text(&mut self, text: &str, now_ms: u64, sink: &mut impl EventSink) {
        let doc: Value = match serde_json::from_str(text) {
            Ok(v) => v,
            Err(e) => {
                warn!("Dropping malformed printer message: {}", e);
                return;
            }
        };

        match protocol::classify(&doc) {
            Inbound::Ack(frame) => {
                info!(
                    "Ack for command {} request {} result {:?}",
                    frame.command, frame.request_id, frame.ack
                );
                let cleared = self.ack.acknowledge(
                    frame.command,
                    &frame.request_id,
                    frame.mainboard_id.as_deref(),
                    self.mainboard_id.as_deref(),
                );
                self.adopt_identity(frame.mainboard_id.as_deref(), sink);
                if cleared {
                    sink.emit(&BridgeEvent::Acknowledged {
                        command: frame.command,
                        request_id: frame.request_id,
                    });
                }
            }
            Inbound::Status {
                status,
                mainboard_id,
            } => {
                if self.status.apply_status_message(status, now_ms) {
                    sink.emit(&BridgeEvent::PrintStarted);
                }
                self.adopt_identity(mainboard_id, sink);
            }
            Inbound::Ignored => debug!("Ignoring unrecognised printer message"),
        }
    }

    /// First writer wins; empty ids are never adopted.
    fn adopt_identity(&mut self, id: Option<&str>, sink: &mut impl EventSink) {
        if self.mainboard_id.is_some() {
            return;
        }
        if let Some(id) = id.filter(|s| !s.is_empty()) {
            info!("Printer mainboard id: {}", id);
            self.mainboard_id = Some(id.to_owned());
            sink.emit(&BridgeEvent::MainboardIdentified(id.to_owned()));
        }
    }

    // ── Outbound ──────────────────────────────────────────────

    /// Send `command`, registering it with the ack tracker when
    /// `requires_ack`.  Never queues and never retries.
    pub fn send_command(
        &mut self,
        command: Command,
        requires_ack: bool,
        now_ms: u64,
        unix_secs: u64,
    ) -> SendOutcome {
        if !self.transport.is_connected() {
            warn!("Not sending command {}: printer not connected", command.code());
            return SendOutcome::SkippedDisconnected;
        }
        if requires_ack && self.ack.is_waiting() {
            warn!(
                "Not sending command {}: still waiting for ack",
                command.code()
            );
            return SendOutcome::SkippedAlreadyPending;
        }

        let request_id = protocol::new_request_id();
        let frame = match protocol::encode_command(
            command,
            &request_id,
            self.mainboard_id.as_deref().unwrap_or(""),
            unix_secs,
        ) {
            Ok(f) => f,
            Err(e) => {
                error!("Failed to encode command {}: {}", command.code(), e);
                return SendOutcome::Failed;
            }
        };

        if requires_ack && self.ack.begin(command.code(), &request_id, now_ms).is_err() {
            return SendOutcome::SkippedAlreadyPending;
        }

        match self.transport.send_text(&frame) {
            Ok(()) => {
                info!("Sent command {} request {}", command.code(), request_id);
                SendOutcome::Sent
            }
            Err(e) => {
                if requires_ack {
                    self.ack.reset();
                }
                error!("Failed to send command {}: {}", command.code(), e);
                SendOutcome::Failed
            }
        }
    }

    pub fn request_status(&mut self, now_ms: u64, unix_secs: u64) -> SendOutcome {
        self.send_command(Command::Status, Command::Status.requires_ack(), now_ms, unix_secs)
    }

    pub fn pause_print(&mut self, now_ms: u64, unix_secs: u64) -> SendOutcome {
        self.send_command(
            Command::PausePrint,
            Command::PausePrint.requires_ack(),
            now_ms,
            unix_secs,
        )
    }

    pub fn resume_print(&mut self, now_ms: u64, unix_secs: u64) -> SendOutcome {
        self.send_command(
            Command::ContinuePrint,
            Command::ContinuePrint.requires_ack(),
            now_ms,
            unix_secs,
        )
    }
}
