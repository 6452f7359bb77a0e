//! Printer WebSocket adapter.
//!
//! The ESP-IDF WebSocket client runs its callback on its own task.  The
//! callback only moves each event into a bounded [`InboundQueue`]; the
//! control loop drains it through [`Transport::poll_event`] at the start of
//! every cycle.
//!
//! ```text
//! ┌──────────────┐  InboundEvent  ┌──────────────┐
//! │  WS client   │──────────────▶│ Control Loop  │
//! │  task (IDF)  │                │  (sync)       │
//! └──────────────┘                └──────────────┘
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::app::ports::TransportEvent;

/// Receive buffer of the IDF client and capacity of a queued text frame.
///
/// The client hands a frame larger than its buffer to the callback as
/// consecutive buffer-sized chunks, so a chunk that fills the buffer is
/// taken as part of a split frame.  Whole frames are strictly shorter.
pub const MAX_FRAME_LEN: usize = 2048;

/// Stack of the IDF client task, which runs the event callback.
pub const WS_TASK_STACK: usize = 8 * 1024;

/// Channel depth for inbound events.
const INBOUND_DEPTH: usize = 8;

/// Event as it crosses the task boundary.  Fixed-size, no heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Connected,
    Disconnected,
    Text(heapless::String<MAX_FRAME_LEN>),
    Binary(usize),
    Error(heapless::String<64>),
}

impl From<InboundEvent> for TransportEvent {
    fn from(e: InboundEvent) -> Self {
        match e {
            InboundEvent::Connected => Self::Connected,
            InboundEvent::Disconnected => Self::Disconnected,
            InboundEvent::Text(s) => Self::Text(s.as_str().to_owned()),
            InboundEvent::Binary(n) => Self::Binary(n),
            InboundEvent::Error(s) => Self::Error(s.as_str().to_owned()),
        }
    }
}

/// Bounded hand-off from the WebSocket task to the control loop, plus the
/// connection flag the client task maintains.
pub struct InboundQueue {
    channel: Channel<CriticalSectionRawMutex, InboundEvent, INBOUND_DEPTH>,
    connected: AtomicBool,
    /// Inside a frame that arrived split across chunks.
    split_frame: AtomicBool,
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InboundQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            connected: AtomicBool::new(false),
            split_frame: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn on_connected(&self) {
        self.connected.store(true, Ordering::Release);
        self.push(InboundEvent::Connected);
    }

    pub fn on_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
        self.split_frame.store(false, Ordering::Release);
        self.push(InboundEvent::Disconnected);
    }

    /// Queue a whole text frame.  Every chunk of a split frame is dropped,
    /// up to and including the short chunk that ends it.
    pub fn on_text(&self, text: &str) {
        let continues = text.len() >= MAX_FRAME_LEN;
        let inside = self.split_frame.swap(continues, Ordering::AcqRel);
        if inside || continues {
            warn!(
                "Dropping {} byte chunk of a frame over {} bytes",
                text.len(),
                MAX_FRAME_LEN
            );
            return;
        }
        match heapless::String::try_from(text) {
            Ok(s) => self.push(InboundEvent::Text(s)),
            Err(_) => warn!("Dropping {} byte frame", text.len()),
        }
    }

    pub fn on_binary(&self, len: usize) {
        self.push(InboundEvent::Binary(len));
    }

    /// Queue an error description, truncated to fit.
    pub fn on_error(&self, msg: &str) {
        let mut s = heapless::String::new();
        for c in msg.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        self.push(InboundEvent::Error(s));
    }

    pub fn next(&self) -> Option<TransportEvent> {
        self.channel.try_receive().ok().map(TransportEvent::from)
    }

    /// Discard everything queued (after an explicit disconnect).
    pub fn clear(&self) {
        while self.channel.try_receive().is_ok() {}
        self.connected.store(false, Ordering::Release);
        self.split_frame.store(false, Ordering::Release);
    }

    fn push(&self, event: InboundEvent) {
        if self.channel.try_send(event).is_err() {
            warn!("Inbound queue full, dropping printer event");
        }
    }
}

/// Queue shared by the production transport and its callback.
pub static WS_INBOUND: InboundQueue = InboundQueue::new();

// ───────────────────────────────────────────────────────────────
// ESP-IDF transport
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::WsTransport;

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;

    use esp_idf_svc::ws::FrameType;
    use esp_idf_svc::ws::client::{
        EspWebSocketClient, EspWebSocketClientConfig, WebSocketEventType,
    };
    use log::{error, info};

    use super::{InboundQueue, MAX_FRAME_LEN, WS_INBOUND, WS_TASK_STACK};
    use crate::app::ports::{Transport, TransportEvent};
    use crate::error::TransportError;

    const SEND_TIMEOUT: Duration = Duration::from_secs(5);

    /// [`Transport`] over `EspWebSocketClient`.  The IDF client reconnects
    /// on its own after a drop.
    pub struct WsTransport {
        client: Option<EspWebSocketClient<'static>>,
        queue: &'static InboundQueue,
    }

    impl Default for WsTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WsTransport {
        pub fn new() -> Self {
            Self {
                client: None,
                queue: &WS_INBOUND,
            }
        }
    }

    impl Transport for WsTransport {
        fn connect(
            &mut self,
            uri: &str,
            reconnect_interval: Duration,
        ) -> Result<(), TransportError> {
            self.disconnect();

            let config = EspWebSocketClientConfig {
                reconnect_timeout_ms: reconnect_interval,
                buffer_size: MAX_FRAME_LEN,
                task_stack: WS_TASK_STACK,
                ..Default::default()
            };
            let queue = self.queue;
            let client = EspWebSocketClient::new(uri, &config, SEND_TIMEOUT, move |event| {
                match event {
                    Ok(ev) => match ev.event_type {
                        WebSocketEventType::Connected => queue.on_connected(),
                        WebSocketEventType::Disconnected | WebSocketEventType::Closed => {
                            queue.on_disconnected()
                        }
                        WebSocketEventType::Text(text) => queue.on_text(text),
                        WebSocketEventType::Binary(data) => queue.on_binary(data.len()),
                        _ => {}
                    },
                    Err(e) => queue.on_error(&e.to_string()),
                }
            })
            .map_err(|e| {
                error!("WebSocket client init failed: {}", e);
                TransportError::ConnectFailed
            })?;

            info!("WebSocket client started for {}", uri);
            self.client = Some(client);
            Ok(())
        }

        fn disconnect(&mut self) {
            if self.client.take().is_some() {
                self.queue.clear();
            }
        }

        fn is_connected(&self) -> bool {
            self.client.is_some() && self.queue.is_connected()
        }

        fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
            let client = self.client.as_mut().ok_or(TransportError::NotConnected)?;
            if !self.queue.is_connected() {
                return Err(TransportError::NotConnected);
            }
            if text.len() > MAX_FRAME_LEN {
                return Err(TransportError::FrameTooLarge);
            }
            client
                .send(FrameType::Text(false), text.as_bytes())
                .map_err(|_| TransportError::SendFailed)
        }

        fn poll_event(&mut self) -> Option<TransportEvent> {
            self.queue.next()
        }
    }
}
