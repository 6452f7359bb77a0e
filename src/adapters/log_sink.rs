//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured bridge events to the
//! ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::BridgeEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`BridgeEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BridgeEvent) {
        match event {
            BridgeEvent::Started => info!("START | bridge running"),
            BridgeEvent::Connecting(uri) => info!("LINK  | connecting {}", uri),
            BridgeEvent::Connected => info!("LINK  | connected"),
            BridgeEvent::Disconnected => warn!("LINK  | disconnected"),
            BridgeEvent::MainboardIdentified(id) => info!("LINK  | mainboard={}", id),
            BridgeEvent::PrintStarted => info!("PRINT | started"),
            BridgeEvent::Acknowledged {
                command,
                request_id,
            } => info!("ACK   | cmd={} id={}", command, request_id),
            BridgeEvent::AckTimedOut {
                command,
                request_id,
            } => warn!("ACK   | timeout cmd={} id={}", command, request_id),
            BridgeEvent::RunoutChanged { filament_out } => info!(
                "SENSE | runout={}",
                if *filament_out { "OUT" } else { "OK" }
            ),
            BridgeEvent::MovementChanged { stopped } => info!(
                "SENSE | movement={}",
                if *stopped { "STOPPED" } else { "MOVING" }
            ),
            BridgeEvent::PauseRequested { inputs, outcome } => warn!(
                "PAUSE | {} | runout={} stopped={} ticks={}/{}",
                outcome,
                inputs.filament_out,
                inputs.movement_stopped,
                inputs.current_ticks,
                inputs.total_ticks,
            ),
            BridgeEvent::CommandIssued { command, outcome } => {
                info!("CMD   | {:?} {}", command, outcome)
            }
            BridgeEvent::ConfigUpdated => info!("CONF  | updated"),
        }
    }
}
