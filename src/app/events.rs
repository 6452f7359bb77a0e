//! Outbound application events.
//!
//! The [`BridgeService`](super::service::BridgeService) and the components
//! it owns emit these through the [`EventSink`](super::ports::EventSink)
//! port.  Adapters on the other side decide what to do with them: log to
//! serial, keep them in the ring buffer served to the status page, etc.

use core::fmt;

use crate::policy::PauseInputs;
use crate::printer::client::SendOutcome;
use crate::printer::protocol::Command;

/// Structured events emitted by the bridge core.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    /// The service has started.
    Started,

    /// A connection attempt to the given URI began.
    Connecting(String),
    Connected,
    Disconnected,

    /// The printer's mainboard id was learned.
    MainboardIdentified(String),

    /// The printer entered the printing phase.
    PrintStarted,

    /// A pending command was acknowledged by the printer.
    Acknowledged { command: u16, request_id: String },

    /// A pending command was dropped after the ack timeout.
    AckTimedOut { command: u16, request_id: String },

    RunoutChanged { filament_out: bool },
    MovementChanged { stopped: bool },

    /// The policy decided to pause; carries every contributing signal.
    PauseRequested {
        inputs: PauseInputs,
        outcome: SendOutcome,
    },

    /// An externally requested command was issued.
    CommandIssued { command: Command, outcome: SendOutcome },

    /// Configuration was replaced at runtime.
    ConfigUpdated,
}

impl fmt::Display for BridgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "Bridge started"),
            Self::Connecting(uri) => write!(f, "Connecting to printer at {uri}"),
            Self::Connected => write!(f, "Connected to printer"),
            Self::Disconnected => write!(f, "Disconnected from printer"),
            Self::MainboardIdentified(id) => write!(f, "Printer mainboard id {id}"),
            Self::PrintStarted => write!(f, "Print started"),
            Self::Acknowledged {
                command,
                request_id,
            } => write!(f, "Command {command} acknowledged ({request_id})"),
            Self::AckTimedOut {
                command,
                request_id,
            } => write!(f, "No ack for command {command} ({request_id})"),
            Self::RunoutChanged { filament_out: true } => write!(f, "Filament runout"),
            Self::RunoutChanged { filament_out: false } => write!(f, "Filament present"),
            Self::MovementChanged { stopped: true } => write!(f, "Filament movement stopped"),
            Self::MovementChanged { stopped: false } => write!(f, "Filament moving"),
            Self::PauseRequested { inputs, outcome } => write!(
                f,
                "Pause {outcome}: runout={} stopped={} ticks={}/{}",
                inputs.filament_out, inputs.movement_stopped, inputs.current_ticks, inputs.total_ticks
            ),
            Self::CommandIssued { command, outcome } => {
                write!(f, "Command {} {outcome}", command.code())
            }
            Self::ConfigUpdated => write!(f, "Settings updated"),
        }
    }
}
