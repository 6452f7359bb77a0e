//! Printer side of the bridge: SDCP framing, the status model, command
//! acknowledgment tracking, and the connection client tying them together.

pub mod ack;
pub mod client;
pub mod protocol;
pub mod status;

pub use ack::{AckMatching, AckTracker, PendingCommand};
pub use client::{PrinterClient, SendOutcome};
pub use protocol::Command;
pub use status::{MachineStatus, MachineStatusSet, PrintPhase, PrinterStatus};
