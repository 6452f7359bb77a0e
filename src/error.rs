//! Error types for the sensor and printer-link boundaries.
//!
//! None of these are fatal: the control loop logs them and degrades to
//! "no pause capability" rather than halting.

use core::fmt;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Runout switch GPIO read failed.
    RunoutReadFailed,
    /// Movement encoder GPIO read failed.
    MovementReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunoutReadFailed => write!(f, "runout switch read failed"),
            Self::MovementReadFailed => write!(f, "movement sensor read failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No open connection to write to.
    NotConnected,
    /// The underlying client refused or failed the write.
    SendFailed,
    /// The connection could not be opened.
    ConnectFailed,
    /// The outbound frame exceeds the transport's buffer.
    FrameTooLarge,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::SendFailed => write!(f, "send failed"),
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::FrameTooLarge => write!(f, "frame too large"),
        }
    }
}
