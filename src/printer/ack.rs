//! Acknowledgment tracker.
//!
//! ```text
//!          begin()                 matching ack / expire() / reset()
//!   Idle ──────────▶ AwaitingAck ─────────────────────────────────▶ Idle
//! ```
//!
//! At most one ack-required command is in flight.  A second `begin` while
//! awaiting is rejected and leaves the pending entry untouched.

use core::fmt;

use log::{info, warn};

/// How long a pending command waits for its acknowledgment.
pub const ACK_TIMEOUT_MS: u64 = 5000;

/// The single in-flight ack-required command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub command: u16,
    pub request_id: String,
    pub issued_at_ms: u64,
}

/// How strictly an inbound ack is matched against the pending command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckMatching {
    /// Command code and request id.
    #[default]
    Lenient,
    /// Command code, request id, and a mainboard id equal to the known
    /// identity.
    Strict,
}

impl AckMatching {
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }
}

/// Rejection from [`AckTracker::begin`] while another command is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckBusy;

impl fmt::Display for AckBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acknowledgment already pending")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum AckState {
    #[default]
    Idle,
    AwaitingAck(PendingCommand),
}

#[derive(Debug, Default)]
pub struct AckTracker {
    state: AckState,
    matching: AckMatching,
}

impl AckTracker {
    pub fn new(matching: AckMatching) -> Self {
        Self {
            state: AckState::Idle,
            matching,
        }
    }

    pub fn set_matching(&mut self, matching: AckMatching) {
        self.matching = matching;
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self.state, AckState::AwaitingAck(_))
    }

    pub fn pending(&self) -> Option<&PendingCommand> {
        match &self.state {
            AckState::AwaitingAck(p) => Some(p),
            AckState::Idle => None,
        }
    }

    /// Register a freshly sent command.
    pub fn begin(&mut self, command: u16, request_id: &str, now_ms: u64) -> Result<(), AckBusy> {
        if self.is_waiting() {
            return Err(AckBusy);
        }
        self.state = AckState::AwaitingAck(PendingCommand {
            command,
            request_id: request_id.to_owned(),
            issued_at_ms: now_ms,
        });
        Ok(())
    }

    /// Offer an inbound ack.  Returns `true` when it cleared the pending
    /// command.
    ///
    /// `ack_mainboard` is the mainboard id carried by the ack and
    /// `known_mainboard` the identity the client has adopted; both only
    /// matter under [`AckMatching::Strict`].
    pub fn acknowledge(
        &mut self,
        command: u16,
        request_id: &str,
        ack_mainboard: Option<&str>,
        known_mainboard: Option<&str>,
    ) -> bool {
        let AckState::AwaitingAck(pending) = &self.state else {
            return false;
        };
        if pending.command != command || pending.request_id != request_id {
            return false;
        }
        if self.matching == AckMatching::Strict && ack_mainboard != known_mainboard {
            warn!(
                "Ack for {} carries mainboard {:?}, expected {:?}",
                request_id, ack_mainboard, known_mainboard
            );
            return false;
        }
        info!(
            "Command {} acknowledged after request {}",
            command, request_id
        );
        self.state = AckState::Idle;
        true
    }

    /// Drop the pending command once it has waited [`ACK_TIMEOUT_MS`].
    pub fn expire(&mut self, now_ms: u64) -> Option<PendingCommand> {
        let timed_out = self
            .pending()
            .is_some_and(|p| now_ms.saturating_sub(p.issued_at_ms) >= ACK_TIMEOUT_MS);
        if !timed_out {
            return None;
        }
        match core::mem::take(&mut self.state) {
            AckState::AwaitingAck(p) => {
                warn!(
                    "Ack timeout for command {} (request {})",
                    p.command, p.request_id
                );
                Some(p)
            }
            AckState::Idle => None,
        }
    }

    /// Unconditionally forget the pending command.
    pub fn reset(&mut self) {
        self.state = AckState::Idle;
    }
}
