//! Pause decision engine.
//!
//! Fuses sensor, connection, acknowledgment and printer state into a single
//! verdict per control cycle.  The policy holds no state of its own; the
//! cycle driver builds a [`PauseInputs`] snapshot and acts on the result.
//!
//! ## Evaluation order
//!
//! 1. Bridge disabled: hold.
//! 2. Filament out while runout pausing is disabled: hold for the whole
//!    cycle, even if movement has also stopped.  The printer's own runout
//!    handling takes over.
//! 3. Startup grace, connection, pending ack, printing state, remaining
//!    ticks and finally the fault condition itself, each a hold.
//! 4. Otherwise pause.

use core::fmt;

use log::info;

use crate::config::BridgeConfig;
use crate::printer::status::{MachineStatus, PrintPhase, PrinterStatus};

/// Below this many remaining ticks the print is treated as finishing.
pub const NEAR_END_TICKS: i64 = 100;

/// Everything the policy looks at, captured once per cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PauseInputs {
    pub filament_out: bool,
    pub movement_stopped: bool,
    pub connected: bool,
    pub awaiting_ack: bool,
    pub phase: PrintPhase,
    pub machine_printing: bool,
    pub current_ticks: i64,
    pub total_ticks: i64,
    pub print_started_at_ms: Option<u64>,
}

impl PauseInputs {
    pub fn capture(
        filament_out: bool,
        movement_stopped: bool,
        connected: bool,
        awaiting_ack: bool,
        status: &PrinterStatus,
    ) -> Self {
        Self {
            filament_out,
            movement_stopped,
            connected,
            awaiting_ack,
            phase: status.phase,
            machine_printing: status.machine.contains(MachineStatus::Printing),
            current_ticks: status.current_ticks,
            total_ticks: status.total_ticks,
            print_started_at_ms: status.print_started_at_ms,
        }
    }

    fn is_printing(&self) -> bool {
        self.phase == PrintPhase::Printing && self.machine_printing
    }

    /// Ticks left in the current job.  Negative when the counters are
    /// inconsistent.
    pub fn remaining_ticks(&self) -> i64 {
        self.total_ticks.saturating_sub(self.current_ticks)
    }
}

/// Why the policy chose not to pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldReason {
    Disabled,
    RunoutPauseDisabled,
    StartupGrace,
    Disconnected,
    AwaitingAck,
    NotPrinting,
    NearlyDone,
    NoFault,
}

impl fmt::Display for HoldReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "bridge disabled"),
            Self::RunoutPauseDisabled => write!(f, "runout pause disabled"),
            Self::StartupGrace => write!(f, "print start grace period"),
            Self::Disconnected => write!(f, "printer not connected"),
            Self::AwaitingAck => write!(f, "waiting for ack"),
            Self::NotPrinting => write!(f, "not printing"),
            Self::NearlyDone => write!(f, "print nearly done"),
            Self::NoFault => write!(f, "filament ok"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pause,
    Hold(HoldReason),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PausePolicy;

impl PausePolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, now_ms: u64, config: &BridgeConfig, inputs: &PauseInputs) -> Verdict {
        use HoldReason::*;

        if !config.enabled {
            return Verdict::Hold(Disabled);
        }
        if inputs.filament_out && !config.pause_on_runout {
            return Verdict::Hold(RunoutPauseDisabled);
        }

        let pause_condition = inputs.filament_out || inputs.movement_stopped;
        let since_start = now_ms.saturating_sub(inputs.print_started_at_ms.unwrap_or(0));

        let hold = if since_start < u64::from(config.start_print_timeout_ms) {
            Some(StartupGrace)
        } else if !inputs.connected {
            Some(Disconnected)
        } else if inputs.awaiting_ack {
            Some(AwaitingAck)
        } else if !inputs.is_printing() {
            Some(NotPrinting)
        } else if inputs.remaining_ticks() < NEAR_END_TICKS {
            Some(NearlyDone)
        } else if !pause_condition {
            Some(NoFault)
        } else {
            None
        };

        match hold {
            Some(reason) => Verdict::Hold(reason),
            None => {
                info!(
                    "Pause: runout={} stopped={} connected={} awaiting_ack={} phase={:?} \
                     machine_printing={} ticks={}/{} since_start={}ms",
                    inputs.filament_out,
                    inputs.movement_stopped,
                    inputs.connected,
                    inputs.awaiting_ack,
                    inputs.phase,
                    inputs.machine_printing,
                    inputs.current_ticks,
                    inputs.total_ticks,
                    since_start,
                );
                Verdict::Pause
            }
        }
    }

    pub fn should_pause(&self, now_ms: u64, config: &BridgeConfig, inputs: &PauseInputs) -> bool {
        self.evaluate(now_ms, config, inputs) == Verdict::Pause
    }
}
