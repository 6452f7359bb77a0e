//! Printer status model.
//!
//! [`PrinterStatus`] is a snapshot of what the printer last reported.  It is
//! mutated only by inbound status pushes, and pushes are routinely partial:
//! a field absent from a message keeps its previous value.  Malformed
//! substructures are logged and skipped, never propagated.

use core::fmt;

use log::{info, warn};
use serde_json::Value;

/// Maximum number of machine-status entries read from one message.
const MAX_MACHINE_STATUSES: usize = 5;

// ───────────────────────────────────────────────────────────────
// Print phase
// ───────────────────────────────────────────────────────────────

/// High-level print lifecycle state (`PrintInfo.Status`).
///
/// Codes the bridge does not know are carried through as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintPhase {
    #[default]
    Idle,
    Homing,
    Dropping,
    Exposuring,
    Lifting,
    Pausing,
    Paused,
    Stopping,
    Stopped,
    Complete,
    FileChecking,
    Printing,
    Heating,
    BedLeveling,
    Other(i64),
}

impl PrintPhase {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Idle,
            1 => Self::Homing,
            2 => Self::Dropping,
            3 => Self::Exposuring,
            4 => Self::Lifting,
            5 => Self::Pausing,
            6 => Self::Paused,
            7 => Self::Stopping,
            8 => Self::Stopped,
            9 => Self::Complete,
            10 => Self::FileChecking,
            13 => Self::Printing,
            16 => Self::Heating,
            20 => Self::BedLeveling,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Idle => 0,
            Self::Homing => 1,
            Self::Dropping => 2,
            Self::Exposuring => 3,
            Self::Lifting => 4,
            Self::Pausing => 5,
            Self::Paused => 6,
            Self::Stopping => 7,
            Self::Stopped => 8,
            Self::Complete => 9,
            Self::FileChecking => 10,
            Self::Printing => 13,
            Self::Heating => 16,
            Self::BedLeveling => 20,
            Self::Other(code) => code,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Machine status flags
// ───────────────────────────────────────────────────────────────

/// Concurrent machine conditions reported in `CurrentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MachineStatus {
    Idle = 0,
    Printing = 1,
    FileTransferring = 2,
    ExposureTesting = 3,
    DevicesTesting = 4,
}

impl MachineStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Idle),
            1 => Some(Self::Printing),
            2 => Some(Self::FileTransferring),
            3 => Some(Self::ExposureTesting),
            4 => Some(Self::DevicesTesting),
            _ => None,
        }
    }

    /// Return the bitmask for this status.
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Printing => write!(f, "printing"),
            Self::FileTransferring => write!(f, "file transferring"),
            Self::ExposureTesting => write!(f, "exposure testing"),
            Self::DevicesTesting => write!(f, "devices testing"),
        }
    }
}

/// Bit-set over [`MachineStatus`].  Replaced wholesale on every push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MachineStatusSet(u8);

impl MachineStatusSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, status: MachineStatus) -> bool {
        self.0 & status.mask() != 0
    }

    pub fn insert(&mut self, status: MachineStatus) {
        self.0 |= status.mask();
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl FromIterator<MachineStatus> for MachineStatusSet {
    fn from_iter<I: IntoIterator<Item = MachineStatus>>(iter: I) -> Self {
        let mut set = Self::empty();
        for status in iter {
            set.insert(status);
        }
        set
    }
}

// ───────────────────────────────────────────────────────────────
// PrinterStatus
// ───────────────────────────────────────────────────────────────

/// Last known printer state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrinterStatus {
    pub phase: PrintPhase,
    pub machine: MachineStatusSet,
    pub current_layer: i64,
    pub total_layer: i64,
    pub progress: i64,
    pub current_ticks: i64,
    pub total_ticks: i64,
    pub print_speed_pct: i64,
    /// Z height from the last `CurrenCoord`.
    pub current_z: f32,
    /// Monotonic time at which the phase last entered `Printing`.
    pub print_started_at_ms: Option<u64>,
}

impl PrinterStatus {
    /// Printing according to *both* the phase and the machine flags.
    /// The phase alone is not trusted.
    pub fn is_printing(&self) -> bool {
        self.phase == PrintPhase::Printing && self.machine.contains(MachineStatus::Printing)
    }

    /// Merge the `Status` object of a status push.
    ///
    /// Returns `true` when this message started a print (phase moved into
    /// `Printing` from anything else).
    pub fn apply_status_message(&mut self, status: &Value, now_ms: u64) -> bool {
        if let Some(list) = status.get("CurrentStatus") {
            self.apply_machine_statuses(list);
        }

        if let Some(coord) = status.get("CurrenCoord") {
            match coord.as_str().and_then(parse_z) {
                Some(z) => self.current_z = z,
                None => warn!("Status: ignoring malformed CurrenCoord {}", coord),
            }
        }

        match status.get("PrintInfo") {
            Some(info) if info.is_object() => self.apply_print_info(info, now_ms),
            Some(other) => {
                warn!("Status: PrintInfo is not an object: {}", other);
                false
            }
            None => false,
        }
    }

    fn apply_machine_statuses(&mut self, list: &Value) {
        let Some(items) = list.as_array() else {
            warn!("Status: CurrentStatus is not an array: {}", list);
            return;
        };
        self.machine = items
            .iter()
            .take(MAX_MACHINE_STATUSES)
            .filter_map(|v| {
                let status = v.as_i64().and_then(MachineStatus::from_code);
                if status.is_none() {
                    warn!("Status: dropping unknown machine status {}", v);
                }
                status
            })
            .collect();
    }

    fn apply_print_info(&mut self, info: &Value, now_ms: u64) -> bool {
        let mut started = false;

        if let Some(code) = int_field(info, "Status") {
            let phase = PrintPhase::from_code(code);
            if phase == PrintPhase::Printing && self.phase != PrintPhase::Printing {
                info!("Print status changed to printing");
                self.print_started_at_ms = Some(now_ms);
                started = true;
            }
            self.phase = phase;
        }

        let fields: [(&str, &mut i64); 6] = [
            ("CurrentLayer", &mut self.current_layer),
            ("TotalLayer", &mut self.total_layer),
            ("Progress", &mut self.progress),
            ("CurrentTicks", &mut self.current_ticks),
            ("TotalTicks", &mut self.total_ticks),
            ("PrintSpeedPct", &mut self.print_speed_pct),
        ];
        for (key, slot) in fields {
            if let Some(value) = int_field(info, key) {
                *slot = value;
            }
        }

        started
    }
}

/// Integer field; floats are truncated, anything else counts as absent.
fn int_field(obj: &Value, key: &str) -> Option<i64> {
    let v = obj.get(key)?;
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

/// Third component of `"x,y,z"`.
fn parse_z(coord: &str) -> Option<f32> {
    let mut parts = coord.splitn(3, ',');
    let (_x, _y, z) = (parts.next()?, parts.next()?, parts.next()?);
    z.trim().parse().ok()
}
