//! Filament movement sensor debouncer.
//!
//! The encoder wheel toggles its output while filament advances.  Only
//! level *changes* matter: a level held for longer than the active timeout
//! means the filament has stopped.
//!
//! ```text
//!            level unchanged for >= timeout
//!   Armed ──────────────────────────────────▶ Latched
//!     ▲                                          │
//!     └──────────────── level change ────────────┘
//! ```
//!
//! Once latched only a level change re-arms; elapsed time never does.

/// Z height below which the print is considered to be on its first layer.
pub const FIRST_LAYER_Z_THRESHOLD: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Debounce {
    /// Movement seen within the timeout.
    Armed,
    /// No movement for at least the timeout.
    Latched,
}

#[derive(Debug, Clone)]
pub struct MovementSensor {
    last_level: Option<bool>,
    last_change_ms: u64,
    state: Debounce,
}

impl Default for MovementSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementSensor {
    pub fn new() -> Self {
        Self {
            last_level: None,
            last_change_ms: 0,
            state: Debounce::Armed,
        }
    }

    /// Feed one raw sample.  Returns `Some(stopped)` when the debounced
    /// state changed this call.
    pub fn update(&mut self, level: bool, now_ms: u64, timeout_ms: u64) -> Option<bool> {
        let before = self.state;

        if self.last_level != Some(level) {
            self.last_level = Some(level);
            self.last_change_ms = now_ms;
            self.state = Debounce::Armed;
        } else if self.state == Debounce::Armed
            && now_ms.saturating_sub(self.last_change_ms) >= timeout_ms
        {
            self.state = Debounce::Latched;
        }

        (self.state != before).then_some(self.is_stopped())
    }

    pub fn is_stopped(&self) -> bool {
        self.state == Debounce::Latched
    }

    pub fn state(&self) -> Debounce {
        self.state
    }

    pub fn last_change_ms(&self) -> u64 {
        self.last_change_ms
    }
}

/// Pick the stall timeout for the current Z height.
pub fn timeout_for_z(z: f32, movement_timeout_ms: u32, first_layer_timeout_ms: u32) -> u64 {
    if z < FIRST_LAYER_Z_THRESHOLD {
        u64::from(first_layer_timeout_ms)
    } else {
        u64::from(movement_timeout_ms)
    }
}
