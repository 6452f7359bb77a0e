//! Filament runout switch.
//!
//! Level-triggered with no software debounce: the output mirrors the
//! switch in the same cycle in both directions.

#[derive(Debug, Clone, Default)]
pub struct RunoutSwitch {
    filament_out: bool,
}

impl RunoutSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(filament_out)` when the state flipped.
    pub fn update(&mut self, filament_present: bool) -> Option<bool> {
        let out = !filament_present;
        if out == self.filament_out {
            return None;
        }
        self.filament_out = out;
        Some(out)
    }

    pub fn is_filament_out(&self) -> bool {
        self.filament_out
    }
}
