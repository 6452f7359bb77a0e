//! Hardware adapter: bridges the two sensor inputs to the [`SensorPort`].
//!
//! Generic over `embedded_hal` input pins so the same code runs against
//! ESP-IDF `PinDriver`s on the board and mock pins on the host.  This is
//! the only module in the system that reads GPIO levels.

use embedded_hal::digital::InputPin;
use log::warn;

use crate::app::ports::{RawSample, SensorPort};
use crate::error::SensorError;

/// Concrete adapter over the runout switch and the movement encoder.
///
/// The runout switch is wired active-low: a LOW level means no filament.
pub struct HardwareAdapter<R, M> {
    runout: R,
    movement: M,
    last: RawSample,
}

impl<R: InputPin, M: InputPin> HardwareAdapter<R, M> {
    pub fn new(runout: R, movement: M) -> Self {
        Self {
            runout,
            movement,
            last: RawSample {
                movement_level: false,
                filament_present: true,
            },
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<R: InputPin, M: InputPin> SensorPort for HardwareAdapter<R, M> {
    /// A failed read keeps the previous level for that input.
    fn sample(&mut self) -> RawSample {
        match self.runout.is_high() {
            Ok(high) => self.last.filament_present = high,
            Err(_) => warn!("{}", SensorError::RunoutReadFailed),
        }
        match self.movement.is_high() {
            Ok(high) => self.last.movement_level = high,
            Err(_) => warn!("{}", SensorError::MovementReadFailed),
        }
        self.last
    }
}
