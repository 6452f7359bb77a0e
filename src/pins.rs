//! GPIO pin assignments for the bridge board.
//!
//! Single source of truth: `main` references these rather than hard-coding
//! pin numbers.  Both inputs use the internal pull-up.

// ---------------------------------------------------------------------------
// Filament sensors
// ---------------------------------------------------------------------------

/// Runout switch.  LOW = filament absent.
pub const FILAMENT_RUNOUT_GPIO: i32 = 12;

/// Movement encoder.  Toggles while filament advances.
pub const MOVEMENT_SENSOR_GPIO: i32 = 13;
