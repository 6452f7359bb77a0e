//! Bridge configuration parameters
//!
//! Administrative toggles and timing for the filament bridge.
//! Values are persisted as JSON by the settings store and may be replaced
//! at runtime via [`AppCommand::UpdateConfig`](crate::app::commands::AppCommand).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    // --- Pause policy ---
    /// Master switch; when false the bridge never pauses a print.
    pub enabled: bool,
    /// Pause when the runout switch reports no filament.
    pub pause_on_runout: bool,
    /// Suppress pausing for this long after a print starts (milliseconds).
    pub start_print_timeout_ms: u32,

    // --- Movement sensor ---
    /// Movement stall timeout once past the first layer (milliseconds).
    #[serde(alias = "timeout")]
    pub movement_timeout_ms: u32,
    /// Movement stall timeout while Z is below the first-layer threshold.
    pub first_layer_timeout_ms: u32,

    // --- Printer link ---
    /// Printer host or IP address.  Empty = not configured.
    #[serde(alias = "elegooip")]
    pub printer_address: String,
    /// Also require the ack's MainboardID to match the known identity.
    pub strict_ack_matching: bool,

    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_loop_interval_ms: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            // Pause policy
            enabled: true,
            pause_on_runout: true,
            start_print_timeout_ms: 10_000,

            // Movement sensor
            movement_timeout_ms: 2000,
            first_layer_timeout_ms: 4000,

            // Printer link
            printer_address: String::new(),
            strict_ack_matching: false,

            // Timing
            control_loop_interval_ms: 50, // 20 Hz
        }
    }
}

impl BridgeConfig {
    /// Range-check every field.  Called before persisting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=600_000).contains(&self.movement_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "movement_timeout_ms must be 100–600000",
            ));
        }
        if !(100..=600_000).contains(&self.first_layer_timeout_ms) {
            return Err(ConfigError::ValidationFailed(
                "first_layer_timeout_ms must be 100–600000",
            ));
        }
        if self.start_print_timeout_ms > 3_600_000 {
            return Err(ConfigError::ValidationFailed(
                "start_print_timeout_ms must be at most 3600000",
            ));
        }
        if !(10..=1000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 10–1000",
            ));
        }
        if self.printer_address.len() > 253 || self.printer_address.contains(char::is_whitespace)
        {
            return Err(ConfigError::ValidationFailed(
                "printer_address must be a host name or IP without whitespace",
            ));
        }
        Ok(())
    }
}
