//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (settings page,
//! serial console) that the [`BridgeService`](super::service::BridgeService)
//! interprets and acts upon.

use crate::config::BridgeConfig;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Hot-reload configuration.  A changed printer address takes effect
    /// on the next tick.
    UpdateConfig(BridgeConfig),

    /// Persist the current config on the next auto-save check.
    SaveConfig,

    /// Manually pause the current print.
    PausePrint,

    /// Resume a paused print.
    ResumePrint,

    /// Ask the printer for a fresh status push.
    RequestStatus,
}
