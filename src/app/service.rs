//! Application service: the hexagonal core.
//!
//! [`BridgeService`] owns the printer client, the sensor monitor and the
//! pause policy.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits: the transport is owned by the client, while
//! sensors, clock and event sink are injected at call sites, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │      BridgeService        │
//!   Transport ◀──▶│ Client · Sensors · Policy │◀── Clock
//!                 └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::BridgeConfig;
use crate::policy::{PauseInputs, PausePolicy, Verdict};
use crate::printer::client::PrinterClient;
use crate::printer::protocol::Command;
use crate::sensors::SensorMonitor;

use super::commands::AppCommand;
use super::events::BridgeEvent;
use super::ports::{Clock, ConfigPort, EventSink, SensorPort, Transport};
use super::report::{PrinterInfo, StatusReport};

/// Delay between the last config change and the automatic save.
const AUTO_SAVE_DELAY_MS: u64 = 5000;

// ───────────────────────────────────────────────────────────────
// BridgeService
// ───────────────────────────────────────────────────────────────

pub struct BridgeService<T: Transport> {
    client: PrinterClient<T>,
    sensors: SensorMonitor,
    policy: PausePolicy,
    config: BridgeConfig,
    tick_count: u64,
    config_dirty: bool,
    dirty_since_ms: u64,
}

impl<T: Transport> BridgeService<T> {
    /// Construct the service.  The printer connection is opened on the
    /// first [`tick`](Self::tick) if an address is configured.
    pub fn new(config: BridgeConfig, transport: T) -> Self {
        Self {
            client: PrinterClient::new(transport),
            sensors: SensorMonitor::new(),
            policy: PausePolicy::new(),
            config,
            tick_count: 0,
            config_dirty: false,
            dirty_since_ms: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&BridgeEvent::Started);
        info!(
            "BridgeService started (printer={:?}, enabled={})",
            self.config.printer_address, self.config.enabled
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: printer housekeeping → sensors → policy →
    /// pause.  Never blocks.
    pub fn tick(
        &mut self,
        clock: &impl Clock,
        hw: &mut impl SensorPort,
        sink: &mut impl EventSink,
    ) -> Verdict {
        self.tick_count += 1;
        let now = clock.now_ms();

        // 1. Connection upkeep and inbound messages
        self.client.housekeeping(clock, &self.config, sink);

        // 2. Sensors, with the movement timeout chosen by the latest Z
        let z = self.client.status().current_z;
        self.sensors.update(now, hw, z, &self.config, sink);

        // 3. Decide
        let inputs = self.pause_inputs();
        let verdict = self.policy.evaluate(now, &self.config, &inputs);

        // 4. Act
        if verdict == Verdict::Pause {
            let outcome = self.client.pause_print(now, clock.unix_secs());
            sink.emit(&BridgeEvent::PauseRequested { inputs, outcome });
        }

        verdict
    }

    fn pause_inputs(&self) -> PauseInputs {
        PauseInputs::capture(
            self.sensors.is_filament_out(),
            self.sensors.is_movement_stopped(),
            self.client.is_connected(),
            self.client.is_waiting_for_ack(),
            self.client.status(),
        )
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) {
        let now = clock.now_ms();
        match cmd {
            AppCommand::UpdateConfig(new_config) => {
                if let Err(e) = new_config.validate() {
                    warn!("Rejected configuration update: {}", e);
                    return;
                }
                self.config = new_config;
                self.mark_config_dirty(now);
                sink.emit(&BridgeEvent::ConfigUpdated);
                info!("Configuration updated at runtime");
            }
            AppCommand::SaveConfig => {
                self.config_dirty = true;
                self.dirty_since_ms = now.saturating_sub(AUTO_SAVE_DELAY_MS);
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
            AppCommand::PausePrint => self.issue(Command::PausePrint, clock, sink),
            AppCommand::ResumePrint => self.issue(Command::ContinuePrint, clock, sink),
            AppCommand::RequestStatus => self.issue(Command::Status, clock, sink),
        }
    }

    fn issue(&mut self, command: Command, clock: &impl Clock, sink: &mut impl EventSink) {
        let outcome = self.client.send_command(
            command,
            command.requires_ack(),
            clock.now_ms(),
            clock.unix_secs(),
        );
        info!("Manual command {} {}", command.code(), outcome);
        sink.emit(&BridgeEvent::CommandIssued { command, outcome });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn printer_info(&self) -> PrinterInfo {
        let status = self.client.status();
        PrinterInfo {
            mainboard_id: self.client.mainboard_id().unwrap_or_default().to_owned(),
            print_status: status.phase.code(),
            is_printing: status.is_printing(),
            current_layer: status.current_layer,
            total_layer: status.total_layer,
            progress: status.progress,
            current_ticks: status.current_ticks,
            total_ticks: status.total_ticks,
            print_speed_pct: status.print_speed_pct,
            is_websocket_connected: self.client.is_connected(),
            current_z: status.current_z,
            waiting_for_ack: self.client.is_waiting_for_ack(),
        }
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            stopped: self.sensors.is_movement_stopped(),
            filament_runout: self.sensors.is_filament_out(),
            elegoo: self.printer_info(),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn client(&self) -> &PrinterClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut PrinterClient<T> {
        &mut self.client
    }

    pub fn sensors(&self) -> &SensorMonitor {
        &self.sensors
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Config dirty-flag management ──────────────────────────

    fn mark_config_dirty(&mut self, now_ms: u64) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_ms = now_ms;
        }
    }

    /// Save once the config has been stable for a few seconds.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now_ms: u64, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty || now_ms.saturating_sub(self.dirty_since_ms) < AUTO_SAVE_DELAY_MS
        {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use super::*;
    use crate::app::ports::{RawSample, TransportEvent};
    use crate::error::TransportError;

    struct Offline;

    impl Transport for Offline {
        fn connect(&mut self, _: &str, _: Duration) -> Result<(), TransportError> {
            Err(TransportError::ConnectFailed)
        }
        fn disconnect(&mut self) {}
        fn is_connected(&self) -> bool {
            false
        }
        fn send_text(&mut self, _: &str) -> Result<(), TransportError> {
            Err(TransportError::NotConnected)
        }
        fn poll_event(&mut self) -> Option<TransportEvent> {
            None
        }
    }

    struct Epoch;

    impl Clock for Epoch {
        fn now_ms(&self) -> u64 {
            0
        }
        fn unix_secs(&self) -> u64 {
            0
        }
    }

    struct Discard;

    impl EventSink for Discard {
        fn emit(&mut self, _: &BridgeEvent) {}
    }

    struct Idle;

    impl SensorPort for Idle {
        fn sample(&mut self) -> RawSample {
            RawSample {
                movement_level: false,
                filament_present: true,
            }
        }
    }

    #[test]
    fn offline_ticks_hold_and_are_counted() {
        let mut app = BridgeService::new(BridgeConfig::default(), Offline);
        for _ in 0..3 {
            assert!(matches!(
                app.tick(&Epoch, &mut Idle, &mut Discard),
                Verdict::Hold(_)
            ));
        }
        assert_eq!(app.tick_count(), 3);
    }

    #[test]
    fn fresh_report_is_idle_and_disconnected() {
        let app = BridgeService::new(BridgeConfig::default(), Offline);
        let r = app.status_report();
        assert!(!r.stopped);
        assert!(!r.filament_runout);
        assert!(!r.elegoo.is_websocket_connected);
        assert!(!r.elegoo.is_printing);
        assert_eq!(r.elegoo.mainboard_id, "");
    }

    #[test]
    fn invalid_config_update_is_rejected() {
        let mut app = BridgeService::new(BridgeConfig::default(), Offline);
        let bad = BridgeConfig {
            movement_timeout_ms: 1,
            ..BridgeConfig::default()
        };
        app.handle_command(AppCommand::UpdateConfig(bad), &Epoch, &mut Discard);
        assert_eq!(app.config(), &BridgeConfig::default());
        assert!(!app.is_config_dirty());
    }
}
