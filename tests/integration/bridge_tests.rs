//! Integration tests for the BridgeService → PrinterClient → transport
//! pipeline.
//!
//! These run on the host (x86_64) and drive whole control cycles against
//! mock sensors, a mock WebSocket and a manual clock.

use filament_bridge::app::commands::AppCommand;
use filament_bridge::app::events::BridgeEvent;
use filament_bridge::app::ports::TransportEvent;
use filament_bridge::app::service::BridgeService;
use filament_bridge::config::BridgeConfig;
use filament_bridge::policy::{HoldReason, Verdict};
use filament_bridge::printer::SendOutcome;
use serde_json::{Value, json};

use super::mock_hw::{ManualClock, MemorySettings, MockSensors, MockTransport, RecordingSink};

const ADDR: &str = "192.168.1.50";
const STEP_MS: u64 = 50;

struct Rig {
    app: BridgeService<MockTransport>,
    hw: MockSensors,
    clock: ManualClock,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: BridgeConfig) -> Self {
        let mut sink = RecordingSink::new();
        let mut app = BridgeService::new(config, MockTransport::new());
        app.start(&mut sink);
        Self {
            app,
            hw: MockSensors::new(),
            clock: ManualClock::new(1_000),
            sink,
        }
    }

    fn with_address() -> Self {
        Self::new(BridgeConfig {
            printer_address: ADDR.into(),
            ..BridgeConfig::default()
        })
    }

    fn tick(&mut self) -> Verdict {
        self.app.tick(&self.clock, &mut self.hw, &mut self.sink)
    }

    fn transport(&mut self) -> &mut MockTransport {
        self.app.client_mut().transport_mut()
    }

    /// Connect and report an active print at Z=1.0.
    fn connected_and_printing(&mut self) {
        self.tick();
        self.transport().inject(TransportEvent::Connected);
        self.step(false);
        self.transport().inject_json(&printing_status(1_000, 50_000));
        self.step(false);
    }

    /// Advance one cycle, optionally toggling the encoder first.
    fn step(&mut self, moving: bool) -> Verdict {
        if moving {
            self.hw.toggle_movement();
        }
        self.clock.advance(STEP_MS);
        self.tick()
    }

    fn run_for(&mut self, ms: u64, moving: bool) {
        for _ in 0..ms / STEP_MS {
            self.step(moving);
        }
    }

    fn pauses_sent(&mut self) -> usize {
        self.transport().commands_with_code(129).len()
    }

    fn ack_last(&mut self, cmd: u16) {
        let id = self.transport().last_request_id().unwrap();
        self.transport().inject_json(&json!({
            "Id": "resp",
            "Data": {"Cmd": cmd, "Data": {"Ack": 0}, "RequestID": id, "MainboardID": "MB42"}
        }));
    }
}

fn printing_status(current_ticks: i64, total_ticks: i64) -> Value {
    json!({
        "Status": {
            "CurrentStatus": [1],
            "CurrenCoord": "120.00,80.00,1.00",
            "PrintInfo": {
                "Status": 13,
                "CurrentLayer": 10,
                "TotalLayer": 200,
                "Progress": 5,
                "CurrentTicks": current_ticks,
                "TotalTicks": total_ticks,
                "PrintSpeedPct": 100
            }
        },
        "MainboardID": "MB42"
    })
}

fn paused_status() -> Value {
    json!({"Status": {"CurrentStatus": [0], "PrintInfo": {"Status": 6}}, "MainboardID": "MB42"})
}

// ── Connection lifecycle ──────────────────────────────────────

#[test]
fn first_tick_connects_and_requests_status() {
    let mut rig = Rig::with_address();
    rig.tick();
    assert_eq!(rig.transport().connects, ["ws://192.168.1.50:3030/websocket"]);

    rig.transport().inject(TransportEvent::Connected);
    rig.step(false);
    let cmds = rig.transport().commands();
    assert_eq!(cmds.len(), 1);
    assert_eq!(cmds[0]["Data"]["Cmd"], 0);
    assert_eq!(cmds[0]["Data"]["From"], 2);
    assert!(!rig.app.client().is_waiting_for_ack());
}

#[test]
fn no_address_means_no_connection() {
    let mut rig = Rig::new(BridgeConfig::default());
    rig.run_for(1_000, true);
    assert!(rig.transport().connects.is_empty());
}

#[test]
fn address_change_reconnects_on_next_tick() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();

    let cfg = BridgeConfig {
        printer_address: "192.168.1.51".into(),
        ..BridgeConfig::default()
    };
    rig.app
        .handle_command(AppCommand::UpdateConfig(cfg), &rig.clock, &mut rig.sink);
    rig.step(false);

    assert_eq!(rig.transport().disconnects, 1);
    assert_eq!(
        rig.transport().connects.last().map(String::as_str),
        Some("ws://192.168.1.51:3030/websocket")
    );
    assert_eq!(rig.app.client().address(), "192.168.1.51");
}

#[test]
fn clearing_address_while_link_down_stops_old_session() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    rig.run_for(10_500, true);

    rig.transport().inject(TransportEvent::Disconnected);
    rig.step(true);
    let cfg = BridgeConfig {
        printer_address: String::new(),
        ..BridgeConfig::default()
    };
    rig.app
        .handle_command(AppCommand::UpdateConfig(cfg), &rig.clock, &mut rig.sink);
    rig.step(true);
    assert_eq!(rig.transport().disconnects, 1);

    // A late reconnect of the old session must not revive it.
    rig.transport().reconnect_lands();
    rig.transport().inject_json(&printing_status(1_000, 50_000));
    rig.run_for(13_000, false);
    assert!(!rig.app.client().is_connected());
    assert_eq!(rig.pauses_sent(), 0);
    assert_eq!(rig.transport().connects.len(), 1);
}

// ── End-to-end stall handling ─────────────────────────────────

#[test]
fn stall_pauses_once_then_ack_and_paused_status_keep_it_quiet() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();

    // Past the start grace period with filament moving: nothing happens.
    rig.run_for(10_500, true);
    assert_eq!(rig.pauses_sent(), 0);

    // Filament stops.  Latches after the 2 s movement timeout.
    rig.run_for(2_500, false);
    assert!(rig.app.sensors().is_movement_stopped());
    assert_eq!(rig.pauses_sent(), 1);
    assert!(rig.app.client().is_waiting_for_ack());

    // Still latched, ack outstanding: no second pause.
    assert_eq!(rig.step(false), Verdict::Hold(HoldReason::AwaitingAck));
    rig.run_for(1_000, false);
    assert_eq!(rig.pauses_sent(), 1);

    // Printer acknowledges and reports paused.
    rig.ack_last(129);
    rig.transport().inject_json(&paused_status());
    assert_eq!(rig.step(false), Verdict::Hold(HoldReason::NotPrinting));
    assert!(!rig.app.client().is_waiting_for_ack());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, BridgeEvent::Acknowledged { command: 129, .. })),
        1
    );

    rig.run_for(10_000, false);
    assert_eq!(rig.pauses_sent(), 1);
    assert!(rig.app.sensors().is_movement_stopped());
}

#[test]
fn stall_inside_start_grace_is_ignored_until_grace_ends() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();

    rig.run_for(4_000, false);
    assert!(rig.app.sensors().is_movement_stopped());
    assert_eq!(rig.pauses_sent(), 0);
    assert_eq!(rig.step(false), Verdict::Hold(HoldReason::StartupGrace));

    rig.run_for(6_500, false);
    assert_eq!(rig.pauses_sent(), 1);
}

#[test]
fn movement_resuming_rearms_without_pause() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    rig.run_for(10_500, true);

    // Short hesitation below the timeout.
    rig.run_for(1_500, false);
    rig.run_for(1_000, true);
    rig.run_for(1_500, false);
    assert!(!rig.app.sensors().is_movement_stopped());
    assert_eq!(rig.pauses_sent(), 0);
}

#[test]
fn unacked_pause_times_out_and_may_be_retried() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    rig.run_for(10_500, true);
    rig.run_for(2_500, false);
    assert_eq!(rig.pauses_sent(), 1);

    rig.run_for(5_000, false);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, BridgeEvent::AckTimedOut { command: 129, .. })),
        1
    );
    rig.run_for(500, false);
    assert_eq!(rig.pauses_sent(), 2);
}

#[test]
fn echoed_request_id_clears_pending() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    rig.run_for(10_500, true);
    rig.run_for(2_500, false);

    let sent_id = rig.transport().last_request_id().unwrap();
    assert_eq!(
        rig.app.client().pending().map(|p| p.request_id.clone()),
        Some(sent_id)
    );
    rig.ack_last(129);
    rig.tick();
    assert!(rig.app.client().pending().is_none());
}

// ── Runout ────────────────────────────────────────────────────

#[test]
fn runout_pauses_in_same_cycle() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    rig.run_for(10_500, true);

    rig.hw.set_filament_present(false);
    assert_eq!(rig.step(true), Verdict::Pause);
    assert_eq!(rig.pauses_sent(), 1);
    assert!(rig.app.status_report().filament_runout);
}

#[test]
fn runout_with_pausing_disabled_defers_to_printer() {
    let mut rig = Rig::new(BridgeConfig {
        printer_address: ADDR.into(),
        pause_on_runout: false,
        ..BridgeConfig::default()
    });
    rig.connected_and_printing();
    rig.run_for(10_500, true);

    rig.hw.set_filament_present(false);
    rig.run_for(5_000, false);
    assert!(rig.app.sensors().is_movement_stopped());
    assert_eq!(rig.pauses_sent(), 0);
    assert_eq!(rig.step(false), Verdict::Hold(HoldReason::RunoutPauseDisabled));
}

#[test]
fn disabled_bridge_never_pauses() {
    let mut rig = Rig::new(BridgeConfig {
        printer_address: ADDR.into(),
        enabled: false,
        ..BridgeConfig::default()
    });
    rig.connected_and_printing();
    rig.hw.set_filament_present(false);
    rig.run_for(20_000, false);
    assert_eq!(rig.pauses_sent(), 0);
}

// ── Guards ────────────────────────────────────────────────────

#[test]
fn nearly_finished_print_is_not_paused() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    rig.transport().inject_json(&printing_status(49_950, 50_000));
    rig.run_for(10_500, true);
    rig.run_for(3_000, false);
    assert_eq!(rig.pauses_sent(), 0);
    assert_eq!(rig.step(false), Verdict::Hold(HoldReason::NearlyDone));
}

#[test]
fn disconnect_clears_pending_and_blocks_pause() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    rig.run_for(10_500, true);
    rig.run_for(2_500, false);
    assert!(rig.app.client().is_waiting_for_ack());

    rig.transport().inject(TransportEvent::Disconnected);
    assert_eq!(rig.step(false), Verdict::Hold(HoldReason::Disconnected));
    assert!(!rig.app.client().is_waiting_for_ack());
    assert!(!rig.app.status_report().elegoo.is_websocket_connected);

    rig.transport().inject(TransportEvent::Connected);
    rig.step(false);
    assert_eq!(rig.pauses_sent(), 2);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn manual_pause_while_pending_is_skipped() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();

    rig.app
        .handle_command(AppCommand::ResumePrint, &rig.clock, &mut rig.sink);
    rig.app
        .handle_command(AppCommand::PausePrint, &rig.clock, &mut rig.sink);

    assert_eq!(rig.transport().commands_with_code(131).len(), 1);
    assert_eq!(rig.pauses_sent(), 0);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            BridgeEvent::CommandIssued {
                outcome: SendOutcome::SkippedAlreadyPending,
                ..
            }
        )),
        1
    );
}

#[test]
fn config_update_is_auto_saved_after_delay() {
    let mut rig = Rig::with_address();
    let store = MemorySettings::default();
    let cfg = BridgeConfig {
        printer_address: ADDR.into(),
        movement_timeout_ms: 3_000,
        ..BridgeConfig::default()
    };
    rig.app
        .handle_command(AppCommand::UpdateConfig(cfg.clone()), &rig.clock, &mut rig.sink);
    assert!(rig.app.is_config_dirty());

    assert!(!rig.app.auto_save_if_needed(1_000 + 4_999, &store));
    assert!(rig.app.auto_save_if_needed(1_000 + 5_000, &store));
    assert!(!rig.app.is_config_dirty());
    assert_eq!(store.saved.borrow().as_slice(), [cfg]);
}

#[test]
fn status_report_reflects_printer_state() {
    let mut rig = Rig::with_address();
    rig.connected_and_printing();
    let r = rig.app.status_report();
    assert!(r.elegoo.is_printing);
    assert!(r.elegoo.is_websocket_connected);
    assert_eq!(r.elegoo.mainboard_id, "MB42");
    assert_eq!(r.elegoo.print_status, 13);
    assert_eq!(r.elegoo.total_layer, 200);
    assert!((r.elegoo.current_z - 1.0).abs() < f32::EPSILON);
    assert!(!r.stopped);
}
