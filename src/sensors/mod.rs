//! Sensor subsystem: the movement debouncer, the runout switch, and the
//! aggregating [`SensorMonitor`].
//!
//! The monitor samples both inputs through the [`SensorPort`] once per
//! control cycle and exposes two debounced booleans to the pause policy.

pub mod movement;
pub mod runout;

use log::{info, warn};

use crate::app::events::BridgeEvent;
use crate::app::ports::{EventSink, SensorPort};
use crate::config::BridgeConfig;
use movement::MovementSensor;
use runout::RunoutSwitch;

#[derive(Debug, Clone, Default)]
pub struct SensorMonitor {
    movement: MovementSensor,
    runout: RunoutSwitch,
}

impl SensorMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample both sensors.  `current_z` is the last Z height reported by
    /// the printer and selects the movement timeout.
    pub fn update(
        &mut self,
        now_ms: u64,
        hw: &mut impl SensorPort,
        current_z: f32,
        config: &BridgeConfig,
        sink: &mut impl EventSink,
    ) {
        let sample = hw.sample();

        if let Some(filament_out) = self.runout.update(sample.filament_present) {
            if filament_out {
                warn!("Filament runout detected");
            } else {
                info!("Filament present again");
            }
            sink.emit(&BridgeEvent::RunoutChanged { filament_out });
        }

        let timeout = movement::timeout_for_z(
            current_z,
            config.movement_timeout_ms,
            config.first_layer_timeout_ms,
        );
        if let Some(stopped) = self.movement.update(sample.movement_level, now_ms, timeout) {
            if stopped {
                warn!("Filament movement stopped (no change for {} ms)", timeout);
            } else {
                info!("Filament movement resumed");
            }
            sink.emit(&BridgeEvent::MovementChanged { stopped });
        }
    }

    pub fn is_filament_out(&self) -> bool {
        self.runout.is_filament_out()
    }

    pub fn is_movement_stopped(&self) -> bool {
        self.movement.is_stopped()
    }
}
