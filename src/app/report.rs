//! Status report served to the settings page.
//!
//! ```json
//! {"stopped":false,"filamentRunout":false,
//!  "elegoo":{"mainboardID":"..","printStatus":13,"isPrinting":true,...}}
//! ```

use serde::Serialize;

/// Point-in-time view of the printer as the bridge sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterInfo {
    #[serde(rename = "mainboardID")]
    pub mainboard_id: String,
    pub print_status: i64,
    pub is_printing: bool,
    pub current_layer: i64,
    pub total_layer: i64,
    pub progress: i64,
    pub current_ticks: i64,
    pub total_ticks: i64,
    #[serde(rename = "PrintSpeedPct")]
    pub print_speed_pct: i64,
    pub is_websocket_connected: bool,
    pub current_z: f32,
    pub waiting_for_ack: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    /// Movement sensor has latched.
    pub stopped: bool,
    pub filament_runout: bool,
    pub elegoo: PrinterInfo,
}

impl StatusReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_match_status_page() {
        let report = StatusReport {
            stopped: true,
            filament_runout: false,
            elegoo: PrinterInfo {
                mainboard_id: "MB".into(),
                print_status: 13,
                is_printing: true,
                current_layer: 5,
                total_layer: 100,
                progress: 4,
                current_ticks: 10,
                total_ticks: 1000,
                print_speed_pct: 100,
                is_websocket_connected: true,
                current_z: 0.5,
                waiting_for_ack: false,
            },
        };
        let v: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(v["stopped"], true);
        assert_eq!(v["filamentRunout"], false);
        let e = &v["elegoo"];
        assert_eq!(e["mainboardID"], "MB");
        assert_eq!(e["printStatus"], 13);
        assert_eq!(e["PrintSpeedPct"], 100);
        assert_eq!(e["isWebsocketConnected"], true);
        assert_eq!(e["waitingForAck"], false);
        assert_eq!(e["currentZ"], 0.5);
    }
}
