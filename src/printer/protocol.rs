//! SDCP wire format: the JSON-over-WebSocket protocol spoken by the printer.
//!
//! Only the subset the bridge needs: status requests, pause/resume with
//! acknowledgment, and the two inbound message shapes (ack and status push).
//!
//! ```text
//! outbound  {"Id":id,"Data":{"Cmd":n,"Data":{},"RequestID":id,
//!            "MainboardID":mb,"TimeStamp":t,"From":2}}
//! ack       {"Id":..,"Data":{"Cmd":n,"Data":{"Ack":k},"RequestID":..,"MainboardID":..}}
//! status    {"Status":{"CurrentStatus":[..],"CurrenCoord":"x,y,z","PrintInfo":{..}},
//!            "MainboardID":..}
//! ```

use serde::Serialize;
use serde_json::Value;

/// TCP port of the printer's WebSocket server.
pub const PRINTER_WS_PORT: u16 = 3030;
/// Request path of the printer's WebSocket endpoint.
pub const PRINTER_WS_PATH: &str = "/websocket";

/// `From` tag identifying this client.  The printer's web UI uses 1 and
/// OctoEverywhere uses 0; the peer documents no meaning for the value.
pub const SENDER_TAG: u8 = 2;

/// Plain text liveness frame.  Protocol-level WebSocket pings are not
/// answered reliably by the printer.
pub const KEEPALIVE_FRAME: &str = "ping";

/// Build the WebSocket URI for a printer address.
pub fn endpoint_uri(address: &str) -> String {
    format!("ws://{}:{}{}", address, PRINTER_WS_PORT, PRINTER_WS_PATH)
}

// ───────────────────────────────────────────────────────────────
// Commands
// ───────────────────────────────────────────────────────────────

/// SDCP command codes used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Command {
    /// Request a full status push.
    Status = 0,
    PausePrint = 129,
    ContinuePrint = 131,
}

impl Command {
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Whether the bridge tracks an acknowledgment for this command.
    pub const fn requires_ack(self) -> bool {
        matches!(self, Self::PausePrint | Self::ContinuePrint)
    }
}

/// Fresh correlation id: UUID v4 without dashes (the printer rejects dashes).
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CommandFrame<'a> {
    id: &'a str,
    data: CommandBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CommandBody<'a> {
    cmd: u16,
    data: EmptyParams,
    #[serde(rename = "RequestID")]
    request_id: &'a str,
    #[serde(rename = "MainboardID")]
    mainboard_id: &'a str,
    time_stamp: u64,
    from: u8,
}

#[derive(Serialize)]
struct EmptyParams {}

/// Serialise an outbound command.  `request_id` doubles as the message `Id`.
pub fn encode_command(
    command: Command,
    request_id: &str,
    mainboard_id: &str,
    unix_secs: u64,
) -> Result<String, serde_json::Error> {
    serde_json::to_string(&CommandFrame {
        id: request_id,
        data: CommandBody {
            cmd: command.code(),
            data: EmptyParams {},
            request_id,
            mainboard_id,
            time_stamp: unix_secs,
            from: SENDER_TAG,
        },
    })
}

// ───────────────────────────────────────────────────────────────
// Inbound classification
// ───────────────────────────────────────────────────────────────

/// A command acknowledgment received from the printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckFrame {
    pub command: u16,
    pub request_id: String,
    /// `Data.MainboardID`, when non-empty.
    pub mainboard_id: Option<String>,
    /// `Data.Data.Ack` result code (0 = accepted).
    pub ack: Option<i64>,
}

/// What an inbound JSON document turned out to be.
#[derive(Debug, PartialEq)]
pub enum Inbound<'a> {
    Ack(AckFrame),
    Status {
        status: &'a Value,
        mainboard_id: Option<&'a str>,
    },
    /// Any other shape, including an `Id`+`Data` frame without
    /// `Cmd`/`RequestID`.
    Ignored,
}

/// Route a parsed document: `Id` + `Data` means acknowledgment, else
/// `Status` means status push, else ignore.
pub fn classify(doc: &Value) -> Inbound<'_> {
    if let (Some(_), Some(data)) = (doc.get("Id"), doc.get("Data")) {
        return parse_ack(data).map_or(Inbound::Ignored, Inbound::Ack);
    }
    if let Some(status) = doc.get("Status") {
        return Inbound::Status {
            status,
            mainboard_id: non_empty_str(doc.get("MainboardID")),
        };
    }
    Inbound::Ignored
}

fn parse_ack(data: &Value) -> Option<AckFrame> {
    let command = data.get("Cmd").and_then(Value::as_u64)?;
    let request_id = data.get("RequestID").and_then(Value::as_str)?;
    Some(AckFrame {
        command: u16::try_from(command).ok()?,
        request_id: request_id.to_owned(),
        mainboard_id: non_empty_str(data.get("MainboardID")).map(str::to_owned),
        ack: data
            .get("Data")
            .and_then(|d| d.get("Ack"))
            .and_then(Value::as_i64),
    })
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).filter(|s| !s.is_empty())
}
