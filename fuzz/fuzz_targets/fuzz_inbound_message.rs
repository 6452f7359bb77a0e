//! Fuzz target: `PrinterClient::handle_text`
//!
//! Drives arbitrary text frames through the inbound path (JSON parse,
//! classification, ack matching, status parsing) and asserts that the
//! client never panics and never holds more than one pending command.
//!
//! cargo fuzz run fuzz_inbound_message

#![no_main]

use core::time::Duration;

use critical_section as _;
use filament_bridge::app::events::BridgeEvent;
use filament_bridge::app::ports::{EventSink, Transport, TransportEvent};
use filament_bridge::error::TransportError;
use filament_bridge::printer::PrinterClient;
use libfuzzer_sys::fuzz_target;

struct Loopback;

impl Transport for Loopback {
    fn connect(&mut self, _uri: &str, _reconnect: Duration) -> Result<(), TransportError> {
        Ok(())
    }
    fn disconnect(&mut self) {}
    fn is_connected(&self) -> bool {
        true
    }
    fn send_text(&mut self, _text: &str) -> Result<(), TransportError> {
        Ok(())
    }
    fn poll_event(&mut self) -> Option<TransportEvent> {
        None
    }
}

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &BridgeEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    let mut client = PrinterClient::new(Loopback);
    let mut sink = Discard;

    // Once with nothing pending, once with a pause in flight.
    client.handle_text(text, 1_000, &mut sink);
    let _ = client.pause_print(2_000, 1_700_000_000);
    client.handle_text(text, 3_000, &mut sink);

    let status = client.status();
    assert!(status.machine.bits() < 1 << 5);
});
