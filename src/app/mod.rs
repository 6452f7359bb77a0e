//! Application core: pure domain orchestration, zero I/O.
//!
//! The [`service::BridgeService`] drives one control cycle at a time over
//! the printer client, sensor monitor and pause policy.  All interaction
//! with hardware and the network happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod report;
pub mod service;
