//! Filament bridge firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod pins;
pub mod policy;
pub mod printer;
pub mod sensors;

// The ESP-IDF halves of the adapters are guarded by cfg attributes inside.
pub mod adapters;

// embassy-sync needs a critical-section implementation on host test builds.
#[cfg(all(test, not(target_os = "espidf")))]
use critical_section as _;
