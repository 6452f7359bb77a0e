//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host (x86_64) with no
//! real hardware or printer required.

// embassy-sync needs a critical-section implementation on the host.
use critical_section as _;

mod bridge_tests;
mod mock_hw;
