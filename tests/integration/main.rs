//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  Everything runs on the host with scripted
//! detectors and a manual clock; no camera or model is involved.

mod detection_loop_tests;
mod engine_tests;
mod mock_ports;
