//! Application core: posture domain logic behind port traits.
//!
//! [`service::PostureEngine`] runs the per-frame pipeline and owns all
//! per-instance state.  [`detection_loop`] drives it cooperatively from
//! a [`ports::PoseDetector`].  Everything outside talks to the core
//! through [`ports`], keeping it testable without a camera or model.

pub mod commands;
pub mod detection_loop;
pub mod events;
pub mod ports;
pub mod service;
