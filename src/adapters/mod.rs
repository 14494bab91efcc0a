//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements      | Connects to                      |
//! |----------------|-----------------|----------------------------------|
//! | `channel_sink` | EventSink       | embassy Signal + error Channel   |
//! | `json_config`  | ConfigPort      | JSON file on disk                |
//! | `log_sink`     | EventSink       | `log` facade                     |
//! | `replay`       | PoseDetector    | recorded JSONL detector output   |
//! | `time`         | Clock           | `std::time::Instant`             |
//! | `visibility`   | VisibilityPort  | host foreground flag             |

pub mod channel_sink;
pub mod json_config;
pub mod log_sink;
pub mod replay;
pub mod time;
pub mod visibility;
