//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements  | Connects to                          |
//! |-------------|-------------|--------------------------------------|
//! | `hardware`  | SensorPort  | Runout switch + movement encoder GPIO|
//! | `log_sink`  | EventSink   | Serial log output                    |
//! | `ring_log`  | EventSink   | Last 50 events for the status page   |
//! | `nvs`       | ConfigPort  | NVS / in-memory store                |
//! | `time`      | Clock       | ESP32 system timer / host `Instant`  |
//! | `websocket` | Transport   | ESP-IDF WebSocket client             |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod ring_log;
pub mod time;
pub mod websocket;
