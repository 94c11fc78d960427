//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements     | Connects to                |
//! |-------------|----------------|----------------------------|
//! | `host_link` | EventSink      | Gateway UART (JSON lines)  |
//! |             | HostTransport  | UART / in-memory loopback  |
//! | `log_sink`  | EventSink      | Serial log output          |
//! | `time`      | Clock          | ESP32 system timer         |
//!
//! The sensor and actuator ports are implemented directly by
//! [`AcquisitionPipeline`](crate::sensors::acquisition::AcquisitionPipeline)
//! and [`RelayBank`](crate::drivers::relay::RelayBank).

pub mod host_link;
pub mod log_sink;
pub mod time;
