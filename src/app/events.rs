//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, or frame them onto
//! the host link.

use super::commands::HostCommand;
use crate::error::{CommandError, InitError};
use crate::protocol::telemetry::TelemetryFrame;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Sensing is up and the watchdog is armed.
    Started { channels: usize },

    /// One acquisition cycle, channels in configuration order.
    Telemetry(TelemetryFrame),

    /// The host went silent; actuators have been shut down.
    LinkLost { silent_ms: u64 },

    /// The host is back.  Actuators stay off until re-commanded.
    LinkRestored { downtime_ms: u64, recoveries: u32 },

    /// A host command was applied.
    CommandApplied(HostCommand),

    /// A host line was rejected and nothing changed.
    CommandRejected(CommandError),

    /// Startup failed; the device will not operate.
    InitFailed(InitError),
}
