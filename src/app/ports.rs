//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor pipeline, relays, event sinks, host link)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use super::commands::Actuator;
use super::events::AppEvent;
use crate::error::InitError;
use crate::sensors::Reading;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain per-room readings.
pub trait SensorPort {
    /// Bring the sensing subsystem up.  An error here is fatal.
    fn begin(&mut self) -> Result<(), InitError>;

    fn channel_count(&self) -> usize;

    /// Room label of channel `index`.
    fn room(&self, index: usize) -> Option<&str>;

    /// Acquire one channel.  Never fails; faults yield last-known-good.
    fn acquire(&mut self, index: usize, now_ms: u64) -> Reading;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command relays.
pub trait ActuatorPort {
    fn set(&mut self, actuator: Actuator, on: bool);

    /// Every actuator off.  This is the safe state.
    fn shutdown_all(&mut self);

    fn is_on(&self, actuator: Actuator) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / host link)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.  Adapters
/// decide where they go (serial log, host link, both).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Host transport (driven adapter: domain ↔ serial link)
// ───────────────────────────────────────────────────────────────

/// Byte-level access to the link to the host gateway.
pub trait HostTransport {
    /// Next received byte, without blocking.
    fn read_byte(&mut self) -> Option<u8>;

    /// Write `line` followed by a newline.  Best effort.
    fn write_line(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic milliseconds since boot.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Fan one event out to two sinks.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}
