//! Host-link adapter.
//!
//! [`HostLinkSink`] frames telemetry and link status onto a
//! [`HostTransport`].  On ESP-IDF the transport is the gateway UART; on
//! host targets [`MemoryTransport`] stands in for it.

use std::collections::VecDeque;

use log::warn;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, HostTransport};
use crate::protocol::telemetry::StatusLine;

/// Writes the host-visible subset of [`AppEvent`]s as JSON lines.
pub struct HostLinkSink<T> {
    transport: T,
}

impl<T: HostTransport> HostLinkSink<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

impl<T: HostTransport> EventSink for HostLinkSink<T> {
    fn emit(&mut self, event: &AppEvent) {
        let line = match event {
            AppEvent::Telemetry(frame) => frame.to_line(),
            AppEvent::LinkLost { silent_ms } => StatusLine::LinkLost {
                silent_ms: *silent_ms,
            }
            .to_line(),
            AppEvent::LinkRestored {
                downtime_ms,
                recoveries,
            } => StatusLine::LinkRestored {
                downtime_ms: *downtime_ms,
                recoveries: *recoveries,
            }
            .to_line(),
            AppEvent::InitFailed(e) => StatusLine::InitFailed {
                error: e.code(),
                channel: e.channel(),
            }
            .to_line(),
            _ => return,
        };
        match line {
            Ok(line) => self.transport.write_line(&line),
            Err(e) => warn!("HOST: serialise failed: {}", e),
        }
    }
}

// ── Transports ────────────────────────────────────────────────

/// ESP-IDF UART transport.  Requires [`init_uart`](crate::drivers::hw_init::init_uart).
#[cfg(target_os = "espidf")]
#[derive(Default)]
pub struct UartTransport;

#[cfg(target_os = "espidf")]
impl HostTransport for UartTransport {
    fn read_byte(&mut self) -> Option<u8> {
        crate::drivers::hw_init::uart_read_byte()
    }

    fn write_line(&mut self, line: &str) {
        crate::drivers::hw_init::uart_write(line.as_bytes());
        crate::drivers::hw_init::uart_write(b"\n");
    }
}

/// In-memory loopback for simulation and tests.
#[derive(Default)]
pub struct MemoryTransport {
    pub rx: VecDeque<u8>,
    pub tx: Vec<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the host had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }
}

impl HostTransport for MemoryTransport {
    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_line(&mut self, line: &str) {
        self.tx.push(line.to_owned());
    }
}
