//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (USB-CDC console in production).  The host link has
//! its own sink in [`host_link`](super::host_link).

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(frame) => {
                for (room, r) in frame.iter() {
                    if r.valid {
                        info!(
                            "TELEM | {} | T={:.1}\u{00b0}C RH={:.1}% CO2={}ppm",
                            room, r.temperature, r.humidity, r.co2_ppm
                        );
                    } else {
                        info!("TELEM | {} | invalid", room);
                    }
                }
            }
            AppEvent::Started { channels } => {
                info!("START | {} sensor channel(s), watchdog armed", channels);
            }
            AppEvent::LinkLost { silent_ms } => {
                error!("WATCHDOG | link lost after {} ms, actuators OFF", silent_ms);
            }
            AppEvent::LinkRestored {
                downtime_ms,
                recoveries,
            } => {
                info!(
                    "WATCHDOG | link restored, down {} ms, recoveries={}",
                    downtime_ms, recoveries
                );
            }
            AppEvent::CommandApplied(cmd) => {
                info!("CMD | applied {:?}", cmd);
            }
            AppEvent::CommandRejected(e) => {
                warn!("CMD | rejected: {}", e);
            }
            AppEvent::InitFailed(e) => {
                error!("INIT | {}", e);
            }
        }
    }
}
