//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the liveness watchdog, the host line framer and the
//! loop schedule.  It exposes a clean, hardware-agnostic API.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │      AppService         │
//! ActuatorPort ◀──│  Watchdog · Commands    │◀── host bytes
//!                 └────────────────────────┘
//! ```
//!
//! ## Link-loss policy
//!
//! On each watchdog timeout edge every actuator is shut down once and
//! [`AppEvent::LinkLost`] is emitted.  Recovery only emits
//! [`AppEvent::LinkRestored`]; the host re-commands actuators itself.

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::error::InitError;
use crate::protocol::command::parse_line;
use crate::protocol::line::LineAssembler;
use crate::protocol::telemetry::TelemetryFrame;
use crate::safety::LivenessWatchdog;

use super::commands::HostCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, Clock, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    watchdog: LivenessWatchdog,
    framer: LineAssembler,
    read_interval_ms: u64,
    check_interval_ms: u64,
    next_read_ms: u64,
    next_check_ms: u64,
    started: bool,
    cycles: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware; call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            watchdog: LivenessWatchdog::new(config.watchdog_timeout_ms),
            framer: LineAssembler::new(),
            read_interval_ms: u64::from(config.sensor_read_interval_ms),
            check_interval_ms: u64::from(config.watchdog_check_interval_ms),
            next_read_ms: 0,
            next_check_ms: 0,
            started: false,
            cycles: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every actuator off, bring sensing up, then arm the watchdog.
    ///
    /// The clock is read after sensor init so the warm-up does not count
    /// against the host.  On error nothing is armed and actuators stay off.
    pub fn start(
        &mut self,
        sensors: &mut impl SensorPort,
        actuators: &mut impl ActuatorPort,
        clock: &impl Clock,
        sink: &mut impl EventSink,
    ) -> Result<(), InitError> {
        actuators.shutdown_all();

        if let Err(e) = sensors.begin() {
            sink.emit(&AppEvent::InitFailed(e));
            return Err(e);
        }

        let now = clock.now_ms();
        self.watchdog.begin(now);
        self.next_read_ms = now.saturating_add(self.read_interval_ms);
        self.next_check_ms = now.saturating_add(self.check_interval_ms);
        self.started = true;

        let channels = sensors.channel_count();
        sink.emit(&AppEvent::Started { channels });
        info!("AppService started with {} sensor channel(s)", channels);
        Ok(())
    }

    // ── Host link ─────────────────────────────────────────────

    /// Ingest bytes from the host.  Every byte is a heartbeat.
    pub fn on_host_bytes(
        &mut self,
        bytes: &[u8],
        now_ms: u64,
        actuators: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        for &byte in bytes {
            if let Some(rec) = self.watchdog.heartbeat(now_ms) {
                sink.emit(&AppEvent::LinkRestored {
                    downtime_ms: rec.downtime_ms,
                    recoveries: rec.recovery_count,
                });
            }

            match self.framer.push(byte) {
                None => {}
                Some(Ok(line)) => self.dispatch(&line, actuators, sink),
                Some(Err(e)) => {
                    warn!("CMD: rejected line: {}", e);
                    sink.emit(&AppEvent::CommandRejected(e));
                }
            }
        }
    }

    fn dispatch(&mut self, line: &str, actuators: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let cmd = match parse_line(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("CMD: {}: {:?}", e, line);
                sink.emit(&AppEvent::CommandRejected(e));
                return;
            }
        };
        self.handle_command(cmd, actuators, sink);
    }

    /// Apply a validated command.
    pub fn handle_command(
        &mut self,
        cmd: HostCommand,
        actuators: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            HostCommand::Keepalive => {
                debug!("CMD: keepalive");
                return;
            }
            HostCommand::SetActuator { actuator, on } => {
                actuators.set(actuator, on);
                info!("[CMD] Set {} to {}", actuator, if on { "ON" } else { "OFF" });
            }
            HostCommand::AllOff => {
                actuators.shutdown_all();
                info!("[CMD] All actuators OFF");
            }
        }
        sink.emit(&AppEvent::CommandApplied(cmd));
    }

    // ── Periodic work ─────────────────────────────────────────

    /// Run whatever is due at `now_ms`: the watchdog check, then an
    /// acquisition cycle.  Does nothing before a successful start.
    pub fn poll(
        &mut self,
        now_ms: u64,
        sensors: &mut impl SensorPort,
        actuators: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if !self.started {
            return;
        }

        if now_ms >= self.next_check_ms {
            self.next_check_ms = now_ms.saturating_add(self.check_interval_ms);
            if self.watchdog.check_timeout(now_ms) {
                actuators.shutdown_all();
                sink.emit(&AppEvent::LinkLost {
                    silent_ms: self.watchdog.elapsed_ms(now_ms),
                });
            }
        }

        if now_ms >= self.next_read_ms {
            self.next_read_ms = now_ms.saturating_add(self.read_interval_ms);
            let frame = self.acquire_cycle(now_ms, sensors);
            sink.emit(&AppEvent::Telemetry(frame));
        }
    }

    /// Read every channel once, in configuration order.
    pub fn acquire_cycle(&mut self, now_ms: u64, sensors: &mut impl SensorPort) -> TelemetryFrame {
        self.cycles += 1;
        let mut frame = TelemetryFrame::new();
        for index in 0..sensors.channel_count() {
            let reading = sensors.acquire(index, now_ms);
            let room = sensors.room(index).unwrap_or("unknown");
            frame.push(room, reading);
        }
        frame
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// False while the host link is considered lost.
    pub fn is_link_safe(&self) -> bool {
        self.watchdog.is_safe()
    }

    pub fn watchdog(&self) -> &LivenessWatchdog {
        &self.watchdog
    }

    /// Acquisition cycles run since startup.
    pub fn cycle_count(&self) -> u64 {
        self.cycles
    }
}
