//! Host-link liveness watchdog.
//!
//! The watchdog only detects and reports.  What happens on a timeout is
//! decided by the control loop ([`AppService`](crate::app::service::AppService)
//! shuts every actuator down).
//!
//! ## State machine
//!
//! ```text
//!            begin()                 check_timeout() → true
//!   Idle ───────────▶ ArmedOk ─────────────────────────────▶ ArmedTriggered
//!                        ▲                                         │
//!                        └──────── heartbeat() → Some(Recovery) ───┘
//! ```
//!
//! Both reports are edge-triggered: `check_timeout()` fires once per
//! loss-of-contact episode and `heartbeat()` reports a recovery once per
//! episode.  All time arithmetic saturates, so a clock that steps
//! backwards reads as zero elapsed time.

use log::{error, info};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatchdogState {
    Idle,
    ArmedOk,
    ArmedTriggered,
}

/// Reported by the heartbeat that ends a loss-of-contact episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recovery {
    /// Time from the timeout edge to this heartbeat (ms).
    pub downtime_ms: u64,
    /// Total recoveries since `begin()`, including this one.
    pub recovery_count: u32,
}

pub struct LivenessWatchdog {
    timeout_ms: u64,
    state: WatchdogState,
    last_heartbeat_ms: u64,
    triggered_at_ms: u64,
    recoveries: u32,
}

impl LivenessWatchdog {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout_ms: u64::from(timeout_ms),
            state: WatchdogState::Idle,
            last_heartbeat_ms: 0,
            triggered_at_ms: 0,
            recoveries: 0,
        }
    }

    /// Arm the watchdog.  Clears the triggered flag and the recovery count.
    pub fn begin(&mut self, now_ms: u64) {
        self.state = WatchdogState::ArmedOk;
        self.last_heartbeat_ms = now_ms;
        self.triggered_at_ms = 0;
        self.recoveries = 0;
        info!("WATCHDOG: armed, timeout {} ms", self.timeout_ms);
    }

    /// Record contact from the host.
    ///
    /// Returns `Some` exactly once per episode, on the first heartbeat
    /// after a timeout fired.  Before `begin()` only the timestamp moves.
    pub fn heartbeat(&mut self, now_ms: u64) -> Option<Recovery> {
        self.last_heartbeat_ms = now_ms;
        if self.state != WatchdogState::ArmedTriggered {
            return None;
        }

        let downtime_ms = now_ms.saturating_sub(self.triggered_at_ms);
        self.state = WatchdogState::ArmedOk;
        self.recoveries = self.recoveries.saturating_add(1);
        info!(
            "WATCHDOG: host link restored after {} ms (recovery #{})",
            downtime_ms, self.recoveries
        );
        Some(Recovery {
            downtime_ms,
            recovery_count: self.recoveries,
        })
    }

    /// Evaluate the timeout.  True only on the ArmedOk → ArmedTriggered edge.
    pub fn check_timeout(&mut self, now_ms: u64) -> bool {
        if self.state != WatchdogState::ArmedOk {
            return false;
        }
        let elapsed = self.elapsed_ms(now_ms);
        if elapsed <= self.timeout_ms {
            return false;
        }

        self.state = WatchdogState::ArmedTriggered;
        self.triggered_at_ms = now_ms;
        error!(
            "WATCHDOG: no host contact for {} ms (timeout {} ms)",
            elapsed, self.timeout_ms
        );
        true
    }

    /// Milliseconds since the last heartbeat.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_heartbeat_ms)
    }

    /// False only while a timeout episode is in progress.
    pub fn is_safe(&self) -> bool {
        self.state != WatchdogState::ArmedTriggered
    }

    pub fn state(&self) -> WatchdogState {
        self.state
    }

    pub fn recovery_count(&self) -> u32 {
        self.recoveries
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Re-arm from scratch, as if `begin()` were called at `now_ms`.
    pub fn reset(&mut self, now_ms: u64) {
        self.begin(now_ms);
    }
}
