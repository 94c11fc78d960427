//! Task Watchdog Timer (TWDT) backstop.
//!
//! Resets the MCU if the control loop itself stops running, e.g. a bus
//! transfer that never returns.  Host-link loss is handled separately by
//! [`LivenessWatchdog`](crate::safety::LivenessWatchdog); this timer knows
//! nothing about the host.
//!
//! The main loop must call `feed()` on every iteration.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::{info, warn};

/// Loop stall that triggers a reset.
pub const TWDT_TIMEOUT_MS: u32 = 10_000;

pub struct TaskWatchdog {
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for TaskWatchdog {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskWatchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: TWDT API calls from the main task during boot.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms: TWDT_TIMEOUT_MS,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!("TWDT: reconfigure returned {} (may already be configured)", ret);
                }

                let subscribed = esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK;
                if subscribed {
                    info!("TWDT: subscribed ({} ms, panic on trigger)", TWDT_TIMEOUT_MS);
                } else {
                    warn!("TWDT: failed to subscribe, loop hangs will not reset");
                }
                Self { subscribed }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            log::info!("TWDT(sim): no-op");
            Self {}
        }
    }

    /// Feed the watchdog.  Must be called at least every `TWDT_TIMEOUT_MS`.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the current task's TWDT entry.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
