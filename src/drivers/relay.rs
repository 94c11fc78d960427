//! 8-channel relay module driver.
//!
//! Every relay is active LOW: driving the pin low energises the coil.
//! The actuator → GPIO mapping comes from
//! [`SystemConfig::relays`](crate::config::SystemConfig); actuators without
//! a binding are accepted and ignored.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use log::{info, warn};

use crate::app::commands::Actuator;
use crate::app::ports::ActuatorPort;
use crate::config::{RELAY_COUNT, RelayBinding};
use crate::drivers::hw_init::{self, HwInitError};

/// Pin level that energises a relay.
const ACTIVE_LEVEL: bool = false;

const fn level_for(on: bool) -> bool {
    if on { ACTIVE_LEVEL } else { !ACTIVE_LEVEL }
}

pub struct RelayBank {
    pins: [Option<i32>; RELAY_COUNT],
    on: [bool; RELAY_COUNT],
    /// Last level written per actuator.
    levels: [bool; RELAY_COUNT],
}

impl RelayBank {
    /// Build from the relay table.  No hardware is touched.
    pub fn new(bindings: &[RelayBinding]) -> Self {
        let mut pins = [None; RELAY_COUNT];
        for b in bindings {
            pins[b.actuator.index()] = Some(b.gpio);
        }
        Self {
            pins,
            on: [false; RELAY_COUNT],
            levels: [level_for(false); RELAY_COUNT],
        }
    }

    /// Configure every bound pin as an output, already OFF.
    pub fn init(&mut self) -> Result<(), HwInitError> {
        let mut outputs = heapless::Vec::<i32, RELAY_COUNT>::new();
        for pin in self.pins.iter().flatten() {
            let _ = outputs.push(*pin);
        }
        hw_init::init_outputs(&outputs, level_for(false))?;
        self.on = [false; RELAY_COUNT];
        self.levels = [level_for(false); RELAY_COUNT];
        Ok(())
    }

    fn drive(&mut self, actuator: Actuator, on: bool) {
        let i = actuator.index();
        let Some(pin) = self.pins[i] else {
            warn!("RELAY: {} has no pin", actuator);
            return;
        };
        let level = level_for(on);
        hw_init::gpio_write(pin, level);
        self.levels[i] = level;
        self.on[i] = on;
    }

    /// Level last written to `actuator`'s pin, if bound.
    pub fn level(&self, actuator: Actuator) -> Option<bool> {
        self.pins[actuator.index()].map(|_| self.levels[actuator.index()])
    }

    pub fn active_count(&self) -> usize {
        self.on.iter().filter(|&&on| on).count()
    }
}

impl ActuatorPort for RelayBank {
    fn set(&mut self, actuator: Actuator, on: bool) {
        self.drive(actuator, on);
    }

    fn shutdown_all(&mut self) {
        for a in Actuator::ALL {
            if self.pins[a.index()].is_some() {
                self.drive(a, false);
            }
        }
        info!("RELAY: all actuators OFF");
    }

    fn is_on(&self, actuator: Actuator) -> bool {
        self.on[actuator.index()]
    }
}
