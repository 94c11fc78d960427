//! System configuration parameters
//!
//! All tunable parameters for the M.A.S.H. controller.  Loaded once at
//! startup, either from [`SystemConfig::default()`] or from a JSON
//! document via [`SystemConfig::from_json`].  Invalid values are rejected,
//! never clamped.

use serde::{Deserialize, Serialize};

use crate::app::commands::Actuator;
use crate::error::ConfigError;
use crate::pins;
use crate::sensors::mux::{DEFAULT_MUX_ADDRESS, MUX_CHANNELS};
use crate::sensors::scd41::DEFAULT_SCD41_ADDRESS;

/// Upper bound on logical sensor channels (one per mux segment).
pub const MAX_SENSOR_CHANNELS: usize = MUX_CHANNELS as usize;
/// Relay module width.
pub const RELAY_COUNT: usize = 8;
/// Room labels appear as telemetry keys.
pub const ROOM_LABEL_CAP: usize = 16;

pub type RoomLabel = heapless::String<ROOM_LABEL_CAP>;

/// One logical sensor: the room it reports for and its mux segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorChannel {
    pub room: RoomLabel,
    pub mux_channel: u8,
}

/// Actuator → relay GPIO.  All relays are active LOW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayBinding {
    pub actuator: Actuator,
    pub gpio: i32,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Acquisition ---
    /// Sensor read + telemetry interval (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// Settle time after starting periodic measurement (milliseconds)
    pub sensor_warmup_ms: u32,
    /// Consecutive bus failures before stuck-bus recovery runs
    pub bus_failure_threshold: u8,

    // --- Bus addresses ---
    pub mux_address: u8,
    pub sensor_address: u8,

    // --- Host-link watchdog ---
    /// Silence on the host link before actuators are shut down (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// How often the timeout is evaluated (milliseconds)
    pub watchdog_check_interval_ms: u32,

    // --- Tables ---
    /// Acquisition order is table order.
    pub sensor_channels: heapless::Vec<SensorChannel, MAX_SENSOR_CHANNELS>,
    pub relays: heapless::Vec<RelayBinding, RELAY_COUNT>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut sensor_channels = heapless::Vec::new();
        for (room, mux_channel) in [("fruiting", 0), ("spawning", 1)] {
            let _ = sensor_channels.push(SensorChannel {
                room: room_label(room),
                mux_channel,
            });
        }

        let mut relays = heapless::Vec::new();
        for (actuator, gpio) in [
            (Actuator::MistMaker, pins::RELAY_MIST_MAKER_GPIO),
            (Actuator::HumidifierFan, pins::RELAY_HUMIDIFIER_FAN_GPIO),
            (Actuator::FruitingExhaustFan, pins::RELAY_FRUITING_EXHAUST_FAN_GPIO),
            (Actuator::FruitingIntakeFan, pins::RELAY_FRUITING_INTAKE_FAN_GPIO),
            (Actuator::SpawningExhaustFan, pins::RELAY_SPAWNING_EXHAUST_FAN_GPIO),
            (Actuator::DeviceExhaustFan, pins::RELAY_DEVICE_EXHAUST_FAN_GPIO),
            (Actuator::FruitingLed, pins::RELAY_FRUITING_LED_GPIO),
            (Actuator::Reserved, pins::RELAY_RESERVED_GPIO),
        ] {
            let _ = relays.push(RelayBinding { actuator, gpio });
        }

        Self {
            // Acquisition
            sensor_read_interval_ms: 5000, // SCD41 periodic rate
            sensor_warmup_ms: 2000,
            bus_failure_threshold: 3,

            // Bus
            mux_address: DEFAULT_MUX_ADDRESS,
            sensor_address: DEFAULT_SCD41_ADDRESS,

            // Watchdog
            watchdog_timeout_ms: 10_000,
            watchdog_check_interval_ms: 1000,

            sensor_channels,
            relays,
        }
    }
}

impl SystemConfig {
    /// Parse and validate a JSON config.  Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field.  The first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg| Err(ConfigError::ValidationFailed(msg));

        if self.sensor_read_interval_ms == 0 {
            return fail("sensor_read_interval_ms must be > 0");
        }
        if self.bus_failure_threshold == 0 {
            return fail("bus_failure_threshold must be > 0");
        }
        if self.watchdog_timeout_ms == 0 {
            return fail("watchdog_timeout_ms must be > 0");
        }
        if self.watchdog_check_interval_ms == 0 {
            return fail("watchdog_check_interval_ms must be > 0");
        }
        if self.watchdog_check_interval_ms >= self.watchdog_timeout_ms {
            return fail("watchdog_check_interval_ms must be below watchdog_timeout_ms");
        }

        if self.sensor_channels.is_empty() {
            return fail("sensor_channels must not be empty");
        }
        for (i, ch) in self.sensor_channels.iter().enumerate() {
            if ch.mux_channel >= MUX_CHANNELS {
                return fail("sensor_channels: mux_channel must be 0..=7");
            }
            if ch.room.is_empty() {
                return fail("sensor_channels: room must not be empty");
            }
            let rest = &self.sensor_channels[i + 1..];
            if rest.iter().any(|o| o.mux_channel == ch.mux_channel) {
                return fail("sensor_channels: duplicate mux_channel");
            }
            if rest.iter().any(|o| o.room == ch.room) {
                return fail("sensor_channels: duplicate room");
            }
        }

        for (i, binding) in self.relays.iter().enumerate() {
            if binding.gpio < 0 {
                return fail("relays: gpio must be non-negative");
            }
            if binding.gpio > pins::MAX_GPIO {
                return fail("relays: gpio must be at most 48");
            }
            let rest = &self.relays[i + 1..];
            if rest.iter().any(|o| o.actuator == binding.actuator) {
                return fail("relays: duplicate actuator");
            }
            if rest.iter().any(|o| o.gpio == binding.gpio) {
                return fail("relays: duplicate gpio");
            }
        }

        Ok(())
    }

    /// GPIO bound to `actuator`, if any.
    pub fn relay_gpio(&self, actuator: Actuator) -> Option<i32> {
        self.relays
            .iter()
            .find(|b| b.actuator == actuator)
            .map(|b| b.gpio)
    }
}

/// Build a room label, truncating at capacity.
pub fn room_label(s: &str) -> RoomLabel {
    let mut label = RoomLabel::new();
    for c in s.chars() {
        if label.push(c).is_err() {
            break;
        }
    }
    label
}
