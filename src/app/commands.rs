//! Inbound commands from the host link.
//!
//! These represent validated actions requested by the gateway that the
//! [`AppService`](super::service::AppService) applies.  Parsing lives in
//! [`protocol::command`](crate::protocol::command).

use serde::{Deserialize, Serialize};

/// The canonical actuator channel set: one relay each on the 8-channel
/// module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Actuator {
    MistMaker,
    HumidifierFan,
    FruitingExhaustFan,
    FruitingIntakeFan,
    SpawningExhaustFan,
    DeviceExhaustFan,
    FruitingLed,
    Reserved,
}

impl Actuator {
    pub const ALL: [Actuator; 8] = [
        Self::MistMaker,
        Self::HumidifierFan,
        Self::FruitingExhaustFan,
        Self::FruitingIntakeFan,
        Self::SpawningExhaustFan,
        Self::DeviceExhaustFan,
        Self::FruitingLed,
        Self::Reserved,
    ];

    /// Wire name used by the host protocol.
    pub const fn name(self) -> &'static str {
        match self {
            Self::MistMaker => "MIST_MAKER",
            Self::HumidifierFan => "HUMIDIFIER_FAN",
            Self::FruitingExhaustFan => "FRUITING_EXHAUST_FAN",
            Self::FruitingIntakeFan => "FRUITING_INTAKE_FAN",
            Self::SpawningExhaustFan => "SPAWNING_EXHAUST_FAN",
            Self::DeviceExhaustFan => "DEVICE_EXHAUST_FAN",
            Self::FruitingLed => "FRUITING_LED",
            Self::Reserved => "RESERVED",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// Dense index for state arrays.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl core::fmt::Display for Actuator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Commands that the host link can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Liveness only.  The byte-level heartbeat already happened.
    Keepalive,

    /// Drive one relay.
    SetActuator { actuator: Actuator, on: bool },

    /// Every relay off (legacy `ALL_OFF`).
    AllOff,
}
