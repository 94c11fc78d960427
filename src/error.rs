//! Unified error types for the M.A.S.H. firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level control loop's error handling uniform.  All variants are `Copy`
//! so they can be passed through the acquisition pipeline and the service
//! without allocation.
//!
//! Only [`InitError`] is ever fatal.  Everything else degrades to a
//! last-known-good reading or a rejected command.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The shared I2C bus or the multiplexer failed.
    Bus(BusError),
    /// A sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// Startup could not verify the sensing subsystem.
    Init(InitError),
    /// A host command could not be parsed or applied.
    Command(CommandError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bus errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// Requested mux segment is outside 0..=7.  The bus was not touched.
    InvalidChannel(u8),
    /// The addressed device did not acknowledge.
    Nack,
    /// Arbitration lost, bus stuck, or a driver-level timeout.
    Transfer,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(ch) => write!(f, "invalid mux channel {ch}"),
            Self::Nack => write!(f, "no acknowledge"),
            Self::Transfer => write!(f, "transfer failed"),
        }
    }
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl BusError {
    /// Collapse an `embedded-hal` I2C error into the firmware taxonomy.
    pub fn from_i2c<E: embedded_hal::i2c::Error>(e: &E) -> Self {
        use embedded_hal::i2c::ErrorKind;
        match e.kind() {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            _ => Self::Transfer,
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The bus transaction with the sensor failed.
    Bus(BusError),
    /// A received word failed its CRC check.
    Crc,
    /// The sensor reported an error code.
    Device(u16),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "{e}"),
            Self::Crc => write!(f, "CRC mismatch"),
            Self::Device(code) => write!(f, "device error 0x{code:04x}"),
        }
    }
}

impl From<BusError> for SensorError {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Init errors
// ---------------------------------------------------------------------------

/// Fatal startup faults.  The documented caller behaviour is to halt in a
/// visible error-reporting loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The multiplexer did not acknowledge its address.
    MuxNotDetected,
    /// Selecting the segment of sensor channel `index` failed.
    ChannelSelect { index: usize },
    /// Starting periodic measurement on sensor channel `index` failed.
    SensorStart { index: usize, cause: SensorError },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MuxNotDetected => write!(f, "multiplexer not detected"),
            Self::ChannelSelect { index } => {
                write!(f, "failed to select mux segment for channel {index}")
            }
            Self::SensorStart { index, cause } => {
                write!(f, "sensor on channel {index} failed to start: {cause}")
            }
        }
    }
}

impl InitError {
    /// Stable snake_case name for the host link.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MuxNotDetected => "mux_not_detected",
            Self::ChannelSelect { .. } => "channel_select",
            Self::SensorStart { .. } => "sensor_start",
        }
    }

    /// Sensor channel the fault belongs to, if any.
    pub fn channel(&self) -> Option<usize> {
        match self {
            Self::MuxNotDetected => None,
            Self::ChannelSelect { index } | Self::SensorStart { index, .. } => Some(*index),
        }
    }
}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Line exceeded the receive buffer and was discarded.
    LineTooLong,
    /// Not valid UTF-8 or not valid JSON.
    Malformed,
    /// JSON command lacked `actuator` or `state`.
    MissingField,
    /// The actuator name is not in the canonical channel set.
    UnknownActuator,
    /// State was not `ON` or `OFF`.
    InvalidState,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineTooLong => write!(f, "line too long"),
            Self::Malformed => write!(f, "malformed command"),
            Self::MissingField => write!(f, "missing 'actuator' or 'state'"),
            Self::UnknownActuator => write!(f, "unknown actuator"),
            Self::InvalidState => write!(f, "state must be ON or OFF"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// A configuration field failed validation.  Invalid values are rejected,
/// never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// JSON could not be deserialised into a config.
    Parse,
    /// The `&'static str` names the field and the rule it broke.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "config parse failed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// core::error::Error (lets `main` use `?` into anyhow)
// ---------------------------------------------------------------------------

impl core::error::Error for Error {}
impl core::error::Error for BusError {}
impl core::error::Error for SensorError {}
impl core::error::Error for InitError {}
impl core::error::Error for CommandError {}
impl core::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
