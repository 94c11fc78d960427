//! GPIO / peripheral pin assignments for the M.A.S.H. controller board.
//!
//! Single source of truth for fixed wiring.  Relay pins here are only the
//! defaults feeding [`SystemConfig::relays`](crate::config::SystemConfig);
//! the relay bank always drives whatever the loaded table says.

// ---------------------------------------------------------------------------
// I²C bus (TCA9548A mux → SCD41 sensors)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// Standard-mode I2C.  The SCD41 supports up to 400 kHz, but the mux
/// segments run long cables into the grow rooms.
pub const I2C_FREQ_HZ: u32 = 100_000;
/// Driver-enforced transaction timeout, in APB ticks (ESP-IDF `i2c_set_timeout`).
pub const I2C_TIMEOUT_TICKS: i32 = 0x1F_FFFF;
/// ESP-IDF I2C port number.
pub const I2C_PORT: i32 = 0;

// ---------------------------------------------------------------------------
// Host link (UART to the Raspberry Pi gateway)
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 43;
pub const UART_RX_GPIO: i32 = 44;
pub const UART_BAUD: u32 = 9600;
/// ESP-IDF UART port number.
pub const UART_PORT: i32 = 1;

// ---------------------------------------------------------------------------
// 8-channel relay module (active LOW)
// ---------------------------------------------------------------------------

pub const RELAY_MIST_MAKER_GPIO: i32 = 4;
pub const RELAY_HUMIDIFIER_FAN_GPIO: i32 = 5;
pub const RELAY_FRUITING_EXHAUST_FAN_GPIO: i32 = 6;
pub const RELAY_FRUITING_INTAKE_FAN_GPIO: i32 = 7;
pub const RELAY_SPAWNING_EXHAUST_FAN_GPIO: i32 = 15;
pub const RELAY_DEVICE_EXHAUST_FAN_GPIO: i32 = 16;
pub const RELAY_FRUITING_LED_GPIO: i32 = 17;
pub const RELAY_RESERVED_GPIO: i32 = 18;

/// Highest GPIO number on the ESP32-S3.
pub const MAX_GPIO: i32 = 48;
