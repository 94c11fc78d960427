//! One-shot hardware peripheral initialization.
//!
//! Configures relay GPIOs, the I2C master and the host-link UART using
//! raw ESP-IDF sys calls.  Called once from `main()` before the control
//! loop starts.  The I2C init is also re-run by stuck-bus recovery.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    I2cConfigFailed(i32),
    I2cInstallFailed(i32),
    UartInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::I2cConfigFailed(rc) => write!(f, "I2C param config failed (rc={})", rc),
            Self::I2cInstallFailed(rc) => write!(f, "I2C driver install failed (rc={})", rc),
            Self::UartInstallFailed(rc) => write!(f, "UART driver install failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Relay outputs ─────────────────────────────────────────────

/// Configure `outputs` as push-pull outputs driven to `idle_level`.
///
/// The level is written before the direction switch so a relay never
/// glitches on during boot.
#[cfg(target_os = "espidf")]
pub fn init_outputs(outputs: &[i32], idle_level: bool) -> Result<(), HwInitError> {
    for &pin in outputs {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: called from the single-threaded init path; `pin` comes
        // from the validated relay table.
        unsafe {
            gpio_set_level(pin, u32::from(idle_level));
            let ret = gpio_config(&cfg);
            if ret != ESP_OK {
                return Err(HwInitError::GpioConfigFailed(ret));
            }
            gpio_set_level(pin, u32::from(idle_level));
        }
    }
    info!("hw_init: {} relay output(s) configured", outputs.len());
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_outputs(outputs: &[i32], _idle_level: bool) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): {} output(s) skipped", outputs.len());
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    // Main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

/// Switch `pin` between push-pull output and pulled-up input.
#[cfg(target_os = "espidf")]
pub fn gpio_set_output(pin: i32, output: bool) {
    // SAFETY: only called on the I2C lines while the I2C driver is
    // uninstalled (bus recovery).
    unsafe {
        if output {
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_OUTPUT);
        } else {
            gpio_set_direction(pin, gpio_mode_t_GPIO_MODE_INPUT);
            gpio_set_pull_mode(pin, gpio_pull_mode_t_GPIO_PULLUP_ONLY);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_set_output(_pin: i32, _output: bool) {}

// ── I2C master ────────────────────────────────────────────────

/// Configure and install the legacy I2C master driver, then arm its
/// transaction timeout.
#[cfg(target_os = "espidf")]
pub fn init_i2c() -> Result<(), HwInitError> {
    let mut cfg = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: pins::I2C_SDA_GPIO,
        scl_io_num: pins::I2C_SCL_GPIO,
        sda_pullup_en: true,
        scl_pullup_en: true,
        ..Default::default()
    };
    cfg.__bindgen_anon_1.master.clk_speed = pins::I2C_FREQ_HZ;

    // SAFETY: single-threaded init or recovery path; the driver for this
    // port is not installed at this point.
    unsafe {
        let ret = i2c_param_config(pins::I2C_PORT, &cfg);
        if ret != ESP_OK {
            return Err(HwInitError::I2cConfigFailed(ret));
        }
        let ret = i2c_driver_install(pins::I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0);
        if ret != ESP_OK {
            return Err(HwInitError::I2cInstallFailed(ret));
        }
    }
    arm_i2c_timeout();
    info!("hw_init: I2C{} master at {} Hz", pins::I2C_PORT, pins::I2C_FREQ_HZ);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_i2c() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): I2C init skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn arm_i2c_timeout() {
    // SAFETY: the driver is installed; the timeout register is only
    // written from the main task.
    unsafe {
        i2c_set_timeout(pins::I2C_PORT, pins::I2C_TIMEOUT_TICKS);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn arm_i2c_timeout() {}

#[cfg(target_os = "espidf")]
pub fn deinit_i2c() {
    // SAFETY: main task only; a missing driver returns an error code that
    // is irrelevant here.
    unsafe {
        i2c_driver_delete(pins::I2C_PORT);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn deinit_i2c() {}

// ── Host-link UART ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const UART_RX_BUF: i32 = 256;

#[cfg(target_os = "espidf")]
pub fn init_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::UART_BAUD as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    // SAFETY: single-threaded init path.
    unsafe {
        let ret = uart_param_config(pins::UART_PORT, &cfg);
        if ret != ESP_OK {
            return Err(HwInitError::UartInstallFailed(ret));
        }
        let ret = uart_set_pin(pins::UART_PORT, pins::UART_TX_GPIO, pins::UART_RX_GPIO, -1, -1);
        if ret != ESP_OK {
            return Err(HwInitError::UartInstallFailed(ret));
        }
        let ret = uart_driver_install(
            pins::UART_PORT,
            UART_RX_BUF * 2,
            0,
            0,
            core::ptr::null_mut(),
            0,
        );
        if ret != ESP_OK {
            return Err(HwInitError::UartInstallFailed(ret));
        }
    }
    info!("hw_init: UART{} at {} baud", pins::UART_PORT, pins::UART_BAUD);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_uart() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): UART init skipped");
    Ok(())
}

/// Non-blocking single-byte read.
#[cfg(target_os = "espidf")]
pub fn uart_read_byte() -> Option<u8> {
    let mut byte = 0u8;
    // SAFETY: the driver is installed; zero ticks never blocks.
    let n = unsafe { uart_read_bytes(pins::UART_PORT, (&raw mut byte).cast(), 1, 0) };
    (n == 1).then_some(byte)
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_read_byte() -> Option<u8> {
    None
}

#[cfg(target_os = "espidf")]
pub fn uart_write(bytes: &[u8]) {
    // SAFETY: the driver is installed; the buffer outlives the call
    // because the TX ring copies it.
    unsafe {
        uart_write_bytes(pins::UART_PORT, bytes.as_ptr().cast(), bytes.len());
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_write(_bytes: &[u8]) {}
