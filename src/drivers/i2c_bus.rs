//! ESP-IDF legacy I2C master as an `embedded-hal` bus.
//!
//! [`SysI2c`] implements [`embedded_hal::i2c::I2c`] for the sensor stack
//! and [`BusLines`] for stuck-bus recovery.  Both views drive the same
//! port, so recovery can tear the driver down and bring it back without
//! anyone else holding a handle to it.
//!
//! Every transfer is bounded by the driver's tick timeout, so a dead bus
//! surfaces as an error instead of hanging the loop.

use embedded_hal::i2c::{self, ErrorKind, ErrorType, NoAcknowledgeSource, Operation};
use esp_idf_sys::*;
use log::warn;

use crate::drivers::hw_init;
use crate::pins;
use crate::sensors::recovery::{BusLines, Line, PinMode};

/// FreeRTOS ticks a single transfer may take.
const XFER_TIMEOUT_TICKS: TickType_t = 50;

/// Raw ESP-IDF return code of a failed transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EspI2cError(pub esp_err_t);

impl i2c::Error for EspI2cError {
    fn kind(&self) -> ErrorKind {
        // The legacy driver reports a missing ACK as a bare ESP_FAIL.
        if self.0 == ESP_FAIL {
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown)
        } else {
            ErrorKind::Other
        }
    }
}

pub struct SysI2c {
    port: i2c_port_t,
}

impl SysI2c {
    /// Wrap the port installed by [`hw_init::init_i2c`].
    pub fn new() -> Self {
        Self {
            port: pins::I2C_PORT,
        }
    }

    fn check(ret: esp_err_t) -> Result<(), EspI2cError> {
        if ret == ESP_OK { Ok(()) } else { Err(EspI2cError(ret)) }
    }

    /// Address-only write: START, addr+W, STOP.
    fn probe(&mut self, address: u8) -> Result<(), EspI2cError> {
        // SAFETY: the command link is created, used and freed here; the
        // driver is installed.
        unsafe {
            let cmd = i2c_cmd_link_create();
            i2c_master_start(cmd);
            i2c_master_write_byte(cmd, address << 1, true);
            i2c_master_stop(cmd);
            let ret = i2c_master_cmd_begin(self.port, cmd, XFER_TIMEOUT_TICKS);
            i2c_cmd_link_delete(cmd);
            Self::check(ret)
        }
    }

    fn write_bytes(&mut self, address: u8, bytes: &[u8]) -> Result<(), EspI2cError> {
        if bytes.is_empty() {
            return self.probe(address);
        }
        // SAFETY: `bytes` is valid for the call duration.
        let ret = unsafe {
            i2c_master_write_to_device(
                self.port,
                address,
                bytes.as_ptr(),
                bytes.len(),
                XFER_TIMEOUT_TICKS,
            )
        };
        Self::check(ret)
    }

    fn read_bytes(&mut self, address: u8, buf: &mut [u8]) -> Result<(), EspI2cError> {
        // SAFETY: `buf` is valid and exclusively borrowed for the call.
        let ret = unsafe {
            i2c_master_read_from_device(
                self.port,
                address,
                buf.as_mut_ptr(),
                buf.len(),
                XFER_TIMEOUT_TICKS,
            )
        };
        Self::check(ret)
    }
}

impl Default for SysI2c {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorType for SysI2c {
    type Error = EspI2cError;
}

impl i2c::I2c for SysI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        // The sensors on this bus never need a repeated start, so each
        // operation is its own transfer.
        for op in operations {
            match op {
                Operation::Write(bytes) => self.write_bytes(address, bytes)?,
                Operation::Read(buf) => self.read_bytes(address, buf)?,
            }
        }
        Ok(())
    }
}

impl BusLines for SysI2c {
    fn set_pin_mode(&mut self, line: Line, mode: PinMode) {
        hw_init::gpio_set_output(line_gpio(line), mode == PinMode::Output);
    }

    fn write_pin(&mut self, line: Line, high: bool) {
        hw_init::gpio_write(line_gpio(line), high);
    }

    fn read_pin(&mut self, line: Line) -> bool {
        hw_init::gpio_read(line_gpio(line))
    }

    fn disable_driver(&mut self) {
        hw_init::deinit_i2c();
    }

    fn reinit_driver(&mut self) {
        if let Err(e) = hw_init::init_i2c() {
            warn!("BUS: driver reinit failed: {}", e);
        }
    }

    fn arm_timeout(&mut self) {
        hw_init::arm_i2c_timeout();
    }
}

fn line_gpio(line: Line) -> i32 {
    match line {
        Line::Scl => pins::I2C_SCL_GPIO,
        Line::Sda => pins::I2C_SDA_GPIO,
    }
}
