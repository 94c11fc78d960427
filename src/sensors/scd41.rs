//! Sensirion SCD41 photoacoustic CO2 sensor (with on-chip T/RH).
//!
//! Commands are 16-bit big-endian words.  Every 16-bit word the sensor
//! returns is followed by a CRC-8 (poly 0x31, init 0xFF).  In periodic
//! mode the sensor produces a new sample every 5 s; until the first sample
//! is ready it reports 0 ppm.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{GasSensor, RawMeasurement};
use crate::error::{BusError, SensorError};

pub const DEFAULT_SCD41_ADDRESS: u8 = 0x62;

const CMD_START_PERIODIC: u16 = 0x21B1;
const CMD_STOP_PERIODIC: u16 = 0x3F86;
const CMD_READ_MEASUREMENT: u16 = 0xEC05;
const CMD_DATA_READY: u16 = 0xE4B8;

/// Command execution time before a response can be read.
const EXEC_TIME_MS: u32 = 1;
/// The sensor ignores commands for this long after a stop.
const STOP_TIME_MS: u32 = 500;

pub struct Scd41<D> {
    address: u8,
    delay: D,
}

impl<D: DelayNs> Scd41<D> {
    pub fn new(address: u8, delay: D) -> Self {
        Self { address, delay }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    fn command<B: I2c>(&mut self, bus: &mut B, cmd: u16) -> Result<(), SensorError> {
        bus.write(self.address, &cmd.to_be_bytes())
            .map_err(|e| SensorError::Bus(BusError::from_i2c(&e)))
    }

    fn command_read<B: I2c>(
        &mut self,
        bus: &mut B,
        cmd: u16,
        buf: &mut [u8],
    ) -> Result<(), SensorError> {
        self.command(bus, cmd)?;
        self.delay.delay_ms(EXEC_TIME_MS);
        bus.read(self.address, buf)
            .map_err(|e| SensorError::Bus(BusError::from_i2c(&e)))
    }
}

impl<B: I2c, D: DelayNs> GasSensor<B> for Scd41<D> {
    fn start_periodic_measurement(&mut self, bus: &mut B) -> Result<(), SensorError> {
        self.command(bus, CMD_START_PERIODIC)
    }

    fn stop_periodic_measurement(&mut self, bus: &mut B) -> Result<(), SensorError> {
        self.command(bus, CMD_STOP_PERIODIC)?;
        self.delay.delay_ms(STOP_TIME_MS);
        Ok(())
    }

    /// The low 11 bits of the status word are zero until a sample is ready.
    fn data_ready(&mut self, bus: &mut B) -> Result<bool, SensorError> {
        let mut buf = [0u8; 3];
        self.command_read(bus, CMD_DATA_READY, &mut buf)?;
        let word = checked_word(&buf)?;
        Ok(word & 0x07FF != 0)
    }

    fn read_measurement(&mut self, bus: &mut B) -> Result<RawMeasurement, SensorError> {
        let mut buf = [0u8; 9];
        self.command_read(bus, CMD_READ_MEASUREMENT, &mut buf)?;

        let co2 = checked_word(&buf[0..3])?;
        let t_raw = checked_word(&buf[3..6])?;
        let rh_raw = checked_word(&buf[6..9])?;

        Ok(RawMeasurement {
            co2_ppm: co2,
            temperature: -45.0 + 175.0 * f32::from(t_raw) / 65536.0,
            humidity: 100.0 * f32::from(rh_raw) / 65536.0,
        })
    }
}

/// Sensirion CRC-8: polynomial 0x31, init 0xFF, no reflection, no final XOR.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Decode `[msb, lsb, crc]`.
fn checked_word(chunk: &[u8]) -> Result<u16, SensorError> {
    if crc8(&chunk[..2]) != chunk[2] {
        return Err(SensorError::Crc);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}
