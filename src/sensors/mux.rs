//! TCA9548A 1-to-8 I2C multiplexer.
//!
//! The mux has a single control register: writing a byte with bit `n` set
//! connects downstream segment `n` to the upstream bus.  The analog switch
//! needs a short settle time after every change before the segment can be
//! addressed.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::error::BusError;

pub const DEFAULT_MUX_ADDRESS: u8 = 0x70;
pub const MUX_CHANNELS: u8 = 8;
/// Settle time after a segment switch.
pub const SWITCH_SETTLE_MS: u32 = 5;

/// Stateless handle to the mux; the bus is passed per call.
#[derive(Debug, Clone, Copy)]
pub struct BusMux {
    address: u8,
}

impl Default for BusMux {
    fn default() -> Self {
        Self::new(DEFAULT_MUX_ADDRESS)
    }
}

impl BusMux {
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Probe the mux address with an empty write.
    pub fn detect_presence<B: I2c>(&self, bus: &mut B) -> bool {
        bus.write(self.address, &[]).is_ok()
    }

    /// Route the bus to segment `channel` and wait for the switch to settle.
    ///
    /// Out-of-range channels fail without touching the bus.  No retry.
    pub fn select_channel<B: I2c, D: DelayNs>(
        &self,
        bus: &mut B,
        delay: &mut D,
        channel: u8,
    ) -> Result<(), BusError> {
        if channel >= MUX_CHANNELS {
            return Err(BusError::InvalidChannel(channel));
        }

        bus.write(self.address, &[1 << channel]).map_err(|e| {
            warn!("MUX: segment {} select failed", channel);
            BusError::from_i2c(&e)
        })?;

        delay.delay_ms(SWITCH_SETTLE_MS);
        Ok(())
    }
}
