//! Stuck-bus recovery.
//!
//! A slave that lost its clock mid-byte keeps SDA low forever and every
//! later transaction fails.  Clocking SCL by hand lets it finish shifting
//! out the byte; a manual STOP then returns the bus to idle.
//!
//! The procedure only needs raw line control, so it runs against the
//! [`BusLines`] capability and is testable with a simulated bus.  It is
//! best effort: a bus that is still locked shows up as further read
//! failures, which the pipeline already tolerates.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

/// Maximum bits a slave can be stuck mid-transmission on (8 data + ACK).
pub const MAX_CLOCK_PULSES: u8 = 9;
pub const EDGE_SETTLE_US: u32 = 5;
pub const STABILIZE_MS: u32 = 100;

/// The two wires of the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Scl,
    Sda,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Push-pull output.
    Output,
    /// Input with the internal pull-up enabled.
    InputPullUp,
}

/// Raw access to the bus lines plus control of the bus driver that
/// normally owns them.
pub trait BusLines {
    fn set_pin_mode(&mut self, line: Line, mode: PinMode);

    fn write_pin(&mut self, line: Line, high: bool);

    fn read_pin(&mut self, line: Line) -> bool;

    /// Release the lines from the peripheral driver.
    fn disable_driver(&mut self);

    /// Hand the lines back to the driver and reinitialise it.
    fn reinit_driver(&mut self);

    /// Re-arm the driver's transaction timeout, if the platform has one.
    fn arm_timeout(&mut self) {}
}

/// What the procedure observed.  Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// SCL pulses issued before SDA read high (or the maximum).
    pub pulses: u8,
    /// Whether SDA was seen released during clocking.
    pub sda_released: bool,
}

/// Run the full recovery sequence.
pub fn recover_bus<L: BusLines, D: DelayNs>(lines: &mut L, delay: &mut D) -> RecoveryOutcome {
    warn!("BUS: starting stuck-bus recovery");

    lines.disable_driver();
    lines.set_pin_mode(Line::Scl, PinMode::Output);
    lines.set_pin_mode(Line::Sda, PinMode::InputPullUp);

    let mut pulses = 0;
    let mut sda_released = false;
    while pulses < MAX_CLOCK_PULSES {
        lines.write_pin(Line::Scl, false);
        delay.delay_us(EDGE_SETTLE_US);
        lines.write_pin(Line::Scl, true);
        delay.delay_us(EDGE_SETTLE_US);
        pulses += 1;

        if lines.read_pin(Line::Sda) {
            sda_released = true;
            break;
        }
    }

    // Manual STOP: SDA rises while SCL is high.
    lines.set_pin_mode(Line::Sda, PinMode::Output);
    lines.write_pin(Line::Sda, false);
    delay.delay_us(EDGE_SETTLE_US);
    lines.write_pin(Line::Scl, true);
    delay.delay_us(EDGE_SETTLE_US);
    lines.write_pin(Line::Sda, true);
    delay.delay_us(EDGE_SETTLE_US);

    lines.reinit_driver();
    lines.arm_timeout();
    delay.delay_ms(STABILIZE_MS);

    if sda_released {
        info!("BUS: SDA released after {} pulse(s)", pulses);
    } else {
        warn!("BUS: SDA still low after {} pulses", pulses);
    }

    RecoveryOutcome { pulses, sda_released }
}
