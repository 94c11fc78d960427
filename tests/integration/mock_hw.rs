//! Simulated hardware for integration tests.
//!
//! [`SimBus`] models a TCA9548A mux with SCD41 sensors behind it, speaking
//! the real command words and CRC framing, so the production driver and
//! pipeline run unmodified.  State lives behind `Rc<RefCell<_>>` so a test
//! keeps a handle after the bus has moved into the pipeline.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use mash::app::commands::Actuator;
use mash::app::events::AppEvent;
use mash::app::ports::{ActuatorPort, Clock, EventSink};
use mash::sensors::recovery::{BusLines, Line, PinMode};
use mash::sensors::scd41::{DEFAULT_SCD41_ADDRESS, Scd41, crc8};

pub const MUX_ADDR: u8 = 0x70;
const CMD_START: u16 = 0x21B1;
const CMD_STOP: u16 = 0x3F86;
const CMD_READ: u16 = 0xEC05;
const CMD_DATA_READY: u16 = 0xE4B8;

#[derive(Debug)]
pub struct Nak;

impl i2c::Error for Nak {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

/// What one sensor hands back on its next read.
#[derive(Debug, Clone, Copy)]
pub enum Sample {
    Value { co2: u16, temp: f32, rh: f32 },
    BadCrc,
    Nak,
    /// One data-ready poll answers "not yet"; the sample is consumed.
    NotReady,
}

pub fn value(temp: f32, rh: f32, co2: u16) -> Sample {
    Sample::Value { co2, temp, rh }
}

#[derive(Default)]
pub struct SimSensor {
    pub samples: VecDeque<Sample>,
    pub measuring: bool,
    pub commands: Vec<u16>,
    pub data_ready_polls: u32,
    last_cmd: Option<u16>,
}

#[derive(Default)]
pub struct BusState {
    pub mux_absent: bool,
    pub select_fails: bool,
    pub segment: Option<u8>,
    pub selects: Vec<u8>,
    pub sensors: [Option<SimSensor>; 8],
}

impl BusState {
    pub fn attach(&mut self, segment: u8, samples: impl IntoIterator<Item = Sample>) {
        self.sensors[segment as usize] = Some(SimSensor {
            samples: samples.into_iter().collect(),
            ..Default::default()
        });
    }

    pub fn sensor(&self, segment: u8) -> &SimSensor {
        self.sensors[segment as usize].as_ref().expect("no sensor on segment")
    }

    pub fn queue(&mut self, segment: u8, sample: Sample) {
        if let Some(s) = self.sensors[segment as usize].as_mut() {
            s.samples.push_back(sample);
        }
    }
}

#[derive(Clone, Default)]
pub struct SimBus {
    pub state: Rc<RefCell<BusState>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorType for SimBus {
    type Error = Nak;
}

fn word(w: u16) -> [u8; 3] {
    let b = w.to_be_bytes();
    [b[0], b[1], crc8(&b)]
}

impl I2c for SimBus {
    fn transaction(&mut self, address: u8, ops: &mut [Operation<'_>]) -> Result<(), Nak> {
        let mut st = self.state.borrow_mut();
        if address == MUX_ADDR {
            if st.mux_absent {
                return Err(Nak);
            }
            for op in ops {
                if let Operation::Write(bytes) = op {
                    if let Some(&mask) = bytes.first() {
                        if st.select_fails {
                            return Err(Nak);
                        }
                        st.selects.push(mask);
                        st.segment = (mask.count_ones() == 1).then(|| mask.trailing_zeros() as u8);
                    }
                }
            }
            return Ok(());
        }

        if address != DEFAULT_SCD41_ADDRESS {
            return Err(Nak);
        }
        let Some(seg) = st.segment else {
            return Err(Nak);
        };
        let Some(sensor) = st.sensors[seg as usize].as_mut() else {
            return Err(Nak);
        };

        for op in ops {
            match op {
                Operation::Write(bytes) => {
                    let cmd = u16::from_be_bytes([bytes[0], bytes[1]]);
                    sensor.commands.push(cmd);
                    sensor.last_cmd = Some(cmd);
                    match cmd {
                        CMD_START => sensor.measuring = true,
                        CMD_STOP => sensor.measuring = false,
                        _ => {}
                    }
                }
                Operation::Read(buf) if sensor.last_cmd == Some(CMD_DATA_READY) => {
                    // An empty queue means no sample has been produced yet.
                    let ready = match sensor.samples.front() {
                        None => false,
                        Some(Sample::NotReady) => {
                            sensor.samples.pop_front();
                            false
                        }
                        Some(_) => true,
                    };
                    let status = if ready { 0x8006 } else { 0x8000 };
                    sensor.data_ready_polls += 1;
                    buf.copy_from_slice(&word(status)[..buf.len()]);
                }
                Operation::Read(buf) => {
                    if sensor.last_cmd != Some(CMD_READ) {
                        return Err(Nak);
                    }
                    let frame = match sensor.samples.pop_front() {
                        Some(Sample::Value { co2, temp, rh }) => {
                            let t_raw = ((temp + 45.0) * 65536.0 / 175.0).round() as u16;
                            let rh_raw = (rh * 65536.0 / 100.0).round().min(65535.0) as u16;
                            [word(co2), word(t_raw), word(rh_raw)].concat()
                        }
                        Some(Sample::BadCrc) => {
                            let mut f = [word(800), word(0x6667), word(0x5EB9)].concat();
                            f[2] ^= 0xFF;
                            f
                        }
                        Some(Sample::Nak | Sample::NotReady) | None => return Err(Nak),
                    };
                    buf.copy_from_slice(&frame[..buf.len()]);
                }
            }
        }
        Ok(())
    }
}

/// Bus lines that only count recoveries.
#[derive(Clone, Default)]
pub struct SimLines {
    pub recoveries: Rc<RefCell<u32>>,
}

impl BusLines for SimLines {
    fn set_pin_mode(&mut self, _line: Line, _mode: PinMode) {}
    fn write_pin(&mut self, _line: Line, _high: bool) {}
    fn read_pin(&mut self, _line: Line) -> bool {
        true
    }
    fn disable_driver(&mut self) {
        *self.recoveries.borrow_mut() += 1;
    }
    fn reinit_driver(&mut self) {}
}

#[derive(Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub type SimSensorDriver = Scd41<NoDelay>;

pub fn scd41() -> SimSensorDriver {
    Scd41::new(DEFAULT_SCD41_ADDRESS, NoDelay)
}

// ── Actuators, events, time ───────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActuatorCall {
    Set(Actuator, bool),
    ShutdownAll,
}

#[derive(Default)]
pub struct MockRelays {
    pub calls: Vec<ActuatorCall>,
    on: [bool; 8],
}

impl MockRelays {
    pub fn shutdowns(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == ActuatorCall::ShutdownAll)
            .count()
    }
}

impl ActuatorPort for MockRelays {
    fn set(&mut self, actuator: Actuator, on: bool) {
        self.calls.push(ActuatorCall::Set(actuator, on));
        self.on[actuator.index()] = on;
    }
    fn shutdown_all(&mut self) {
        self.calls.push(ActuatorCall::ShutdownAll);
        self.on = [false; 8];
    }
    fn is_on(&self, actuator: Actuator) -> bool {
        self.on[actuator.index()]
    }
}

#[derive(Default)]
pub struct EventLog(pub Vec<AppEvent>);

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

#[derive(Default)]
pub struct FakeClock(pub std::cell::Cell<u64>);

impl FakeClock {
    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}
