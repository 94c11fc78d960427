//! Multiplexed sensor acquisition pipeline.
//!
//! Owns the shared bus and everything attached to it: the mux, one
//! [`GasSensor`] per logical channel, that channel's filters and its
//! last-known-good [`Reading`].  Channels are only ever touched one at a
//! time, in the order the caller asks for them.
//!
//! ## Failure handling
//!
//! | Condition                     | Returned         | Failure counter |
//! |-------------------------------|------------------|-----------------|
//! | mux select failed             | last-known-good  | +1              |
//! | device read failed            | last-known-good  | +1              |
//! | zero concentration (warm-up)  | last-known-good  | unchanged       |
//! | out of plausibility range     | last-known-good  | unchanged       |
//! | valid sample                  | new reading      | reset to 0      |
//!
//! When the counter reaches the threshold the stuck-bus recovery runs once
//! and the counter resets, whatever the recovery achieved.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, error, info, warn};

use super::filter::MovingAverage;
use super::mux::BusMux;
use super::recovery::{BusLines, recover_bus};
use super::{GasSensor, RawMeasurement, Reading, is_plausible};
use crate::app::ports::SensorPort;
use crate::config::{MAX_SENSOR_CHANNELS, RoomLabel, SystemConfig, room_label};
use crate::error::{BusError, ConfigError, InitError, SensorError};

/// Per-channel state.  Lives as long as the pipeline.
struct Channel<S> {
    room: RoomLabel,
    segment: u8,
    sensor: S,
    last_good: Reading,
    temperature: MovingAverage,
    humidity: MovingAverage,
}

/// Result of a bookkeeping-free diagnostic read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeResult {
    Measured(RawMeasurement),
    /// The sensor has no new sample yet.
    NotReady,
    SelectFailed(BusError),
    ReadFailed(SensorError),
}

pub struct AcquisitionPipeline<B, L, D, S> {
    bus: B,
    lines: L,
    delay: D,
    mux: BusMux,
    channels: heapless::Vec<Channel<S>, MAX_SENSOR_CHANNELS>,
    failure_threshold: u8,
    failures: u8,
    recoveries: u32,
    warmup_ms: u32,
}

impl<B, L, D, S> AcquisitionPipeline<B, L, D, S>
where
    B: I2c,
    L: BusLines,
    D: DelayNs,
    S: GasSensor<B>,
{
    /// `failure_threshold` must be non-zero; [`from_config`](Self::from_config)
    /// rejects a zero threshold through [`SystemConfig::validate`].
    pub fn new(bus: B, lines: L, delay: D, mux: BusMux, failure_threshold: u8) -> Self {
        Self {
            bus,
            lines,
            delay,
            mux,
            channels: heapless::Vec::new(),
            failure_threshold,
            failures: 0,
            recoveries: 0,
            warmup_ms: 0,
        }
    }

    /// Build the pipeline and its channel table from `config`.
    ///
    /// `sensor` is called once per configured channel, in table order.
    pub fn from_config(
        bus: B,
        lines: L,
        delay: D,
        config: &SystemConfig,
        mut sensor: impl FnMut() -> S,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut pipeline = Self::new(
            bus,
            lines,
            delay,
            BusMux::new(config.mux_address),
            config.bus_failure_threshold,
        );
        pipeline.warmup_ms = config.sensor_warmup_ms;
        for ch in &config.sensor_channels {
            pipeline.add_channel(&ch.room, ch.mux_channel, sensor())?;
        }
        Ok(pipeline)
    }

    /// Register a channel.  Returns its index.
    pub fn add_channel(&mut self, room: &str, segment: u8, sensor: S) -> Result<usize, ConfigError> {
        if self.channels.iter().any(|c| c.segment == segment) {
            return Err(ConfigError::ValidationFailed("sensor_channels: duplicate mux_channel"));
        }
        let index = self.channels.len();
        self.channels
            .push(Channel {
                room: room_label(room),
                segment,
                sensor,
                last_good: Reading::default(),
                temperature: MovingAverage::new(),
                humidity: MovingAverage::new(),
            })
            .map_err(|_| ConfigError::ValidationFailed("sensor_channels: too many channels"))?;
        Ok(index)
    }

    pub fn set_warmup_ms(&mut self, ms: u32) {
        self.warmup_ms = ms;
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Verify the mux and start every sensor.  Any failure is fatal.
    pub fn begin(&mut self) -> Result<(), InitError> {
        info!("SENSOR: checking for I2C multiplexer at 0x{:02x}", self.mux.address());
        if !self.mux.detect_presence(&mut self.bus) {
            error!("SENSOR: multiplexer not detected, check wiring and address");
            return Err(InitError::MuxNotDetected);
        }

        for (index, ch) in self.channels.iter_mut().enumerate() {
            self.mux
                .select_channel(&mut self.bus, &mut self.delay, ch.segment)
                .map_err(|_| InitError::ChannelSelect { index })?;

            // A warm reboot leaves the sensor measuring; it must be idle
            // before it accepts a start.
            if let Err(e) = ch.sensor.stop_periodic_measurement(&mut self.bus) {
                warn!("SENSOR: {} stop before start failed: {}", ch.room, e);
            }
            ch.sensor
                .start_periodic_measurement(&mut self.bus)
                .map_err(|cause| InitError::SensorStart { index, cause })?;
            info!("SENSOR: {} started on segment {}", ch.room, ch.segment);
        }

        self.delay.delay_ms(self.warmup_ms);
        info!("SENSOR: {} channel(s) ready", self.channels.len());
        Ok(())
    }

    // ── Acquisition ───────────────────────────────────────────

    /// Acquire one channel.  Never fails: on any fault the channel's
    /// last-known-good reading comes back unchanged.
    pub fn acquire(&mut self, index: usize, now_ms: u64) -> Reading {
        let Some(ch) = self.channels.get_mut(index) else {
            warn!("SENSOR: no channel {}", index);
            return Reading::default();
        };
        let fallback = ch.last_good;

        if self
            .mux
            .select_channel(&mut self.bus, &mut self.delay, ch.segment)
            .is_err()
        {
            warn!("SENSOR: {} segment select failed", ch.room);
            self.record_failure();
            return fallback;
        }

        match ch.sensor.data_ready(&mut self.bus) {
            Ok(true) => {}
            Ok(false) => {
                debug!("SENSOR: {} no new sample yet", ch.room);
                return fallback;
            }
            Err(e) => {
                warn!("SENSOR: {} data-ready query failed: {}", ch.room, e);
                self.record_failure();
                return fallback;
            }
        }

        let raw = match ch.sensor.read_measurement(&mut self.bus) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("SENSOR: {} read failed: {}", ch.room, e);
                self.record_failure();
                return fallback;
            }
        };

        if raw.is_warming_up() {
            debug!("SENSOR: {} warming up", ch.room);
            return fallback;
        }

        if !is_plausible(&raw) {
            warn!(
                "SENSOR: {} out of range (T={:.1} RH={:.1} CO2={})",
                ch.room, raw.temperature, raw.humidity, raw.co2_ppm
            );
            return fallback;
        }

        self.failures = 0;
        let reading = Reading {
            temperature: ch.temperature.add(raw.temperature),
            humidity: ch.humidity.add(raw.humidity),
            co2_ppm: raw.co2_ppm,
            valid: true,
            timestamp_ms: now_ms,
        };
        ch.last_good = reading;
        reading
    }

    /// Acquire every channel in table order.
    pub fn acquire_all(&mut self, now_ms: u64) -> heapless::Vec<Reading, MAX_SENSOR_CHANNELS> {
        let mut out = heapless::Vec::new();
        for index in 0..self.channels.len() {
            let _ = out.push(self.acquire(index, now_ms));
        }
        out
    }

    /// Select and read a channel without touching filters, last-known-good
    /// or the failure counter.
    pub fn probe(&mut self, index: usize) -> Option<ProbeResult> {
        let ch = self.channels.get_mut(index)?;
        if let Err(e) = self.mux.select_channel(&mut self.bus, &mut self.delay, ch.segment) {
            return Some(ProbeResult::SelectFailed(e));
        }
        match ch.sensor.data_ready(&mut self.bus) {
            Ok(true) => {}
            Ok(false) => return Some(ProbeResult::NotReady),
            Err(e) => return Some(ProbeResult::ReadFailed(e)),
        }
        Some(match ch.sensor.read_measurement(&mut self.bus) {
            Ok(raw) => ProbeResult::Measured(raw),
            Err(e) => ProbeResult::ReadFailed(e),
        })
    }

    /// Whether the mux currently acknowledges.
    pub fn mux_present(&mut self) -> bool {
        self.mux.detect_presence(&mut self.bus)
    }

    fn record_failure(&mut self) {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.failure_threshold {
            warn!("BUS: {} consecutive failures, running recovery", self.failures);
            recover_bus(&mut self.lines, &mut self.delay);
            self.recoveries = self.recoveries.saturating_add(1);
            self.failures = 0;
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn room(&self, index: usize) -> Option<&str> {
        self.channels.get(index).map(|c| c.room.as_str())
    }

    pub fn last_good(&self, index: usize) -> Option<Reading> {
        self.channels.get(index).map(|c| c.last_good)
    }

    /// Consecutive bus failures since the last good sample or recovery.
    pub fn failure_count(&self) -> u8 {
        self.failures
    }

    /// Recovery procedures run since construction.
    pub fn recovery_count(&self) -> u32 {
        self.recoveries
    }

    /// Give the hardware back (tests, or a driver swap).
    pub fn release(self) -> (B, L, D) {
        (self.bus, self.lines, self.delay)
    }
}

impl<B, L, D, S> SensorPort for AcquisitionPipeline<B, L, D, S>
where
    B: I2c,
    L: BusLines,
    D: DelayNs,
    S: GasSensor<B>,
{
    fn begin(&mut self) -> Result<(), InitError> {
        AcquisitionPipeline::begin(self)
    }

    fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn room(&self, index: usize) -> Option<&str> {
        AcquisitionPipeline::room(self, index)
    }

    fn acquire(&mut self, index: usize, now_ms: u64) -> Reading {
        AcquisitionPipeline::acquire(self, index, now_ms)
    }
}
