//! Sensor subsystem: mux, filter, bus recovery, device driver and the
//! per-channel [`AcquisitionPipeline`](acquisition::AcquisitionPipeline).
//!
//! ```text
//!  acquire(ch) ──▶ select segment ──▶ read ──▶ validate ──▶ filter ──▶ Reading
//!                        │              │          │
//!                        └─ fail ───────┴─ fail ───┴──▶ last-known-good
//! ```

pub mod acquisition;
pub mod filter;
pub mod mux;
pub mod recovery;
pub mod scd41;

use serde::Serialize;

use crate::error::SensorError;

// ───────────────────────────────────────────────────────────────
// Data model
// ───────────────────────────────────────────────────────────────

/// One processed measurement for one channel.
///
/// `Reading::default()` is the zeroed, invalid reading every channel holds
/// until its first successful acquisition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Reading {
    /// Smoothed temperature (°C).
    pub temperature: f32,
    /// Smoothed relative humidity (%RH).
    pub humidity: f32,
    /// Unfiltered gas concentration (CO2 ppm).
    pub co2_ppm: u16,
    pub valid: bool,
    /// Uptime at acquisition (ms).
    pub timestamp_ms: u64,
}

/// Raw device output before validation or smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawMeasurement {
    pub co2_ppm: u16,
    pub temperature: f32,
    pub humidity: f32,
}

impl RawMeasurement {
    /// Zero concentration is the sensor's "not warmed up yet" sentinel.
    pub fn is_warming_up(&self) -> bool {
        self.co2_ppm == 0
    }
}

// ───────────────────────────────────────────────────────────────
// Plausibility bounds (inclusive)
// ───────────────────────────────────────────────────────────────

pub const TEMP_MIN_C: f32 = -10.0;
pub const TEMP_MAX_C: f32 = 60.0;
pub const HUMIDITY_MIN: f32 = 0.0;
pub const HUMIDITY_MAX: f32 = 100.0;
pub const CO2_MIN_PPM: u16 = 400;
pub const CO2_MAX_PPM: u16 = 5000;

/// True if every field lies within its physically plausible range.
/// NaN fails every comparison and is rejected.
pub fn is_plausible(raw: &RawMeasurement) -> bool {
    (TEMP_MIN_C..=TEMP_MAX_C).contains(&raw.temperature)
        && (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&raw.humidity)
        && (CO2_MIN_PPM..=CO2_MAX_PPM).contains(&raw.co2_ppm)
}

// ───────────────────────────────────────────────────────────────
// Device port
// ───────────────────────────────────────────────────────────────

/// A CO2/temperature/humidity sensor reachable over bus `B`.
///
/// The bus is borrowed per call because every sensor sits behind the same
/// mux on the same physical bus; the pipeline owns the bus and selects the
/// segment before handing it over.
pub trait GasSensor<B> {
    fn start_periodic_measurement(&mut self, bus: &mut B) -> Result<(), SensorError>;

    fn stop_periodic_measurement(&mut self, bus: &mut B) -> Result<(), SensorError>;

    /// True once a fresh sample is waiting.  Sensors without a ready flag
    /// are always ready.
    fn data_ready(&mut self, _bus: &mut B) -> Result<bool, SensorError> {
        Ok(true)
    }

    fn read_measurement(&mut self, bus: &mut B) -> Result<RawMeasurement, SensorError>;
}
