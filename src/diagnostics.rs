//! Sensor bus self-test.
//!
//! Probes the mux, then every channel: segment select and one raw read.
//! The result is a serialisable [`SelfTestReport`] for the console or the
//! host link.  Filters, last-known-good readings and the bus failure
//! counter are left untouched, so a self-test can run between acquisition
//! cycles without disturbing them.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{info, warn};
use serde::Serialize;

use crate::config::{MAX_SENSOR_CHANNELS, RoomLabel, room_label};
use crate::sensors::acquisition::{AcquisitionPipeline, ProbeResult};
use crate::sensors::recovery::BusLines;
use crate::sensors::{GasSensor, RawMeasurement};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelVerdict {
    /// A raw sample came back (plausible or not).
    Ok,
    /// The sensor answered with zero concentration, or has no sample yet.
    WarmingUp,
    SelectFailed,
    ReadFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelReport {
    pub room: RoomLabel,
    pub verdict: ChannelVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawMeasurement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfTestReport {
    pub mux_present: bool,
    pub channels: heapless::Vec<ChannelReport, MAX_SENSOR_CHANNELS>,
}

impl SelfTestReport {
    /// True when the mux answered and every channel produced a sample.
    pub fn all_ok(&self) -> bool {
        self.mux_present && self.channels.iter().all(|c| c.verdict == ChannelVerdict::Ok)
    }
}

pub fn run_self_test<B, L, D, S>(pipeline: &mut AcquisitionPipeline<B, L, D, S>) -> SelfTestReport
where
    B: I2c,
    L: BusLines,
    D: DelayNs,
    S: GasSensor<B>,
{
    let mux_present = pipeline.mux_present();
    if mux_present {
        info!("DIAG: multiplexer present");
    } else {
        warn!("DIAG: multiplexer not found");
    }

    let mut channels = heapless::Vec::new();
    for index in 0..pipeline.channel_count() {
        let room = room_label(pipeline.room(index).unwrap_or_default());
        let (verdict, raw) = match pipeline.probe(index) {
            Some(ProbeResult::Measured(m)) if m.is_warming_up() => (ChannelVerdict::WarmingUp, Some(m)),
            Some(ProbeResult::Measured(m)) => (ChannelVerdict::Ok, Some(m)),
            Some(ProbeResult::NotReady) => (ChannelVerdict::WarmingUp, None),
            Some(ProbeResult::SelectFailed(_)) => (ChannelVerdict::SelectFailed, None),
            Some(ProbeResult::ReadFailed(_)) | None => (ChannelVerdict::ReadFailed, None),
        };
        info!("DIAG: {} -> {:?}", room, verdict);
        let _ = channels.push(ChannelReport { room, verdict, raw });
    }

    SelfTestReport {
        mux_present,
        channels,
    }
}
