//! Outbound JSON lines.
//!
//! One telemetry object per acquisition cycle, keyed by room in channel
//! order:
//!
//! ```text
//! {"fruiting":{"temp":23.4,"humidity":81.2,"co2":850},"spawning":{"error":"invalid_reading"}}
//! ```
//!
//! and occasional status objects tagged by `"status"`.

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::config::{MAX_SENSOR_CHANNELS, RoomLabel, room_label};
use crate::sensors::Reading;

/// One cycle's readings, in acquisition order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryFrame {
    entries: heapless::Vec<(RoomLabel, Reading), MAX_SENSOR_CHANNELS>,
}

impl TelemetryFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a room.  Extra rooms beyond capacity are dropped.
    pub fn push(&mut self, room: &str, reading: Reading) {
        let _ = self.entries.push((room_label(room), reading));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, room: &str) -> Option<&Reading> {
        self.entries
            .iter()
            .find(|(r, _)| r.as_str() == room)
            .map(|(_, reading)| reading)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Reading)> {
        self.entries.iter().map(|(r, reading)| (r.as_str(), reading))
    }

    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum RoomReport {
    Metrics { temp: f32, humidity: f32, co2: u16 },
    Error { error: &'static str },
}

impl From<&Reading> for RoomReport {
    fn from(r: &Reading) -> Self {
        if r.valid {
            Self::Metrics {
                temp: round1(r.temperature),
                humidity: round1(r.humidity),
                co2: r.co2_ppm,
            }
        } else {
            Self::Error {
                error: "invalid_reading",
            }
        }
    }
}

impl Serialize for TelemetryFrame {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (room, reading) in &self.entries {
            map.serialize_entry(room.as_str(), &RoomReport::from(reading))?;
        }
        map.end()
    }
}

fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

/// Link status announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusLine {
    LinkLost { silent_ms: u64 },
    LinkRestored { downtime_ms: u64, recoveries: u32 },
    /// Startup failed; the board is halted with every actuator off.
    InitFailed {
        error: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        channel: Option<usize>,
    },
}

impl StatusLine {
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
