//! Acquisition pipeline against the simulated mux + SCD41 bus.

use crate::mock_hw::*;
use mash::config::SystemConfig;
use mash::error::{InitError, SensorError};
use mash::sensors::Reading;
use mash::sensors::acquisition::AcquisitionPipeline;

type Pipeline = AcquisitionPipeline<SimBus, SimLines, NoDelay, SimSensorDriver>;

fn build(bus: &SimBus, lines: &SimLines) -> Pipeline {
    AcquisitionPipeline::from_config(
        bus.clone(),
        lines.clone(),
        NoDelay,
        &SystemConfig::default(),
        scd41,
    )
    .unwrap()
}

fn two_rooms() -> (SimBus, SimLines, Pipeline) {
    let bus = SimBus::new();
    {
        let mut st = bus.state.borrow_mut();
        st.attach(0, []);
        st.attach(1, []);
    }
    let lines = SimLines::default();
    let pipeline = build(&bus, &lines);
    (bus, lines, pipeline)
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

#[test]
fn begin_stops_then_starts_each_sensor() {
    let (bus, _, mut p) = two_rooms();
    p.begin().unwrap();
    let st = bus.state.borrow();
    for seg in [0, 1] {
        let s = st.sensor(seg);
        assert_eq!(s.commands, vec![0x3F86, 0x21B1]);
        assert!(s.measuring);
    }
    assert_eq!(st.selects, vec![0b01, 0b10]);
}

#[test]
fn begin_without_mux_is_fatal() {
    let (bus, _, mut p) = two_rooms();
    bus.state.borrow_mut().mux_absent = true;
    assert_eq!(p.begin(), Err(InitError::MuxNotDetected));
}

#[test]
fn begin_with_missing_sensor_names_the_channel() {
    let bus = SimBus::new();
    bus.state.borrow_mut().attach(0, []);
    let lines = SimLines::default();
    let mut p = build(&bus, &lines);
    assert!(matches!(
        p.begin(),
        Err(InitError::SensorStart {
            index: 1,
            cause: SensorError::Bus(_)
        })
    ));
}

#[test]
fn readings_are_decoded_and_smoothed() {
    let (bus, _, mut p) = two_rooms();
    bus.state
        .borrow_mut()
        .attach(0, [value(20.0, 80.0, 800), value(24.0, 90.0, 1200)]);

    let a = p.acquire(0, 5_000);
    assert!(a.valid);
    assert!(close(a.temperature, 20.0));
    assert_eq!(a.co2_ppm, 800);

    let b = p.acquire(0, 10_000);
    assert!(close(b.temperature, 22.0), "t={}", b.temperature);
    assert!(close(b.humidity, 85.0), "rh={}", b.humidity);
    assert_eq!(b.co2_ppm, 1200);
    assert_eq!(b.timestamp_ms, 10_000);
}

#[test]
fn channels_never_mix() {
    let (bus, _, mut p) = two_rooms();
    {
        let mut st = bus.state.borrow_mut();
        st.attach(0, [value(20.0, 80.0, 800)]);
        st.attach(1, [value(30.0, 40.0, 1500)]);
    }
    let r = p.acquire_all(1);
    assert_eq!(r[0].co2_ppm, 800);
    assert_eq!(r[1].co2_ppm, 1500);

    // Fruiting faults; spawning keeps its own last-good untouched.
    bus.state.borrow_mut().queue(0, Sample::Nak);
    bus.state.borrow_mut().queue(1, value(31.0, 41.0, 1600));
    let r2 = p.acquire_all(2);
    assert_eq!(r2[0], r[0]);
    assert_eq!(r2[1].co2_ppm, 1600);
}

#[test]
fn select_failures_trigger_exactly_one_recovery() {
    let (bus, lines, mut p) = two_rooms();
    bus.state.borrow_mut().select_fails = true;

    p.acquire(0, 1);
    p.acquire(0, 2);
    assert_eq!(*lines.recoveries.borrow(), 0);
    assert_eq!(p.failure_count(), 2);

    p.acquire(0, 3);
    assert_eq!(*lines.recoveries.borrow(), 1);
    assert_eq!(p.recovery_count(), 1);
    assert_eq!(p.failure_count(), 0);
}

#[test]
fn failures_count_across_channels() {
    let (bus, lines, mut p) = two_rooms();
    {
        let mut st = bus.state.borrow_mut();
        st.attach(0, [Sample::BadCrc, Sample::Nak]);
        st.attach(1, [Sample::Nak]);
    }
    p.acquire(0, 1);
    p.acquire(1, 1);
    p.acquire(0, 2);
    assert_eq!(*lines.recoveries.borrow(), 1);
}

#[test]
fn zero_concentration_returns_prior_reading_unchanged() {
    let (bus, _, mut p) = two_rooms();
    bus.state
        .borrow_mut()
        .attach(0, [value(23.0, 81.0, 850), value(35.0, 20.0, 0)]);
    let good = p.acquire(0, 1);
    let warm = p.acquire(0, 2);
    assert_eq!(warm.temperature, good.temperature);
    assert_eq!(warm.humidity, good.humidity);
    assert_eq!(warm, good);
    assert_eq!(p.failure_count(), 0);
}

#[test]
fn out_of_range_is_discarded_not_counted() {
    let (bus, _, mut p) = two_rooms();
    bus.state.borrow_mut().attach(
        0,
        [
            value(22.0, 70.0, 900),
            value(61.0, 70.0, 900),
            value(22.0, 70.0, 399),
            value(22.0, 70.0, 5001),
        ],
    );
    let good = p.acquire(0, 1);
    for t in 2..5 {
        assert_eq!(p.acquire(0, t), good);
    }
    assert_eq!(p.failure_count(), 0);
}

#[test]
fn boundary_values_are_accepted() {
    let (bus, _, mut p) = two_rooms();
    bus.state
        .borrow_mut()
        .attach(0, [value(22.0, 0.0, 400), value(22.0, 50.0, 5000)]);
    assert!(p.acquire(0, 1).valid);
    assert_eq!(p.acquire(0, 2).co2_ppm, 5000);
}

#[test]
fn unready_sensor_is_skipped_without_counting_a_failure() {
    let (bus, lines, mut p) = two_rooms();
    bus.state.borrow_mut().attach(
        0,
        [
            Sample::NotReady,
            Sample::NotReady,
            Sample::NotReady,
            Sample::NotReady,
            value(22.0, 85.0, 1000),
        ],
    );
    for t in 1..=4 {
        assert!(!p.acquire(0, t).valid);
    }
    assert_eq!(p.failure_count(), 0);
    assert_eq!(*lines.recoveries.borrow(), 0);

    let st = bus.state.borrow();
    let sensor = st.sensor(0);
    assert_eq!(sensor.data_ready_polls, 4);
    assert!(!sensor.commands.contains(&0xEC05));
    drop(st);

    let r = p.acquire(0, 5);
    assert!(r.valid);
    assert_eq!(r.co2_ppm, 1000);
}

#[test]
fn empty_sensor_never_trips_recovery() {
    let (_, lines, mut p) = two_rooms();
    for t in 0..10 {
        p.acquire_all(t);
    }
    assert_eq!(p.failure_count(), 0);
    assert_eq!(*lines.recoveries.borrow(), 0);
}

#[test]
fn never_successful_channel_reports_invalid() {
    let (bus, _, mut p) = two_rooms();
    bus.state.borrow_mut().attach(1, [Sample::BadCrc, value(20.0, 50.0, 0)]);
    assert_eq!(p.acquire(1, 1), Reading::default());
    assert!(!p.acquire(1, 2).valid);
}
