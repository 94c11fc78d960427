//! Self-test over the simulated bus.

use crate::mock_hw::*;
use mash::config::SystemConfig;
use mash::diagnostics::{ChannelVerdict, run_self_test};
use mash::sensors::acquisition::AcquisitionPipeline;

fn pipeline(bus: &SimBus) -> AcquisitionPipeline<SimBus, SimLines, NoDelay, SimSensorDriver> {
    AcquisitionPipeline::from_config(
        bus.clone(),
        SimLines::default(),
        NoDelay,
        &SystemConfig::default(),
        scd41,
    )
    .unwrap()
}

fn verdicts(report: &mash::diagnostics::SelfTestReport) -> Vec<ChannelVerdict> {
    report.channels.iter().map(|c| c.verdict).collect()
}

#[test]
fn healthy_bus_reports_all_ok() {
    let bus = SimBus::new();
    {
        let mut st = bus.state.borrow_mut();
        st.attach(0, [value(23.0, 80.0, 900)]);
        st.attach(1, [value(21.0, 70.0, 1200)]);
    }
    let report = run_self_test(&mut pipeline(&bus));
    assert!(report.mux_present);
    assert!(report.all_ok());
    assert_eq!(report.channels[0].room.as_str(), "fruiting");
    assert_eq!(report.channels[1].raw.map(|m| m.co2_ppm), Some(1200));
}

#[test]
fn verdicts_distinguish_each_failure() {
    let bus = SimBus::new();
    {
        let mut st = bus.state.borrow_mut();
        st.attach(0, [value(23.0, 80.0, 0)]);
        st.attach(1, [Sample::BadCrc]);
    }
    let report = run_self_test(&mut pipeline(&bus));
    assert_eq!(
        verdicts(&report),
        vec![ChannelVerdict::WarmingUp, ChannelVerdict::ReadFailed]
    );
    assert!(!report.all_ok());
}

#[test]
fn missing_mux_fails_every_select() {
    let bus = SimBus::new();
    bus.state.borrow_mut().mux_absent = true;
    let report = run_self_test(&mut pipeline(&bus));
    assert!(!report.mux_present);
    assert_eq!(
        verdicts(&report),
        vec![ChannelVerdict::SelectFailed, ChannelVerdict::SelectFailed]
    );
}

#[test]
fn self_test_leaves_acquisition_state_alone() {
    let bus = SimBus::new();
    {
        let mut st = bus.state.borrow_mut();
        st.attach(0, [value(23.0, 80.0, 900), Sample::Nak]);
        st.attach(1, [Sample::Nak, Sample::Nak]);
    }
    let lines = SimLines::default();
    let mut p = AcquisitionPipeline::from_config(
        bus.clone(),
        lines.clone(),
        NoDelay,
        &SystemConfig::default(),
        scd41,
    )
    .unwrap();
    let good = p.acquire(0, 1);

    for _ in 0..3 {
        run_self_test(&mut p);
    }
    assert_eq!(p.failure_count(), 0);
    assert_eq!(*lines.recoveries.borrow(), 0);
    assert_eq!(p.last_good(0), Some(good));
}

#[test]
fn report_serialises_for_the_console() {
    let bus = SimBus::new();
    bus.state.borrow_mut().attach(0, [value(25.0, 50.0, 600)]);
    let report = run_self_test(&mut pipeline(&bus));
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.starts_with(r#"{"mux_present":true,"channels":[{"room":"fruiting","verdict":"ok""#));
    assert!(json.contains(r#"{"room":"spawning","verdict":"read_failed"}"#));
}
