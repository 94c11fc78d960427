//! End-to-end: AppService over the simulated bus, real relay bank and the
//! host-link sink on an in-memory transport.

use crate::mock_hw::*;
use mash::adapters::host_link::{HostLinkSink, MemoryTransport};
use mash::app::commands::Actuator;
use mash::app::events::AppEvent;
use mash::app::ports::ActuatorPort;
use mash::app::service::AppService;
use mash::config::SystemConfig;
use mash::drivers::relay::RelayBank;
use mash::error::InitError;
use mash::sensors::acquisition::AcquisitionPipeline;

type Pipeline = AcquisitionPipeline<SimBus, SimLines, NoDelay, SimSensorDriver>;

struct Rig {
    bus: SimBus,
    pipeline: Pipeline,
    relays: RelayBank,
    sink: (EventLog, HostLinkSink<MemoryTransport>),
    clock: FakeClock,
    app: AppService,
}

impl Rig {
    fn new() -> Self {
        let config = SystemConfig::default();
        let bus = SimBus::new();
        {
            let mut st = bus.state.borrow_mut();
            st.attach(0, []);
            st.attach(1, []);
        }
        let pipeline = AcquisitionPipeline::from_config(
            bus.clone(),
            SimLines::default(),
            NoDelay,
            &config,
            scd41,
        )
        .unwrap();
        Self {
            bus,
            pipeline,
            relays: RelayBank::new(&config.relays),
            sink: (EventLog::default(), HostLinkSink::new(MemoryTransport::new())),
            clock: FakeClock::default(),
            app: AppService::new(&config),
        }
    }

    fn start(&mut self) -> Result<(), InitError> {
        self.app
            .start(&mut self.pipeline, &mut self.relays, &self.clock, &mut self.sink)
    }

    fn send(&mut self, at: u64, bytes: &[u8]) {
        self.app
            .on_host_bytes(bytes, at, &mut self.relays, &mut self.sink);
    }

    fn poll(&mut self, at: u64) {
        self.app
            .poll(at, &mut self.pipeline, &mut self.relays, &mut self.sink);
    }

    fn host_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sink.1.transport_mut().tx)
    }

    fn events(&self) -> &[AppEvent] {
        &self.sink.0.0
    }
}

#[test]
fn startup_then_telemetry_line_per_cycle() {
    let mut rig = Rig::new();
    rig.start().unwrap();
    assert!(matches!(rig.events()[0], AppEvent::Started { channels: 2 }));

    rig.bus.state.borrow_mut().queue(0, value(23.4, 81.2, 850));
    rig.poll(5_000);
    assert_eq!(
        rig.host_lines(),
        vec![r#"{"fruiting":{"temp":23.4,"humidity":81.2,"co2":850},"spawning":{"error":"invalid_reading"}}"#]
    );

    rig.poll(6_000);
    assert!(rig.host_lines().is_empty());
}

#[test]
fn failed_start_keeps_everything_off_and_tells_the_host() {
    let mut rig = Rig::new();
    rig.bus.state.borrow_mut().mux_absent = true;
    assert_eq!(rig.start(), Err(InitError::MuxNotDetected));
    assert_eq!(rig.relays.active_count(), 0);
    assert_eq!(
        rig.host_lines(),
        vec![r#"{"status":"init_failed","error":"mux_not_detected"}"#]
    );

    rig.poll(60_000);
    assert!(rig.host_lines().is_empty());
    assert!(!rig.app.is_started());
    assert_eq!(rig.app.cycle_count(), 0);
}

#[test]
fn host_commands_drive_relays() {
    let mut rig = Rig::new();
    rig.start().unwrap();

    rig.send(10, b"{\"actuator\":\"HUMIDIFIER_FAN\",\"state\":\"ON\"}\r\n");
    rig.send(20, b"FRUITING_LED_ON\n");
    assert!(rig.relays.is_on(Actuator::HumidifierFan));
    assert!(rig.relays.is_on(Actuator::FruitingLed));
    assert_eq!(rig.relays.level(Actuator::FruitingLed), Some(false));

    rig.send(30, b"ALL_OFF\n");
    assert_eq!(rig.relays.active_count(), 0);
}

#[test]
fn bad_commands_are_rejected_without_side_effects() {
    let mut rig = Rig::new();
    rig.start().unwrap();
    rig.send(10, b"{\"actuator\":\"MIST_MAKER\"}\n{\"actuator\":\"X\",\"state\":\"ON\"}\n");
    let rejected = rig
        .events()
        .iter()
        .filter(|e| matches!(e, AppEvent::CommandRejected(_)))
        .count();
    assert_eq!(rejected, 2);
    assert_eq!(rig.relays.active_count(), 0);
}

#[test]
fn link_loss_shuts_down_and_announces_once() {
    let mut rig = Rig::new();
    rig.start().unwrap();
    rig.send(100, b"MIST_MAKER_ON\n");
    rig.host_lines();

    for t in (1_000..=30_000).step_by(1_000) {
        rig.poll(t);
    }
    assert!(!rig.relays.is_on(Actuator::MistMaker));
    let status: Vec<String> = rig
        .host_lines()
        .into_iter()
        .filter(|l| l.contains("status"))
        .collect();
    assert_eq!(status, vec![r#"{"status":"link_lost","silent_ms":10900}"#]);

    rig.send(31_500, b"{\"keepalive\":true}\n");
    assert_eq!(
        rig.host_lines(),
        vec![r#"{"status":"link_restored","downtime_ms":20500,"recoveries":1}"#]
    );
    // Host must re-command; nothing is restored automatically.
    assert!(!rig.relays.is_on(Actuator::MistMaker));
    assert!(rig.app.is_link_safe());
}

#[test]
fn any_byte_keeps_the_link_alive() {
    let mut rig = Rig::new();
    rig.start().unwrap();
    for t in (1_000..=60_000).step_by(1_000) {
        rig.send(t, b"x");
        rig.poll(t);
    }
    assert!(rig.app.is_link_safe());
    assert!(
        !rig
            .events()
            .iter()
            .any(|e| matches!(e, AppEvent::LinkLost { .. }))
    );
}

#[test]
fn mock_port_sees_single_shutdown_per_episode() {
    let config = SystemConfig::default();
    let bus = SimBus::new();
    bus.state.borrow_mut().attach(0, []);
    bus.state.borrow_mut().attach(1, []);
    let mut pipeline: Pipeline =
        AcquisitionPipeline::from_config(bus, SimLines::default(), NoDelay, &config, scd41).unwrap();
    let mut relays = MockRelays::default();
    let mut events = EventLog::default();
    let mut app = AppService::new(&config);
    app.start(&mut pipeline, &mut relays, &FakeClock::default(), &mut events)
        .unwrap();
    assert_eq!(relays.shutdowns(), 1);

    for episode in 0..2u64 {
        let base = episode * 100_000;
        for t in (base + 1_000..base + 40_000).step_by(1_000) {
            app.poll(t, &mut pipeline, &mut relays, &mut events);
        }
        app.on_host_bytes(b"\n", base + 50_000, &mut relays, &mut events);
    }
    assert_eq!(relays.shutdowns(), 3);
    assert_eq!(app.watchdog().recovery_count(), 2);
}
