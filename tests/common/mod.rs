#![allow(dead_code)]

use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan,
    EnvFilter,
};

use rs485bus::{
    direction::DirectionLog,
    transport::{
        MemoryBus,
        MemoryPort,
    },
    Address,
    Config,
    Node,
    Scheme,
    StepClock,
};

pub type TestNode = Node<MemoryPort, DirectionLog, StepClock>;

pub fn trace_init() {
    let level_filter = EnvFilter::from_str("debug").unwrap();

    // several tests in one binary race to install the subscriber
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(level_filter)
        .try_init();
}

pub fn config(address: u8, max_payload: usize, scheme: Scheme) -> Config {
    Config {
        address: Address::new(address),
        max_payload,
        scheme,
        ..Config::default()
    }
}

/// A node on a shared in-memory bus plus handles onto its port, direction
/// line and clock.
pub struct Station {
    pub node:      TestNode,
    pub port:      MemoryPort,
    pub direction: DirectionLog,
    pub clock:     StepClock,
}

impl Station {
    pub fn attach(bus: &MemoryBus, config: &Config) -> Self {
        let port = bus.attach();
        let direction = DirectionLog::new();
        let clock = StepClock::default();

        Self {
            node: Node::new(port.clone(), direction.clone(), clock.clone(), config),
            port,
            direction,
            clock,
        }
    }
}

/// Two stations at addresses 1 and 2 on a fresh bus.
pub fn pair(max_payload: usize, scheme: Scheme) -> (Station, Station) {
    let bus = MemoryBus::new();

    let a = Station::attach(&bus, &config(1, max_payload, scheme));
    let b = Station::attach(&bus, &config(2, max_payload, scheme));

    (a, b)
}
