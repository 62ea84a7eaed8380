//! Test doubles for driving the combat engine on the host
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embassy_time::Instant;
use embedded_hal_async::delay::DelayNs;
use sumo_bot::sensor::{DistanceChannel, DriverError, EdgePin, SensorDriver};
use sumo_bot::system::clock::Clock;
use sumo_bot::system::drive_command::ActuatorSink;
use sumo_bot::{CombatEngine, DriveCommand, RobotConfig};

/// One timeline shared by the clock, the delay and the actuator log
#[derive(Clone, Default)]
pub struct FakeTime {
    ns: Rc<Cell<u64>>,
}

impl FakeTime {
    pub fn now(&self) -> Instant {
        Instant::from_micros(self.ns.get() / 1_000)
    }

    pub fn now_ms(&self) -> u64 {
        self.ns.get() / 1_000_000
    }

    pub fn advance_ms(&self, ms: u64) {
        self.ns.set(self.ns.get() + ms * 1_000_000);
    }
}

pub struct FakeClock(pub FakeTime);

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.0.now()
    }
}

/// Delays return immediately but move the shared clock forward
pub struct FakeDelay(pub FakeTime);

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.0.ns.set(self.0.ns.get() + u64::from(ns));
    }
}

/// Sensor state a test can change between cycles
#[derive(Default)]
pub struct Scene {
    pub left: Option<u16>,
    pub right: Option<u16>,
    pub center: Option<u16>,
    pub front_high: bool,
    pub back_high: bool,
    pub samples_taken: usize,
}

#[derive(Clone, Default)]
pub struct ScriptedSensors(pub Rc<RefCell<Scene>>);

impl SensorDriver for ScriptedSensors {
    async fn sample_raw(&mut self, channel: DistanceChannel) -> Result<u16, DriverError> {
        let mut scene = self.0.borrow_mut();
        scene.samples_taken += 1;
        let raw = match channel {
            DistanceChannel::Left => scene.left,
            DistanceChannel::Right => scene.right,
            DistanceChannel::Center => scene.center,
        };
        raw.ok_or(DriverError::Timeout)
    }

    fn read_digital(&mut self, pin: EdgePin) -> bool {
        let scene = self.0.borrow();
        match pin {
            EdgePin::Front => scene.front_high,
            EdgePin::Back => scene.back_high,
        }
    }
}

/// Every command with the time it was issued
#[derive(Clone)]
pub struct RecordingActuator {
    time: FakeTime,
    pub log: Rc<RefCell<Vec<(u64, DriveCommand)>>>,
}

impl RecordingActuator {
    pub fn new(time: FakeTime) -> Self {
        Self {
            time,
            log: Rc::default(),
        }
    }

    pub fn commands(&self) -> Vec<DriveCommand> {
        self.log.borrow().iter().map(|&(_, c)| c).collect()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

impl ActuatorSink for RecordingActuator {
    fn drive(&mut self, command: DriveCommand) {
        self.log.borrow_mut().push((self.time.now_ms(), command));
    }
}

pub type TestEngine = CombatEngine<ScriptedSensors, RecordingActuator, FakeClock, FakeDelay>;

pub struct Rig {
    pub time: FakeTime,
    pub scene: Rc<RefCell<Scene>>,
    pub actuator: RecordingActuator,
    pub engine: TestEngine,
}

impl Rig {
    pub fn new(config: RobotConfig) -> Self {
        let time = FakeTime::default();
        // start well away from zero so phase timestamps are distinguishable from a reset
        time.advance_ms(10_000);
        let sensors = ScriptedSensors::default();
        let scene = sensors.0.clone();
        let actuator = RecordingActuator::new(time.clone());
        let engine = CombatEngine::new(
            config,
            sensors,
            actuator.clone(),
            FakeClock(time.clone()),
            FakeDelay(time.clone()),
        );
        Self {
            time,
            scene,
            actuator,
            engine,
        }
    }
}

/// Raw 10-bit value the Sharp curve turns into roughly `cm`
pub fn sharp_raw_for_cm(cm: f32) -> u16 {
    (6762.0 / (cm + 4.0) + 9.0).round() as u16
}
