//! Arbitration Loop
//!
//! One fixed-rate loop decides everything. Every cycle, in strict priority order:
//! 1. Not authorized yet: stand still, touch nothing else
//! 2. Edge override: a front edge backs off and turns right, a rear edge drives forward.
//!    The recovery runs to completion before anything is sensed again, and the active
//!    strategy is not evaluated, so it picks up where it was once the edge is clear.
//! 3. Strategy: read the distance sensors and let the selected strategy decide
//!
//! The strategy selection is read once at the start of a cycle; a change made while the
//! cycle runs applies to the next one.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use crate::sensor::edge::{read_edges, EdgeState};
use crate::sensor::SensorDriver;
use crate::strategy::{StrategyId, StrategySet};
use crate::system::clock::Clock;
use crate::system::config::RobotConfig;
use crate::system::drive_command::{ActuatorSink, DriveCommand};
use crate::system::state::CombatContext;

/// What one control cycle did
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleOutcome {
    /// Combat not authorized, motors held at stop
    Idle,
    /// An edge was seen and the recovery maneuver has completed
    EdgeRecovery(EdgeState),
    /// The selected strategy issued `command`
    Strategy {
        id: StrategyId,
        command: DriveCommand,
    },
}

/// The decision engine with its sensors, actuator and time sources attached
pub struct CombatEngine<S, A, C, D> {
    config: RobotConfig,
    sensors: S,
    actuator: A,
    clock: C,
    delay: D,
    strategies: StrategySet,
}

impl<S, A, C, D> CombatEngine<S, A, C, D>
where
    S: SensorDriver,
    A: ActuatorSink,
    C: Clock,
    D: DelayNs,
{
    pub fn new(config: RobotConfig, sensors: S, actuator: A, clock: C, delay: D) -> Self {
        Self {
            strategies: StrategySet::new(&config),
            config,
            sensors,
            actuator,
            clock,
            delay,
        }
    }

    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    /// Runs one control cycle
    pub async fn cycle(&mut self, ctx: &CombatContext) -> CycleOutcome {
        if !ctx.is_authorized() {
            self.strategies.stand_down();
            self.actuator.drive(DriveCommand::Stop);
            return CycleOutcome::Idle;
        }
        let id = ctx.strategy();

        let edges = read_edges(&mut self.sensors, self.config.edge_polarity);
        let recovery = self.config.edge_recovery_duration;
        if edges.front {
            info!("front edge, backing off");
            let turn = self.config.edge_turn_duration;
            self.hold(DriveCommand::Backward, recovery).await;
            self.hold(DriveCommand::TurnRight, turn).await;
            return CycleOutcome::EdgeRecovery(edges);
        }
        if edges.back {
            info!("rear edge, pushing forward");
            self.hold(DriveCommand::Forward, recovery).await;
            return CycleOutcome::EdgeRecovery(edges);
        }

        let readings = self
            .config
            .filter
            .read_readings(self.config.arity, &mut self.sensors, &mut self.delay)
            .await;
        let now = self.clock.now();
        let command = self.strategies.evaluate(id, &readings, now);
        debug!("{:?}: {:?} -> {:?}", id, readings, command);
        self.actuator.drive(command);

        CycleOutcome::Strategy { id, command }
    }

    /// Runs the control loop until power-off
    pub async fn run(&mut self, ctx: &CombatContext) -> ! {
        info!("combat loop started, period {} ms", self.config.loop_period.as_millis());
        loop {
            self.cycle(ctx).await;
            let period = self.config.loop_period;
            self.pause(period).await;
        }
    }

    /// Issues `command` and blocks the loop for `duration`
    async fn hold(&mut self, command: DriveCommand, duration: Duration) {
        self.actuator.drive(command);
        self.pause(duration).await;
    }

    async fn pause(&mut self, duration: Duration) {
        let us = u32::try_from(duration.as_micros()).unwrap_or(u32::MAX);
        self.delay.delay_us(us).await;
    }
}
