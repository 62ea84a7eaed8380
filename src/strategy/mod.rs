//! Attack Strategies
//!
//! Three interchangeable behaviors, all with the same shape: distance readings and the
//! current time in, one [`DriveCommand`] out. Each strategy owns whatever state it carries
//! from one cycle to the next; nothing else reads or writes it.
//!
//! - [`Direct`]: charge the closest target, search otherwise (stateless)
//! - [`Evade`]: dodge a close target first, then strike
//! - [`FlankAndAttack`]: timed side step, recover and strike maneuver
//!
//! An `Invalid` distance is simply "no target"; strategies cannot fail.

pub mod direct;
pub mod evade;
pub mod flank;

use embassy_time::Instant;

use crate::sensor::distance::DistanceReadings;
use crate::system::config::RobotConfig;
use crate::system::drive_command::DriveCommand;

pub use direct::Direct;
pub use evade::Evade;
pub use flank::{FlankAndAttack, FlankPhase};

/// Rotation used whenever there is nothing to go for
pub const SEARCH_TURN: DriveCommand = DriveCommand::TurnLeft;

/// Strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StrategyId {
    Direct,
    Evade,
    FlankAndAttack,
}

impl StrategyId {
    /// Order of the mode button
    pub fn next(self) -> Self {
        match self {
            StrategyId::Direct => StrategyId::Evade,
            StrategyId::Evade => StrategyId::FlankAndAttack,
            StrategyId::FlankAndAttack => StrategyId::Direct,
        }
    }
}

/// Common interface of all attack behaviors
pub trait Strategy {
    /// Decides this cycle's command and advances the strategy's own state
    fn evaluate(&mut self, readings: &DistanceReadings, now: Instant) -> DriveCommand;

    /// Returns to the state the strategy starts a fight in
    fn reset(&mut self);
}

/// All strategies of one robot and which one is running
///
/// Switching to a different strategy resets it, so a strategy picked again later never
/// resumes a stale maneuver.
pub struct StrategySet {
    direct: Direct,
    evade: Evade,
    flank: FlankAndAttack,
    active: Option<StrategyId>,
}

impl StrategySet {
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            direct: Direct::new(config.attack_range_cm),
            evade: Evade::new(config.attack_range_cm, config.evade_duration),
            flank: FlankAndAttack::new(
                config.attack_range_cm,
                config.sidestep_duration,
                config.recover_duration,
                config.strike_duration,
            ),
            active: None,
        }
    }

    /// Strategy that ran last, if any
    pub fn active(&self) -> Option<StrategyId> {
        self.active
    }

    /// Forgets the running strategy; the next evaluation starts from a reset state
    pub fn stand_down(&mut self) {
        self.active = None;
    }

    pub fn flank(&self) -> &FlankAndAttack {
        &self.flank
    }

    pub fn evade(&self) -> &Evade {
        &self.evade
    }

    fn get_mut(&mut self, id: StrategyId) -> &mut dyn Strategy {
        match id {
            StrategyId::Direct => &mut self.direct,
            StrategyId::Evade => &mut self.evade,
            StrategyId::FlankAndAttack => &mut self.flank,
        }
    }

    /// Runs strategy `id` for one cycle, resetting it first if it was not the one running
    pub fn evaluate(
        &mut self,
        id: StrategyId,
        readings: &DistanceReadings,
        now: Instant,
    ) -> DriveCommand {
        if self.active != Some(id) {
            info!("strategy {:?} -> {:?}", self.active, id);
            self.get_mut(id).reset();
            self.active = Some(id);
        }
        self.get_mut(id).evaluate(readings, now)
    }
}
