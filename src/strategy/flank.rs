//! Flank and attack
//!
//! Four-phase timed maneuver:
//! ```text
//! Search --target in range--> SideStep --sidestep--> Recover --recover--> Strike --strike--> Search
//! ```
//! - Search: rotate until a target is in range, remember which side it was on
//! - SideStep: turn away from that side
//! - Recover: turn back toward it; recover is longer than the side step, so the robot comes
//!   back in at an angle on the opponent's flank
//! - Strike: drive forward whatever the sensors say
//!
//! Once the maneuver has started only time moves it on. Each phase ends exactly one phase
//! duration after the previous boundary, so the schedule does not drift with loop jitter,
//! and several phases can end in one evaluation if the loop was held up (an edge recovery).

use embassy_time::{Duration, Instant};

use crate::sensor::distance::{DistanceReadings, Side};
use crate::strategy::{Strategy, SEARCH_TURN};
use crate::system::drive_command::DriveCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlankPhase {
    Search,
    SideStep,
    Recover,
    Strike,
}

#[derive(Debug, Clone)]
pub struct FlankAndAttack {
    attack_range_cm: f32,
    sidestep: Duration,
    recover: Duration,
    strike: Duration,
    phase: FlankPhase,
    phase_start: Instant,
    side: Side,
}

impl FlankAndAttack {
    pub fn new(
        attack_range_cm: f32,
        sidestep: Duration,
        recover: Duration,
        strike: Duration,
    ) -> Self {
        Self {
            attack_range_cm,
            sidestep,
            recover,
            strike,
            phase: FlankPhase::Search,
            phase_start: Instant::from_ticks(0),
            side: Side::Left,
        }
    }

    pub fn phase(&self) -> FlankPhase {
        self.phase
    }

    pub fn phase_start(&self) -> Instant {
        self.phase_start
    }

    /// Side the target was seen on when the maneuver started
    pub fn target_side(&self) -> Side {
        self.side
    }

    /// Moves through every timed phase that has run out by `now`
    fn advance(&mut self, now: Instant) {
        loop {
            let (limit, next) = match self.phase {
                FlankPhase::Search => return,
                FlankPhase::SideStep => (self.sidestep, FlankPhase::Recover),
                FlankPhase::Recover => (self.recover, FlankPhase::Strike),
                FlankPhase::Strike => (self.strike, FlankPhase::Search),
            };
            if now.saturating_duration_since(self.phase_start) < limit {
                return;
            }
            self.phase_start += limit;
            debug!("flank: {:?} -> {:?}", self.phase, next);
            self.phase = next;
        }
    }
}

impl Strategy for FlankAndAttack {
    fn evaluate(&mut self, readings: &DistanceReadings, now: Instant) -> DriveCommand {
        self.advance(now);

        match self.phase {
            FlankPhase::Search => match readings.target_within(self.attack_range_cm) {
                Some(side) => {
                    debug!("flank: target on {:?}, side step", side);
                    self.side = side;
                    self.phase = FlankPhase::SideStep;
                    self.phase_start = now;
                    side.turn_away()
                }
                None => SEARCH_TURN,
            },
            FlankPhase::SideStep => self.side.turn_away(),
            FlankPhase::Recover => self.side.turn_toward(),
            FlankPhase::Strike => DriveCommand::Forward,
        }
    }

    fn reset(&mut self) {
        self.phase = FlankPhase::Search;
        self.phase_start = Instant::from_ticks(0);
        self.side = Side::Left;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::distance::Distance;

    fn flank() -> FlankAndAttack {
        FlankAndAttack::new(
            35.0,
            Duration::from_millis(250),
            Duration::from_millis(350),
            Duration::from_millis(1000),
        )
    }

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn right_target() -> DistanceReadings {
        DistanceReadings::Pair {
            left: Distance::Invalid,
            right: Distance::Valid(25.0),
        }
    }

    fn nothing() -> DistanceReadings {
        DistanceReadings::Pair {
            left: Distance::Invalid,
            right: Distance::Invalid,
        }
    }

    #[test]
    fn searches_until_a_target_is_in_range() {
        let mut s = flank();
        assert_eq!(s.evaluate(&nothing(), at(0)), SEARCH_TURN);
        let far = DistanceReadings::Single(Distance::Valid(50.0));
        assert_eq!(s.evaluate(&far, at(20)), SEARCH_TURN);
        assert_eq!(s.phase(), FlankPhase::Search);
    }

    #[test]
    fn phase_schedule_is_fixed_by_the_detection_time() {
        let mut s = flank();
        let t0 = 1_000;

        assert_eq!(s.evaluate(&right_target(), at(t0)), DriveCommand::TurnLeft);
        assert_eq!(s.phase(), FlankPhase::SideStep);
        assert_eq!(s.target_side(), Side::Right);

        // sensors are ignored mid-maneuver
        assert_eq!(s.evaluate(&nothing(), at(t0 + 249)), DriveCommand::TurnLeft);
        assert_eq!(s.phase(), FlankPhase::SideStep);

        assert_eq!(s.evaluate(&nothing(), at(t0 + 250)), DriveCommand::TurnRight);
        assert_eq!(s.phase(), FlankPhase::Recover);
        assert_eq!(s.phase_start(), at(t0 + 250));

        assert_eq!(s.evaluate(&nothing(), at(t0 + 599)), DriveCommand::TurnRight);
        assert_eq!(s.evaluate(&nothing(), at(t0 + 600)), DriveCommand::Forward);
        assert_eq!(s.phase(), FlankPhase::Strike);

        assert_eq!(s.evaluate(&right_target(), at(t0 + 1_599)), DriveCommand::Forward);
        assert_eq!(s.evaluate(&nothing(), at(t0 + 1_600)), SEARCH_TURN);
        assert_eq!(s.phase(), FlankPhase::Search);
    }

    #[test]
    fn boundaries_do_not_drift_with_late_cycles() {
        let mut s = flank();
        s.evaluate(&right_target(), at(0));
        // first look after the side step is 30ms late
        s.evaluate(&nothing(), at(280));
        assert_eq!(s.phase(), FlankPhase::Recover);
        assert_eq!(s.phase_start(), at(250));
    }

    #[test]
    fn long_stall_cascades_through_phases() {
        let mut s = flank();
        s.evaluate(&right_target(), at(0));
        assert_eq!(s.evaluate(&nothing(), at(700)), DriveCommand::Forward);
        assert_eq!(s.phase(), FlankPhase::Strike);
        assert_eq!(s.phase_start(), at(600));
    }

    #[test]
    fn back_in_search_a_new_target_restarts_the_maneuver() {
        let mut s = flank();
        s.evaluate(&right_target(), at(0));
        let left = DistanceReadings::Pair {
            left: Distance::Valid(12.0),
            right: Distance::Invalid,
        };
        assert_eq!(s.evaluate(&left, at(1_600)), DriveCommand::TurnRight);
        assert_eq!(s.phase(), FlankPhase::SideStep);
        assert_eq!(s.target_side(), Side::Left);
        assert_eq!(s.phase_start(), at(1_600));
    }

    #[test]
    fn reset_abandons_the_maneuver() {
        let mut s = flank();
        s.evaluate(&right_target(), at(0));
        s.reset();
        assert_eq!(s.phase(), FlankPhase::Search);
        assert_eq!(s.evaluate(&nothing(), at(100)), SEARCH_TURN);
    }
}
