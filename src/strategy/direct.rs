//! Direct attack: drive at anything in range, otherwise turn toward the closest thing seen.

use embassy_time::Instant;

use crate::sensor::distance::DistanceReadings;
use crate::strategy::{Strategy, SEARCH_TURN};
use crate::system::drive_command::DriveCommand;

/// Stateless charge toward the closest target
#[derive(Debug, Clone)]
pub struct Direct {
    attack_range_cm: f32,
}

impl Direct {
    pub fn new(attack_range_cm: f32) -> Self {
        Self { attack_range_cm }
    }

    /// Pure decision, usable without a `&mut`
    pub fn decide(&self, readings: &DistanceReadings) -> DriveCommand {
        match readings.closest() {
            Some((_, cm)) if cm < self.attack_range_cm => DriveCommand::Forward,
            Some((side, _)) => side.turn_toward(),
            None => SEARCH_TURN,
        }
    }
}

impl Strategy for Direct {
    fn evaluate(&mut self, readings: &DistanceReadings, _now: Instant) -> DriveCommand {
        self.decide(readings)
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::distance::Distance;

    fn pair(left: Distance, right: Distance) -> DistanceReadings {
        DistanceReadings::Pair { left, right }
    }

    #[test]
    fn target_in_range_on_one_side_charges() {
        let mut direct = Direct::new(35.0);
        let readings = pair(Distance::Valid(20.0), Distance::Invalid);
        assert_eq!(
            direct.evaluate(&readings, Instant::from_millis(0)),
            DriveCommand::Forward
        );
    }

    #[test]
    fn nothing_seen_searches_left() {
        let mut direct = Direct::new(35.0);
        let readings = pair(Distance::Invalid, Distance::Invalid);
        assert_eq!(
            direct.evaluate(&readings, Instant::from_millis(0)),
            DriveCommand::TurnLeft
        );
    }

    #[test]
    fn far_target_is_turned_toward() {
        let direct = Direct::new(35.0);
        assert_eq!(
            direct.decide(&pair(Distance::Invalid, Distance::Valid(60.0))),
            DriveCommand::TurnRight
        );
        assert_eq!(
            direct.decide(&pair(Distance::Valid(50.0), Distance::Invalid)),
            DriveCommand::TurnLeft
        );
        assert_eq!(
            direct.decide(&pair(Distance::Valid(70.0), Distance::Valid(45.0))),
            DriveCommand::TurnRight
        );
    }

    #[test]
    fn attack_range_is_exclusive() {
        let direct = Direct::new(35.0);
        assert_eq!(
            direct.decide(&DistanceReadings::Single(Distance::Valid(35.0))),
            DriveCommand::TurnLeft
        );
        assert_eq!(
            direct.decide(&DistanceReadings::Single(Distance::Valid(34.9))),
            DriveCommand::Forward
        );
    }

    #[test]
    fn same_inputs_give_the_same_command_regardless_of_time() {
        let mut direct = Direct::new(35.0);
        let readings = pair(Distance::Valid(40.0), Distance::Valid(40.0));
        let first = direct.evaluate(&readings, Instant::from_millis(0));
        for ms in [1, 500, 10_000, 1_000_000] {
            assert_eq!(direct.evaluate(&readings, Instant::from_millis(ms)), first);
        }
        // tie resolves to the left
        assert_eq!(first, DriveCommand::TurnLeft);
    }
}
