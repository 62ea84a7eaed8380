//! Evade then strike
//!
//! A target that comes into range is not charged head-on. The robot first turns away from
//! it for a fixed time, then drives forward once the turn is done.
//!
//! # States
//! - Scanning: searching; a target in range starts an evade turn
//! - Evading: holds the turn picked on entry until the evade time is exceeded, then strikes
//!   for one cycle and goes back to scanning
//!
//! Losing the target at any point drops back to scanning.

use embassy_time::{Duration, Instant};

use crate::sensor::distance::DistanceReadings;
use crate::strategy::{Strategy, SEARCH_TURN};
use crate::system::drive_command::DriveCommand;

#[derive(Debug, Clone, Copy, PartialEq)]
enum EvadeState {
    Scanning,
    Evading { since: Instant, turn: DriveCommand },
}

#[derive(Debug, Clone)]
pub struct Evade {
    attack_range_cm: f32,
    duration: Duration,
    state: EvadeState,
}

impl Evade {
    pub fn new(attack_range_cm: f32, duration: Duration) -> Self {
        Self {
            attack_range_cm,
            duration,
            state: EvadeState::Scanning,
        }
    }

    pub fn is_evading(&self) -> bool {
        matches!(self.state, EvadeState::Evading { .. })
    }
}

impl Strategy for Evade {
    fn evaluate(&mut self, readings: &DistanceReadings, now: Instant) -> DriveCommand {
        let Some(threat) = readings.target_within(self.attack_range_cm) else {
            if self.is_evading() {
                debug!("evade: target lost");
            }
            self.state = EvadeState::Scanning;
            return SEARCH_TURN;
        };

        match self.state {
            EvadeState::Scanning => {
                let turn = threat.turn_away();
                debug!("evade: target on {:?}, turning away", threat);
                self.state = EvadeState::Evading { since: now, turn };
                turn
            }
            EvadeState::Evading { since, turn } => {
                if now.saturating_duration_since(since) > self.duration {
                    self.state = EvadeState::Scanning;
                    DriveCommand::Forward
                } else {
                    turn
                }
            }
        }
    }

    fn reset(&mut self) {
        self.state = EvadeState::Scanning;
    }
}
