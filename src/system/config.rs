//! Robot Configuration
//!
//! All tunables of the decision engine in one place. The robot has been built in four
//! variants over time (analog IR or ultrasonic ranging, one or two distance sensors, and
//! edge detectors of either polarity); each one is a preset here rather than a separate
//! program.
//!
//! # Timing
//! - Control loop: 20ms between cycles
//! - Edge recovery: 400ms reverse (or forward for a rear edge), then 250ms turn
//! - Flank maneuver: 250ms side step, 350ms recover, 1s strike
//!
//! # Speed
//! One fixed combat speed. The motor bring-up used a duty of 200/255, which is 78%.

use core::fmt;

use embassy_time::Duration;

use crate::sensor::distance::{Calibration, DistanceFilter, TrustedWindow};

/// Targets closer than this are attacked (cm)
pub const ATTACK_RANGE_CM: f32 = 35.0;

/// Attack range of the ultrasonic variants, which see further reliably (cm)
pub const ULTRASONIC_ATTACK_RANGE_CM: f32 = 40.0;

/// How long the evade turn is held before striking
pub const EVADE_DURATION: Duration = Duration::from_millis(300);

/// Flank maneuver: turn away from the target
pub const SIDESTEP_DURATION: Duration = Duration::from_millis(250);

/// Flank maneuver: turn back toward the target. Longer than the side step so the robot ends
/// up angled in on the opponent's flank.
pub const RECOVER_DURATION: Duration = Duration::from_millis(350);

/// Flank maneuver: committed forward push
pub const STRIKE_DURATION: Duration = Duration::from_millis(1000);

/// Drive away from a detected edge for this long
pub const EDGE_RECOVERY_DURATION: Duration = Duration::from_millis(400);

/// Turn after backing off a front edge
pub const EDGE_TURN_DURATION: Duration = Duration::from_millis(250);

/// Delay between two control cycles
pub const LOOP_PERIOD: Duration = Duration::from_millis(20);

/// Mandatory wait between power-up and the first movement
pub const PRE_FIGHT_DELAY: Duration = Duration::from_secs(3);

/// Combat speed in percent of full duty (200/255)
pub const COMBAT_SPEED: u8 = 78;

/// Raw samples averaged per distance reading
pub const SAMPLE_COUNT: u8 = 5;

/// Pause between raw samples so consecutive samples are not correlated
pub const INTER_SAMPLE_DELAY: Duration = Duration::from_micros(500);

/// Sharp GP2Y0A21 curve on a 10-bit scale: `cm = 6762 / (raw - 9) - 4`
pub const SHARP_IR_CALIBRATION: Calibration = Calibration::SharpIr {
    a: 6762.0,
    b: 9.0,
    c: 4.0,
    signal_floor: 80,
};

/// Sharp sensor is only trusted between 10cm and 80cm
pub const SHARP_IR_WINDOW: TrustedWindow = TrustedWindow::new(10.0, 80.0);

/// Longest echo waited for, a bit over 4m round trip (µs)
pub const ECHO_TIMEOUT_US: u16 = 25_000;

/// HC-SR04 echo timing at 21.5°C, echo given in microseconds
pub const ULTRASONIC_CALIBRATION: Calibration = Calibration::Ultrasonic {
    sound_speed_cm_per_us: 0.0344,
    echo_timeout_us: ECHO_TIMEOUT_US,
};

/// Ultrasonic sensor is only trusted between 3cm and 150cm
pub const ULTRASONIC_WINDOW: TrustedWindow = TrustedWindow::new(3.0, 150.0);

/// Number of distance sensors mounted on the front
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorArity {
    /// One center-mounted sensor, treated as left == right
    Single,
    /// A left and a right sensor
    Pair,
}

/// Logic level an edge detector drives when it sees no surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePolarity {
    /// High means edge
    ActiveHigh,
    /// Low means edge
    ActiveLow,
}

impl EdgePolarity {
    /// Translates a pin level into "edge imminent"
    pub fn is_edge(self, level_high: bool) -> bool {
        match self {
            EdgePolarity::ActiveHigh => level_high,
            EdgePolarity::ActiveLow => !level_high,
        }
    }
}

/// Per-side motor wiring; `true` flips the direction of that side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorPolarity {
    pub invert_left: bool,
    pub invert_right: bool,
}

/// Complete set of tunables for one robot variant
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RobotConfig {
    /// Targets closer than this are attacked (cm)
    pub attack_range_cm: f32,
    pub evade_duration: Duration,
    pub sidestep_duration: Duration,
    pub recover_duration: Duration,
    pub strike_duration: Duration,
    pub edge_recovery_duration: Duration,
    pub edge_turn_duration: Duration,
    pub loop_period: Duration,
    pub pre_fight_delay: Duration,
    /// Percent of full duty, 1-100
    pub combat_speed: u8,
    pub motor_polarity: MotorPolarity,
    pub edge_polarity: EdgePolarity,
    pub arity: SensorArity,
    pub filter: DistanceFilter,
}

impl RobotConfig {
    /// Two analog IR sensors, edge detectors pull high on no surface
    pub const fn sharp_ir_pair() -> Self {
        Self {
            attack_range_cm: ATTACK_RANGE_CM,
            evade_duration: EVADE_DURATION,
            sidestep_duration: SIDESTEP_DURATION,
            recover_duration: RECOVER_DURATION,
            strike_duration: STRIKE_DURATION,
            edge_recovery_duration: EDGE_RECOVERY_DURATION,
            edge_turn_duration: EDGE_TURN_DURATION,
            loop_period: LOOP_PERIOD,
            pre_fight_delay: PRE_FIGHT_DELAY,
            combat_speed: COMBAT_SPEED,
            motor_polarity: MotorPolarity {
                invert_left: false,
                invert_right: false,
            },
            edge_polarity: EdgePolarity::ActiveHigh,
            arity: SensorArity::Pair,
            filter: DistanceFilter::new(
                SHARP_IR_CALIBRATION,
                SHARP_IR_WINDOW,
                SAMPLE_COUNT,
                INTER_SAMPLE_DELAY,
            ),
        }
    }

    /// One analog IR sensor in the middle, edge detectors pull low on no surface
    pub const fn sharp_ir_single() -> Self {
        let mut config = Self::sharp_ir_pair();
        config.arity = SensorArity::Single;
        config.edge_polarity = EdgePolarity::ActiveLow;
        config
    }

    /// One HC-SR04 in the middle. This chassis has the right motor mounted mirrored.
    pub const fn ultrasonic_single() -> Self {
        let mut config = Self::sharp_ir_pair();
        config.attack_range_cm = ULTRASONIC_ATTACK_RANGE_CM;
        config.arity = SensorArity::Single;
        config.edge_polarity = EdgePolarity::ActiveLow;
        config.motor_polarity = MotorPolarity {
            invert_left: false,
            invert_right: true,
        };
        config.filter = DistanceFilter::new(
            ULTRASONIC_CALIBRATION,
            ULTRASONIC_WINDOW,
            SAMPLE_COUNT,
            INTER_SAMPLE_DELAY,
        );
        config
    }

    /// Two HC-SR04s
    pub const fn ultrasonic_pair() -> Self {
        let mut config = Self::ultrasonic_single();
        config.arity = SensorArity::Pair;
        config
    }

    /// Checks that the configuration describes a robot that can actually fight
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attack_range_cm.is_nan() || self.attack_range_cm <= 0.0 {
            return Err(ConfigError::AttackRange);
        }
        if self.combat_speed == 0 || self.combat_speed > 100 {
            return Err(ConfigError::CombatSpeed(self.combat_speed));
        }
        let zero = Duration::from_ticks(0);
        if self.evade_duration == zero
            || self.strike_duration == zero
            || self.edge_recovery_duration == zero
            || self.edge_turn_duration == zero
        {
            return Err(ConfigError::ZeroDuration);
        }
        // the flank only nets a lateral offset if recovering takes longer than stepping aside
        if self.sidestep_duration == zero || self.sidestep_duration >= self.recover_duration {
            return Err(ConfigError::FlankTiming);
        }
        self.filter.validate()
    }
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self::sharp_ir_pair()
    }
}

/// Reasons a configuration is rejected
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Attack range must be positive
    AttackRange,
    /// Combat speed must be 1-100 percent
    CombatSpeed(u8),
    /// A maneuver duration is zero
    ZeroDuration,
    /// Side step must be non-zero and shorter than recover
    FlankTiming,
    /// Trusted window is empty or negative
    TrustedWindow,
    /// At least one raw sample is needed per reading
    SampleCount,
    /// Analog signal floor must lie above the curve's asymptote
    SignalFloor,
    /// Ultrasonic conversion constants must be positive
    EchoTiming,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::AttackRange => write!(f, "attack range must be positive"),
            ConfigError::CombatSpeed(speed) => {
                write!(f, "combat speed {speed}% is outside 1-100")
            }
            ConfigError::ZeroDuration => write!(f, "maneuver durations must be non-zero"),
            ConfigError::FlankTiming => {
                write!(f, "side step must be non-zero and shorter than recover")
            }
            ConfigError::TrustedWindow => write!(f, "trusted window is empty"),
            ConfigError::SampleCount => write!(f, "sample count must be at least one"),
            ConfigError::SignalFloor => {
                write!(f, "signal floor must lie above the calibration asymptote")
            }
            ConfigError::EchoTiming => write!(f, "echo timing constants must be positive"),
        }
    }
}
