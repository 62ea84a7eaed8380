//! Combat decision engine for an autonomous mini-sumo robot
//!
//! The library holds everything that decides what the robot does: sensor normalization,
//! the attack strategies and the arbitration loop that puts edge safety above all of them.
//! It knows nothing about pins or registers; the firmware binary supplies the sensor driver,
//! the actuator sink and the clock.

#![cfg_attr(not(test), no_std)]

pub(crate) mod fmt;

/// Edge override and strategy delegation
pub mod arbitration;
/// Distance and edge sensor normalization
pub mod sensor;
/// Interchangeable attack behaviors
pub mod strategy;
/// Configuration, shared context, drive commands and timing abstractions
pub mod system;

pub use arbitration::{CombatEngine, CycleOutcome};
pub use sensor::distance::{Distance, DistanceReadings, Side};
pub use sensor::edge::EdgeState;
pub use strategy::StrategyId;
pub use system::config::RobotConfig;
pub use system::drive_command::DriveCommand;
pub use system::state::CombatContext;
