//! Drive Command Module
//!
//! The decision engine's only output is a [`DriveCommand`]. This module defines the command,
//! how it maps onto the two motors, the sink the engine hands commands to, and the signal
//! that carries commands over to the motor task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::system::config::{MotorPolarity, RobotConfig};
use crate::system::state::CombatAuthorization;

/// Signal for drive commands
///
/// Latest command wins: if the motor task has not picked up a command yet, a newer one
/// replaces it.
pub static DRIVE: Signal<CriticalSectionRawMutex, DriveCommand> = Signal::new();

/// Sends a new drive command to the motor task
pub fn update(command: DriveCommand) {
    DRIVE.signal(command);
}

/// Waits for the next drive command
pub async fn wait() -> DriveCommand {
    DRIVE.wait().await
}

/// Movement the robot can be told to make, always at the configured combat speed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveCommand {
    Forward,
    Backward,
    /// Turn in place, counter-clockwise
    TurnLeft,
    /// Turn in place, clockwise
    TurnRight,
    Stop,
}

/// Signed speed per side in percent, positive is forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorOutput {
    pub left: i8,
    pub right: i8,
}

impl DriveCommand {
    /// Motor speeds for this command at `speed` percent, before wiring polarity
    pub fn motor_speeds(self, speed: u8) -> MotorOutput {
        let s = speed.min(100) as i8;
        let (left, right) = match self {
            DriveCommand::Forward => (s, s),
            DriveCommand::Backward => (-s, -s),
            DriveCommand::TurnLeft => (-s, s),
            DriveCommand::TurnRight => (s, -s),
            DriveCommand::Stop => (0, 0),
        };
        MotorOutput { left, right }
    }

    /// Motor speeds as they have to be applied to this robot's wiring
    pub fn motor_output(self, config: &RobotConfig) -> MotorOutput {
        self.motor_speeds(config.combat_speed)
            .with_polarity(config.motor_polarity)
    }
}

impl MotorOutput {
    pub fn with_polarity(self, polarity: MotorPolarity) -> Self {
        Self {
            left: if polarity.invert_left { -self.left } else { self.left },
            right: if polarity.invert_right { -self.right } else { self.right },
        }
    }
}

/// Anything that accepts drive commands
pub trait ActuatorSink {
    fn drive(&mut self, command: DriveCommand);
}

impl<A: ActuatorSink + ?Sized> ActuatorSink for &mut A {
    fn drive(&mut self, command: DriveCommand) {
        (**self).drive(command)
    }
}

/// Forwards commands to the motor task through [`DRIVE`]
#[derive(Debug, Default)]
pub struct SignalActuator;

impl ActuatorSink for SignalActuator {
    fn drive(&mut self, command: DriveCommand) {
        update(command);
    }
}

/// Hard gate in front of an actuator: until combat is authorized every command becomes
/// [`DriveCommand::Stop`]
pub struct AuthorizedActuator<'a, A> {
    inner: A,
    authorization: &'a CombatAuthorization,
    last: Option<DriveCommand>,
}

impl<'a, A: ActuatorSink> AuthorizedActuator<'a, A> {
    pub fn new(inner: A, authorization: &'a CombatAuthorization) -> Self {
        Self {
            inner,
            authorization,
            last: None,
        }
    }

    /// Last command actually passed on
    pub fn last(&self) -> Option<DriveCommand> {
        self.last
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: ActuatorSink> ActuatorSink for AuthorizedActuator<'_, A> {
    fn drive(&mut self, command: DriveCommand) {
        let command = if self.authorization.is_authorized() {
            command
        } else {
            DriveCommand::Stop
        };
        if self.last != Some(command) {
            info!("motors: {:?}", command);
        }
        self.last = Some(command);
        self.inner.drive(command);
    }
}
