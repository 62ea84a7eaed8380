//! Combat tasks
//!
//! - `start_sequence`: waits out the pre-fight delay, then releases the motors
//! - `combat_loop`: runs the decision engine on the real sensors
//! - `self_test`: bench pattern for checking motor wiring, instead of combat

use defmt::info;
use embassy_time::{Delay, Instant, Timer};
use sumo_bot::system::clock::Clock;
use sumo_bot::system::drive_command::{self, AuthorizedActuator, SignalActuator};
use sumo_bot::system::self_test::MotorSelfTest;
use sumo_bot::{CombatContext, CombatEngine, RobotConfig, StrategyId};

use crate::task::sensors::Sensors;

/// Authorization and strategy selection, shared by all tasks
pub static COMBAT: CombatContext = CombatContext::new(StrategyId::Direct);

/// Embassy's monotonic time driver
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[embassy_executor::task]
pub async fn start_sequence(config: RobotConfig) {
    info!(
        "fight starts in {} ms, press the mode button to pick a strategy",
        config.pre_fight_delay.as_millis()
    );
    Timer::after(config.pre_fight_delay).await;
    COMBAT.authorize();
}

#[embassy_executor::task]
pub async fn combat_loop(config: RobotConfig, sensors: Sensors) {
    let actuator = AuthorizedActuator::new(SignalActuator, &COMBAT.authorization);
    let mut engine = CombatEngine::new(config, sensors, actuator, SystemClock, Delay);
    engine.run(&COMBAT).await
}

#[embassy_executor::task]
pub async fn self_test(config: RobotConfig) {
    info!("motor self test, period {} ms", MotorSelfTest::period().as_millis());
    // hands off the robot before anything moves, same as a fight
    Timer::after(config.pre_fight_delay).await;
    let test = MotorSelfTest::new(Instant::now());
    loop {
        let now = Instant::now();
        drive_command::update(test.command_at(now));
        Timer::after(test.remaining_at(now)).await;
    }
}
