//! Robot firmware entry point
//!
//! Initializes the hardware and spawns the combat tasks. Holding the mode button while
//! powering up runs the motor self test instead of a fight.

#![no_std]
#![no_main]

use crate::task::{
    combat::{combat_loop, self_test, start_sequence},
    drive::drive,
    mode_select::mode_select,
    resources::{
        self, AssignedResources, EdgeSensorResources, IrSensorResources, ModeButtonResources,
        MotorDriverResources, UltrasonicSensorResources,
    },
    sensors::{EdgeInputs, Sensors},
};
use defmt::{error, info};
use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::gpio::{Input, Pull};
use sumo_bot::RobotConfig;
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Robot variant this image is built for
#[cfg(not(feature = "ultrasonic"))]
const ROBOT: RobotConfig = RobotConfig::sharp_ir_pair();
#[cfg(feature = "ultrasonic")]
const ROBOT: RobotConfig = RobotConfig::ultrasonic_pair();

/// Task implementations
mod task;

/// Firmware entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // before any task that samples the IR sensors is spawned
    resources::init_adc(p.ADC);

    let r = split_resources!(p);

    let config = match ROBOT.validate() {
        Ok(()) => ROBOT,
        Err(e) => {
            error!("invalid robot configuration ({}), using defaults", e);
            RobotConfig::default()
        }
    };

    let button = Input::new(r.mode_button.button_pin, Pull::Down);
    let self_test_requested = button.is_high();

    spawner.must_spawn(drive(r.motor_driver, config));

    if self_test_requested {
        info!("mode button held at power-up, running motor self test");
        spawner.must_spawn(self_test(config));
        return;
    }

    let edges = EdgeInputs::new(r.edge_sensors);
    #[cfg(not(feature = "ultrasonic"))]
    let sensors = Sensors::new(r.ir_sensors, edges);
    #[cfg(feature = "ultrasonic")]
    let sensors = Sensors::new(r.ultrasonic_sensors, edges);

    spawner.must_spawn(mode_select(button));
    spawner.must_spawn(start_sequence(config));
    spawner.must_spawn(combat_loop(config, sensors));
}
