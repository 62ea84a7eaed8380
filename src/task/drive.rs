//! Drive Task Module
//!
//! Applies drive commands to the two motors through a TB6612FNG driver. Every command is
//! turned into a signed speed per side by [`DriveCommand::motor_output`], which also takes
//! care of mirrored motors, so this task only moves duty cycles and direction pins.

use defmt::{error, info};
use embassy_rp::gpio;
use embassy_rp::pwm;
use embassy_time::{Duration, Timer};
use sumo_bot::system::drive_command::{self, DriveCommand};
use sumo_bot::RobotConfig;
use tb6612fng::{Motor, Tb6612fng};

use crate::task::resources::MotorDriverResources;

/// Time the driver needs after leaving standby before it follows the inputs
const WAKE_UP_DELAY: Duration = Duration::from_millis(100);

/// Signed speed to a single motor command
fn motor_command(speed: i8) -> tb6612fng::DriveCommand {
    match speed {
        s if s > 0 => tb6612fng::DriveCommand::Forward(s.unsigned_abs()),
        s if s < 0 => tb6612fng::DriveCommand::Backward(s.unsigned_abs()),
        _ => tb6612fng::DriveCommand::Stop,
    }
}

#[embassy_executor::task]
pub async fn drive(r: MotorDriverResources, config: RobotConfig) {
    // 10kHz PWM, cheap DC motors behave better at lower frequencies
    let desired_freq_hz = 10_000;
    let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();

    // smallest divider that keeps the period within 16 bits
    let divider = ((clock_freq_hz / desired_freq_hz) / 65535 + 1) as u8;
    let period = (clock_freq_hz / (desired_freq_hz * divider as u32)) as u16 - 1;

    let mut pwm_config = pwm::Config::default();
    pwm_config.divider = divider.into();
    pwm_config.top = period;

    let stby = gpio::Output::new(r.standby_pin, gpio::Level::Low);

    // motor A is the left motor
    let left_fwd = gpio::Output::new(r.left_forward_pin, gpio::Level::Low);
    let left_bckw = gpio::Output::new(r.left_backward_pin, gpio::Level::Low);
    let left_pwm = pwm::Pwm::new_output_a(r.left_slice, r.left_pwm_pin, pwm_config.clone());

    // motor B is the right motor
    let right_fwd = gpio::Output::new(r.right_forward_pin, gpio::Level::Low);
    let right_bckw = gpio::Output::new(r.right_backward_pin, gpio::Level::Low);
    let right_pwm = pwm::Pwm::new_output_b(r.right_slice, r.right_pwm_pin, pwm_config);

    let (Ok(left_motor), Ok(right_motor)) = (
        Motor::new(left_fwd, left_bckw, left_pwm),
        Motor::new(right_fwd, right_bckw, right_pwm),
    ) else {
        error!("motor setup failed, drive task not running");
        return;
    };
    let Ok(mut control) = Tb6612fng::new(left_motor, right_motor, stby) else {
        error!("motor driver setup failed, drive task not running");
        return;
    };

    loop {
        let command = drive_command::wait().await;
        let output = command.motor_output(&config);

        // wake up from standby once there is something to move
        if command != DriveCommand::Stop && control.current_standby().unwrap_or(false) {
            if control.disable_standby().is_err() {
                error!("could not leave standby");
                continue;
            }
            Timer::after(WAKE_UP_DELAY).await;
        }

        info!("drive {} L:{} R:{}", command, output.left, output.right);
        let left = control.motor_a.drive(motor_command(output.left));
        let right = control.motor_b.drive(motor_command(output.right));
        if left.is_err() || right.is_err() {
            error!("motor driver rejected {}", command);
        }
    }
}
