//! Hardware Resource Management
//!
//! Assigns the RP2350's pins and peripherals to the tasks that own them.
//!
//! # Resource Groups
//! - Sharp IR sensors: analog pins, read through the shared ADC
//! - Ultrasonic sensors: HC-SR04 trigger/echo pins
//! - Edge sensors: two digital inputs, front and back
//! - Mode button: strategy selection before the fight
//! - Motor driver: TB6612FNG direction pins, standby and PWM channels
//!
//! # Shared Resources
//! The ADC sits behind a mutex. The distance sensors are its only user today, but the lock
//! keeps it usable from more than one task later.

use assign_resources::assign_resources;
use embassy_rp::adc::InterruptHandler as AdcInterruptHandler;
use embassy_rp::adc::{Adc, Async as AdcAsync};
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, ADC};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

/// Global ADC instance protected by a mutex
static SHARED_ADC: Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> =
    Mutex::new(None);

/// Initializes the ADC peripheral.
///
/// Called once from main.rs before any task is spawned.
pub fn init_adc(adc: ADC) {
    let adc = Adc::new(adc, Irqs, embassy_rp::adc::Config::default());
    critical_section::with(|_| {
        *SHARED_ADC.try_lock().unwrap() = Some(adc);
    });
}

/// Returns the protected ADC instance. Hold the lock only for a single conversion.
pub fn get_adc() -> &'static Mutex<CriticalSectionRawMutex, Option<Adc<'static, AdcAsync>>> {
    &SHARED_ADC
}

assign_resources! {
    /// Sharp GP2Y0A21 analog distance sensors
    ir_sensors: IrSensorResources {
        left_pin: PIN_26,
        right_pin: PIN_27,
        center_pin: PIN_28,
    },
    /// HC-SR04 ultrasonic distance sensors
    ultrasonic_sensors: UltrasonicSensorResources {
        left_trigger_pin: PIN_15,
        left_echo_pin: PIN_14,
        right_trigger_pin: PIN_13,
        right_echo_pin: PIN_12,
    },
    /// Edge detectors under the front and back of the chassis
    edge_sensors: EdgeSensorResources {
        front_pin: PIN_10,
        back_pin: PIN_11,
    },
    /// Strategy selection button
    mode_button: ModeButtonResources {
        button_pin: PIN_16,
    },
    /// TB6612FNG dual motor driver pins and PWM channels
    motor_driver: MotorDriverResources {
        standby_pin: PIN_22,
        left_slice: PWM_SLICE1,
        left_pwm_pin: PIN_2,
        left_forward_pin: PIN_21,
        left_backward_pin: PIN_20,
        right_slice: PWM_SLICE2,
        right_pwm_pin: PIN_5,
        right_forward_pin: PIN_19,
        right_backward_pin: PIN_18,
    },
}

bind_interrupts!(pub struct Irqs {
    ADC_IRQ_FIFO => AdcInterruptHandler;
});
