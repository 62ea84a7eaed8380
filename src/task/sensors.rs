//! Sensor drivers
//!
//! Hardware side of `SensorDriver`: raw distance samples and edge pin levels.
//!
//! # Sharp IR
//! - Read through the shared ADC, one conversion per sample
//! - The RP2350 ADC is 12 bit; samples are scaled down to the 10-bit range the calibration
//!   curve was measured on
//!
//! # HC-SR04
//! - 10µs trigger pulse, then the echo pulse width is the round trip time in µs
//! - No echo start at all means the sensor is not answering: the sample fails
//! - An echo that never ends within the timeout is a failed sample too
//!
//! Every wait is bounded so a disconnected sensor cannot stall the control loop.

use defmt::trace;
use embassy_rp::gpio::Input;
use embassy_time::{with_timeout, Duration};
use sumo_bot::sensor::{DistanceChannel, DriverError, EdgePin, SensorDriver};

use crate::task::resources::EdgeSensorResources;

/// Edge detectors, shared by both sensor variants
pub struct EdgeInputs {
    front: Input<'static>,
    back: Input<'static>,
}

impl EdgeInputs {
    pub fn new(r: EdgeSensorResources) -> Self {
        // detectors drive the line both ways, no pull needed
        Self {
            front: Input::new(r.front_pin, embassy_rp::gpio::Pull::None),
            back: Input::new(r.back_pin, embassy_rp::gpio::Pull::None),
        }
    }

    fn level(&self, pin: EdgePin) -> bool {
        match pin {
            EdgePin::Front => self.front.is_high(),
            EdgePin::Back => self.back.is_high(),
        }
    }
}

#[cfg(not(feature = "ultrasonic"))]
pub use ir::IrSensors as Sensors;
#[cfg(feature = "ultrasonic")]
pub use ultrasonic::UltrasonicSensors as Sensors;

#[cfg(not(feature = "ultrasonic"))]
mod ir {
    use embassy_rp::adc::Channel;
    use embassy_rp::gpio::Pull;

    use super::*;
    use crate::task::resources::{get_adc, IrSensorResources};

    /// A single ADC conversion takes 2µs; anything near this is a hung peripheral
    const ADC_TIMEOUT: Duration = Duration::from_millis(1);

    pub struct IrSensors {
        left: Channel<'static>,
        right: Channel<'static>,
        center: Channel<'static>,
        edges: EdgeInputs,
    }

    impl IrSensors {
        pub fn new(r: IrSensorResources, edges: EdgeInputs) -> Self {
            Self {
                left: Channel::new_pin(r.left_pin, Pull::None),
                right: Channel::new_pin(r.right_pin, Pull::None),
                center: Channel::new_pin(r.center_pin, Pull::None),
                edges,
            }
        }
    }

    impl SensorDriver for IrSensors {
        async fn sample_raw(&mut self, channel: DistanceChannel) -> Result<u16, DriverError> {
            let pin = match channel {
                DistanceChannel::Left => &mut self.left,
                DistanceChannel::Right => &mut self.right,
                DistanceChannel::Center => &mut self.center,
            };
            let mut adc_guard = get_adc().lock().await;
            let adc = adc_guard.as_mut().ok_or(DriverError::ReadFailed)?;
            match with_timeout(ADC_TIMEOUT, adc.read(pin)).await {
                Ok(Ok(raw)) => Ok(raw >> 2),
                Ok(Err(e)) => {
                    trace!("adc error on {}: {}", channel, e);
                    Err(DriverError::ReadFailed)
                }
                Err(_) => Err(DriverError::Timeout),
            }
        }

        fn read_digital(&mut self, pin: EdgePin) -> bool {
            self.edges.level(pin)
        }
    }
}

#[cfg(feature = "ultrasonic")]
mod ultrasonic {
    use embassy_rp::gpio::{Level, Output, Pull};
    use embassy_time::{Instant, Timer};
    use sumo_bot::system::config::ECHO_TIMEOUT_US;

    use super::*;
    use crate::task::resources::UltrasonicSensorResources;

    /// The sensor starts its echo within a few hundred µs of the trigger
    const ECHO_START_TIMEOUT: Duration = Duration::from_millis(2);

    struct EchoSensor {
        trigger: Output<'static>,
        echo: Input<'static>,
    }

    impl EchoSensor {
        async fn measure(&mut self) -> Result<u16, DriverError> {
            self.trigger.set_high();
            Timer::after_micros(10).await;
            self.trigger.set_low();

            with_timeout(ECHO_START_TIMEOUT, self.echo.wait_for_high())
                .await
                .map_err(|_| DriverError::Timeout)?;
            let start = Instant::now();
            let limit = Duration::from_micros(u64::from(ECHO_TIMEOUT_US));
            match with_timeout(limit, self.echo.wait_for_low()).await {
                Ok(()) => Ok(u16::try_from(start.elapsed().as_micros()).unwrap_or(u16::MAX)),
                Err(_) => Err(DriverError::Timeout),
            }
        }
    }

    pub struct UltrasonicSensors {
        left: EchoSensor,
        right: EchoSensor,
        edges: EdgeInputs,
    }

    impl UltrasonicSensors {
        pub fn new(r: UltrasonicSensorResources, edges: EdgeInputs) -> Self {
            Self {
                left: EchoSensor {
                    trigger: Output::new(r.left_trigger_pin, Level::Low),
                    echo: Input::new(r.left_echo_pin, Pull::None),
                },
                right: EchoSensor {
                    trigger: Output::new(r.right_trigger_pin, Level::Low),
                    echo: Input::new(r.right_echo_pin, Pull::None),
                },
                edges,
            }
        }
    }

    impl SensorDriver for UltrasonicSensors {
        async fn sample_raw(&mut self, channel: DistanceChannel) -> Result<u16, DriverError> {
            // a single sensor is wired to the left pins
            match channel {
                DistanceChannel::Left | DistanceChannel::Center => self.left.measure().await,
                DistanceChannel::Right => self.right.measure().await,
            }
        }

        fn read_digital(&mut self, pin: EdgePin) -> bool {
            self.edges.level(pin)
        }
    }
}
