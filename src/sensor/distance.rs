//! Distance Sensor Filter
//!
//! Turns raw samples into a calibrated distance or [`Distance::Invalid`].
//!
//! # Signal Processing
//! - Takes a small burst of raw samples with a short pause in between
//! - Failed samples are discarded, the rest are averaged
//! - The mean goes through the sensor's calibration curve
//!
//! # Rejection
//! Both sensor types are unreliable very close and very far away. Anything that does not
//! end up inside the trusted window becomes `Invalid`, so the strategies never chase
//! sensor artifacts:
//! - no sample succeeded
//! - analog mean below the signal floor, or ultrasonic echo at or past the timeout
//! - calibrated distance outside the trusted window

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use crate::sensor::{DistanceChannel, SensorDriver};
use crate::system::config::{ConfigError, SensorArity};
use crate::system::drive_command::DriveCommand;

/// Calibrated distance reading
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Distance {
    /// Target inside the trusted window, in centimeters
    Valid(f32),
    /// No target in the trusted range
    Invalid,
}

impl Distance {
    /// Centimeters, if valid
    pub fn cm(self) -> Option<f32> {
        match self {
            Distance::Valid(cm) => Some(cm),
            Distance::Invalid => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Distance::Valid(_))
    }

    /// `Invalid` counts as infinitely far: any valid reading is closer than it.
    pub fn is_closer_than(self, other: Distance) -> bool {
        match (self, other) {
            (Distance::Valid(a), Distance::Valid(b)) => a < b,
            (Distance::Valid(_), Distance::Invalid) => true,
            (Distance::Invalid, _) => false,
        }
    }

    /// Valid and strictly closer than `range_cm`
    pub fn is_within(self, range_cm: f32) -> bool {
        matches!(self, Distance::Valid(cm) if cm < range_cm)
    }
}

/// Side of the robot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Turn in place toward this side
    pub fn turn_toward(self) -> DriveCommand {
        match self {
            Side::Left => DriveCommand::TurnLeft,
            Side::Right => DriveCommand::TurnRight,
        }
    }

    /// Turn in place away from this side
    pub fn turn_away(self) -> DriveCommand {
        self.opposite().turn_toward()
    }
}

/// The distance readings of one control cycle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DistanceReadings {
    /// Center sensor, seen by the strategies as left == right
    Single(Distance),
    Pair { left: Distance, right: Distance },
}

impl DistanceReadings {
    pub fn left(&self) -> Distance {
        match *self {
            DistanceReadings::Single(d) => d,
            DistanceReadings::Pair { left, .. } => left,
        }
    }

    pub fn right(&self) -> Distance {
        match *self {
            DistanceReadings::Single(d) => d,
            DistanceReadings::Pair { right, .. } => right,
        }
    }

    /// Closest valid reading and the side it was seen on.
    ///
    /// Equal readings resolve to the left side. This is a fixed rule, so a center sensor
    /// (left == right) always reports its target on the left.
    pub fn closest(&self) -> Option<(Side, f32)> {
        let (left, right) = (self.left(), self.right());
        if right.is_closer_than(left) {
            right.cm().map(|cm| (Side::Right, cm))
        } else {
            left.cm().map(|cm| (Side::Left, cm))
        }
    }

    /// Closest reading if it is inside the attack range
    pub fn target_within(&self, range_cm: f32) -> Option<Side> {
        self.closest()
            .filter(|&(_, cm)| cm < range_cm)
            .map(|(side, _)| side)
    }
}

/// Calibrated `[min_cm, max_cm]` range, bounds included
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrustedWindow {
    pub min_cm: f32,
    pub max_cm: f32,
}

impl TrustedWindow {
    pub const fn new(min_cm: f32, max_cm: f32) -> Self {
        Self { min_cm, max_cm }
    }

    pub fn contains(&self, cm: f32) -> bool {
        cm >= self.min_cm && cm <= self.max_cm
    }
}

/// Conversion from averaged raw samples to centimeters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Calibration {
    /// Inverse-proportional analog curve `cm = a / (raw - b) - c`.
    /// Means below `signal_floor` fall into the ambiguous region near zero.
    SharpIr {
        a: f32,
        b: f32,
        c: f32,
        signal_floor: u16,
    },
    /// Round trip echo time in microseconds: `cm = echo * sound_speed / 2`
    Ultrasonic {
        sound_speed_cm_per_us: f32,
        echo_timeout_us: u16,
    },
}

impl Calibration {
    /// Applies the curve to a raw mean, without the trusted window check
    pub fn to_cm(&self, mean: f32) -> Result<f32, Rejection> {
        match *self {
            Calibration::SharpIr {
                a,
                b,
                c,
                signal_floor,
            } => {
                if mean < f32::from(signal_floor) {
                    return Err(Rejection::BelowSignalFloor);
                }
                Ok(a / (mean - b) - c)
            }
            Calibration::Ultrasonic {
                sound_speed_cm_per_us,
                echo_timeout_us,
            } => {
                if mean >= f32::from(echo_timeout_us) {
                    return Err(Rejection::SensorTimeout);
                }
                Ok(mean * sound_speed_cm_per_us / 2.0)
            }
        }
    }

    /// Checks a single raw sample before it goes into the mean. A timed-out echo must never
    /// be averaged with real ones.
    pub fn check_sample(&self, raw: u16) -> Result<u16, Rejection> {
        match *self {
            Calibration::Ultrasonic {
                echo_timeout_us, ..
            } if raw >= echo_timeout_us => Err(Rejection::SensorTimeout),
            _ => Ok(raw),
        }
    }
}

/// Why a reading was turned into [`Distance::Invalid`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Every raw sample failed
    NoSamples,
    /// Echo never came back
    SensorTimeout,
    /// Analog signal too weak to be told apart from noise
    BelowSignalFloor,
    /// Calibrated value outside the trusted window
    SensorOutOfRange,
}

/// Burst-average filter for one kind of distance sensor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceFilter {
    pub calibration: Calibration,
    pub window: TrustedWindow,
    /// Raw samples per reading
    pub sample_count: u8,
    pub inter_sample_delay: Duration,
}

impl DistanceFilter {
    pub const fn new(
        calibration: Calibration,
        window: TrustedWindow,
        sample_count: u8,
        inter_sample_delay: Duration,
    ) -> Self {
        Self {
            calibration,
            window,
            sample_count,
            inter_sample_delay,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_count == 0 {
            return Err(ConfigError::SampleCount);
        }
        if self.window.min_cm.is_nan()
            || self.window.max_cm.is_nan()
            || self.window.min_cm < 0.0
            || self.window.min_cm >= self.window.max_cm
        {
            return Err(ConfigError::TrustedWindow);
        }
        match self.calibration {
            Calibration::SharpIr { b, signal_floor, .. } => {
                if f32::from(signal_floor) <= b {
                    return Err(ConfigError::SignalFloor);
                }
            }
            Calibration::Ultrasonic {
                sound_speed_cm_per_us,
                echo_timeout_us,
            } => {
                if sound_speed_cm_per_us <= 0.0 || echo_timeout_us == 0 {
                    return Err(ConfigError::EchoTiming);
                }
            }
        }
        Ok(())
    }

    /// Calibrates a raw mean and checks it against the trusted window
    pub fn calibrate(&self, mean: f32) -> Result<f32, Rejection> {
        let cm = self.calibration.to_cm(mean)?;
        if self.window.contains(cm) {
            Ok(cm)
        } else {
            Err(Rejection::SensorOutOfRange)
        }
    }

    /// Reads one channel: sample burst, mean, curve, window
    pub async fn read_distance<S, D>(
        &self,
        driver: &mut S,
        delay: &mut D,
        channel: DistanceChannel,
    ) -> Distance
    where
        S: SensorDriver,
        D: DelayNs,
    {
        let pause_us = u32::try_from(self.inter_sample_delay.as_micros()).unwrap_or(u32::MAX);
        let mut sum: u32 = 0;
        let mut good: u32 = 0;

        for n in 0..self.sample_count {
            if n > 0 && pause_us > 0 {
                delay.delay_us(pause_us).await;
            }
            match driver.sample_raw(channel).await {
                Ok(raw) => match self.calibration.check_sample(raw) {
                    Ok(raw) => {
                        sum += u32::from(raw);
                        good += 1;
                    }
                    Err(rejection) => trace!("{:?}: sample discarded: {:?}", channel, rejection),
                },
                Err(e) => trace!("{:?}: sample discarded: {:?}", channel, e),
            }
        }

        let result = if good == 0 {
            Err(Rejection::NoSamples)
        } else {
            self.calibrate(sum as f32 / good as f32)
        };

        match result {
            Ok(cm) => Distance::Valid(cm),
            Err(rejection) => {
                trace!("{:?}: reading rejected: {:?}", channel, rejection);
                Distance::Invalid
            }
        }
    }

    /// Reads every mounted distance sensor, left before right
    pub async fn read_readings<S, D>(
        &self,
        arity: SensorArity,
        driver: &mut S,
        delay: &mut D,
    ) -> DistanceReadings
    where
        S: SensorDriver,
        D: DelayNs,
    {
        match arity {
            SensorArity::Single => DistanceReadings::Single(
                self.read_distance(driver, delay, DistanceChannel::Center)
                    .await,
            ),
            SensorArity::Pair => {
                let left = self.read_distance(driver, delay, DistanceChannel::Left).await;
                let right = self
                    .read_distance(driver, delay, DistanceChannel::Right)
                    .await;
                DistanceReadings::Pair { left, right }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{DriverError, EdgePin};
    use crate::system::config::{SHARP_IR_CALIBRATION, SHARP_IR_WINDOW};
    use embassy_futures::block_on;
    use std::collections::VecDeque;

    struct Scripted {
        samples: VecDeque<Result<u16, DriverError>>,
        calls: usize,
    }

    impl Scripted {
        fn new(samples: &[Result<u16, DriverError>]) -> Self {
            Self {
                samples: samples.iter().copied().collect(),
                calls: 0,
            }
        }
    }

    impl SensorDriver for Scripted {
        async fn sample_raw(&mut self, _channel: DistanceChannel) -> Result<u16, DriverError> {
            self.calls += 1;
            self.samples.pop_front().unwrap_or(Err(DriverError::Timeout))
        }

        fn read_digital(&mut self, _pin: EdgePin) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        total_us: u64,
        pauses: usize,
    }

    impl DelayNs for CountingDelay {
        async fn delay_ns(&mut self, ns: u32) {
            self.total_us += u64::from(ns) / 1_000;
            self.pauses += 1;
        }
    }

    fn sharp_filter() -> DistanceFilter {
        DistanceFilter::new(
            SHARP_IR_CALIBRATION,
            SHARP_IR_WINDOW,
            5,
            Duration::from_micros(500),
        )
    }

    #[test]
    fn averages_successful_samples_through_sharp_curve() {
        let filter = sharp_filter();
        let mut driver = Scripted::new(&[Ok(300), Ok(310), Ok(320), Ok(290), Ok(280)]);
        let mut delay = CountingDelay::default();
        let d = block_on(filter.read_distance(&mut driver, &mut delay, DistanceChannel::Left));
        let expected = 6762.0 / (300.0 - 9.0) - 4.0;
        match d {
            Distance::Valid(cm) => assert!((cm - expected).abs() < 1e-3),
            Distance::Invalid => panic!("expected a valid reading"),
        }
        assert_eq!(driver.calls, 5);
        // pauses only between samples
        assert_eq!(delay.pauses, 4);
        assert_eq!(delay.total_us, 2_000);
    }

    #[test]
    fn failed_samples_are_dropped_from_the_mean() {
        let filter = sharp_filter();
        let mut driver = Scripted::new(&[
            Err(DriverError::ReadFailed),
            Ok(300),
            Err(DriverError::Timeout),
            Ok(300),
            Ok(300),
        ]);
        let d = block_on(filter.read_distance(
            &mut driver,
            &mut CountingDelay::default(),
            DistanceChannel::Center,
        ));
        let expected = 6762.0 / 291.0 - 4.0;
        assert!((d.cm().unwrap() - expected).abs() < 1e-3);
    }

    #[test]
    fn no_successful_sample_is_invalid() {
        let filter = sharp_filter();
        let mut driver = Scripted::new(&[Err(DriverError::ReadFailed); 5]);
        let d = block_on(filter.read_distance(
            &mut driver,
            &mut CountingDelay::default(),
            DistanceChannel::Right,
        ));
        assert_eq!(d, Distance::Invalid);
    }

    #[test]
    fn weak_analog_signal_is_rejected() {
        let filter = sharp_filter();
        assert_eq!(filter.calibrate(50.0), Err(Rejection::BelowSignalFloor));
        // a hair above the asymptote would extrapolate to kilometers
        assert_eq!(filter.calibrate(10.0), Err(Rejection::BelowSignalFloor));
    }

    #[test]
    fn readings_outside_window_are_rejected() {
        let filter = sharp_filter();
        // 6762 / (700 - 9) - 4 = 5.8cm, too close to trust
        assert_eq!(filter.calibrate(700.0), Err(Rejection::SensorOutOfRange));
        // 6762 / (85 - 9) - 4 = 85cm, too far to trust
        assert_eq!(filter.calibrate(85.0), Err(Rejection::SensorOutOfRange));
    }

    #[test]
    fn ultrasonic_echo_converts_and_times_out() {
        let filter = DistanceFilter::new(
            Calibration::Ultrasonic {
                sound_speed_cm_per_us: 0.0344,
                echo_timeout_us: 25_000,
            },
            TrustedWindow::new(3.0, 150.0),
            3,
            Duration::from_micros(0),
        );
        let cm = filter.calibrate(1_000.0).unwrap();
        assert!((cm - 17.2).abs() < 1e-3);
        assert_eq!(filter.calibrate(25_000.0), Err(Rejection::SensorTimeout));
        assert_eq!(filter.calibrate(10_000.0), Err(Rejection::SensorOutOfRange));
    }

    #[test]
    fn lost_echo_is_left_out_of_the_mean() {
        let filter = DistanceFilter::new(
            Calibration::Ultrasonic {
                sound_speed_cm_per_us: 0.0344,
                echo_timeout_us: 25_000,
            },
            TrustedWindow::new(3.0, 150.0),
            5,
            Duration::from_micros(500),
        );
        let mut driver = Scripted::new(&[Ok(580), Ok(580), Ok(25_000), Ok(580), Ok(580)]);
        let d = block_on(filter.read_distance(
            &mut driver,
            &mut CountingDelay::default(),
            DistanceChannel::Center,
        ));
        // 580us round trip is a target at about 10cm
        let cm = d.cm().expect("four good echoes make a valid reading");
        assert!((cm - 580.0 * 0.0344 / 2.0).abs() < 1e-3);
        assert_eq!(driver.calls, 5);
    }

    #[test]
    fn burst_of_lost_echoes_is_invalid() {
        let filter = DistanceFilter::new(
            Calibration::Ultrasonic {
                sound_speed_cm_per_us: 0.0344,
                echo_timeout_us: 25_000,
            },
            TrustedWindow::new(3.0, 150.0),
            3,
            Duration::from_micros(0),
        );
        let mut driver = Scripted::new(&[Ok(25_000), Ok(u16::MAX), Ok(30_000)]);
        let d = block_on(filter.read_distance(
            &mut driver,
            &mut CountingDelay::default(),
            DistanceChannel::Left,
        ));
        assert_eq!(d, Distance::Invalid);
    }

    #[test]
    fn analog_samples_are_never_dropped_for_size() {
        assert_eq!(SHARP_IR_CALIBRATION.check_sample(u16::MAX), Ok(u16::MAX));
    }

    #[test]
    fn invalid_loses_every_closeness_comparison() {
        assert!(Distance::Valid(79.0).is_closer_than(Distance::Invalid));
        assert!(!Distance::Invalid.is_closer_than(Distance::Valid(79.0)));
        assert!(!Distance::Invalid.is_closer_than(Distance::Invalid));
        assert!(!Distance::Invalid.is_within(1_000.0));
    }

    #[test]
    fn closest_breaks_ties_to_the_left() {
        let tie = DistanceReadings::Pair {
            left: Distance::Valid(20.0),
            right: Distance::Valid(20.0),
        };
        assert_eq!(tie.closest(), Some((Side::Left, 20.0)));

        let right = DistanceReadings::Pair {
            left: Distance::Invalid,
            right: Distance::Valid(30.0),
        };
        assert_eq!(right.closest(), Some((Side::Right, 30.0)));

        let center = DistanceReadings::Single(Distance::Valid(12.0));
        assert_eq!(center.closest(), Some((Side::Left, 12.0)));
        assert_eq!(DistanceReadings::Single(Distance::Invalid).closest(), None);
    }

    #[test]
    fn single_sensor_reads_center_channel_only() {
        struct CenterOnly;
        impl SensorDriver for CenterOnly {
            async fn sample_raw(&mut self, channel: DistanceChannel) -> Result<u16, DriverError> {
                assert_eq!(channel, DistanceChannel::Center);
                Ok(300)
            }
            fn read_digital(&mut self, _pin: EdgePin) -> bool {
                false
            }
        }
        let readings = block_on(sharp_filter().read_readings(
            SensorArity::Single,
            &mut CenterOnly,
            &mut CountingDelay::default(),
        ));
        assert!(matches!(readings, DistanceReadings::Single(Distance::Valid(_))));
    }
}
