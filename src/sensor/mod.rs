//! Sensor normalization
//!
//! The core never touches hardware. It asks a [`SensorDriver`] for raw samples and digital
//! levels and turns them into calibrated distances and edge flags.

pub mod distance;
pub mod edge;

/// Distance sensor channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DistanceChannel {
    /// Single center-mounted sensor
    Center,
    Left,
    Right,
}

/// Edge detector inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgePin {
    Front,
    Back,
}

/// Hardware-level read failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Conversion or echo did not complete in time
    Timeout,
    /// Peripheral reported an error
    ReadFailed,
}

/// Raw access to the robot's sensors
///
/// Implementations must bound every call: a disconnected sensor has to return
/// [`DriverError::Timeout`] instead of stalling the control loop.
#[allow(async_fn_in_trait)]
pub trait SensorDriver {
    /// One raw sample: ADC counts (10-bit scale) for analog IR, echo time in microseconds
    /// for ultrasonic
    async fn sample_raw(&mut self, channel: DistanceChannel) -> Result<u16, DriverError>;

    /// Current level of an edge detector pin, `true` for high
    fn read_digital(&mut self, pin: EdgePin) -> bool;
}
