//! Edge Sensor Reader
//!
//! Two digital edge detectors, front and back. They are de-glitched in hardware, so no
//! filtering happens here. A glitch that does get through is taken as real: an extra
//! retreat costs nothing, a missed edge loses the match.

use crate::sensor::{EdgePin, SensorDriver};
use crate::system::config::EdgePolarity;

/// Edge flags of one cycle; `true` means no surface below that sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeState {
    pub front: bool,
    pub back: bool,
}

impl EdgeState {
    pub fn any(&self) -> bool {
        self.front || self.back
    }
}

/// Reads both edge detectors once
pub fn read_edges<S: SensorDriver>(driver: &mut S, polarity: EdgePolarity) -> EdgeState {
    EdgeState {
        front: polarity.is_edge(driver.read_digital(EdgePin::Front)),
        back: polarity.is_edge(driver.read_digital(EdgePin::Back)),
    }
}
