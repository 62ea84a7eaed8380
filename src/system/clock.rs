//! Monotonic time source
//!
//! Strategies and the arbitration loop never read the time driver directly. They ask a
//! [`Clock`], which is `embassy_time::Instant::now()` on target and a hand-stepped fake in tests.

use embassy_time::Instant;

/// Source of monotonic timestamps
pub trait Clock {
    /// Current time
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }
}
