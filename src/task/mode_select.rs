//! Mode button handling
//!
//! Each press of the mode button before the fight moves on to the next strategy. Once the
//! fight has started presses are ignored.

use defmt::info;
use embassy_rp::gpio::{Input, Level};
use embassy_time::{Duration, Timer};

use crate::task::combat::COMBAT;

/// Button debounce delay (ms)
const DEBOUNCE_DURATION: Duration = Duration::from_millis(30);

#[embassy_executor::task]
pub async fn mode_select(mut button: Input<'static>) {
    info!("mode button ready, strategy {}", COMBAT.strategy());
    loop {
        if debounce(&mut button).await != Level::High {
            continue;
        }
        if COMBAT.cycle_strategy().is_none() {
            // locked for good
            return;
        }
    }
}

/// Ensures stable button state
async fn debounce(button: &mut Input<'static>) -> Level {
    loop {
        let st_level = button.get_level();
        button.wait_for_any_edge().await;
        Timer::after(DEBOUNCE_DURATION).await;
        let end_level = button.get_level();
        if st_level != end_level {
            break end_level;
        }
    }
}
