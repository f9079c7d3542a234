//! Fatal error indicator

use embassy_rp::gpio::Output;
use embassy_time::{block_for, Duration};

const BLINK_INTERVAL: Duration = Duration::from_millis(50);

/// Blinks the LED forever; nothing else runs in thread mode afterwards
pub fn halt(mut led: Output<'static>) -> ! {
    loop {
        led.toggle();
        block_for(BLINK_INTERVAL);
    }
}
