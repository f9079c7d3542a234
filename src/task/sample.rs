//! Control sample clock

use embassy_time::{Duration, Ticker};

use crate::SHARED;

/// Raises a control sample every `period`
#[embassy_executor::task]
pub async fn sample_tick(period: Duration) {
    let mut ticker = Ticker::every(period);
    loop {
        ticker.next().await;
        SHARED.on_sample_tick();
    }
}
