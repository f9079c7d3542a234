//! Hall encoder edge capture
//!
//! One task per motor waits for rising edges and latches the current pulse
//! tick. The speed math happens later in the scheduler.

use embassy_rp::gpio::Input;

use duo_motor::system::motor::MotorId;

use super::pulse_timer;
use crate::SHARED;

#[embassy_executor::task(pool_size = 2)]
pub async fn encoder_capture(motor: MotorId, mut pin: Input<'static>) {
    loop {
        pin.wait_for_rising_edge().await;
        critical_section::with(|_| {
            let (counter, wrap_pending) = pulse_timer::read();
            SHARED.on_encoder_edge(motor, counter, wrap_pending);
        });
    }
}
