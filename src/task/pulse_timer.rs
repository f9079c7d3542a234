//! Pulse tick timer
//!
//! A PWM slice with no pins attached counts `clk_sys / DIVIDER` up to
//! 0xFFFF and wraps. Its wrap flag drives the `PWM_IRQ_WRAP_0` interrupt,
//! which feeds the rollover counter in [`SharedState`].

use defmt::info;
use embassy_rp::interrupt::{self, InterruptExt, Priority};
use embassy_rp::pac;
use embassy_rp::pwm::{self, Pwm};
use static_cell::StaticCell;

use duo_motor::system::shared::SharedState;

use super::resources::PulseTimerResources;

/// Slice number of `PWM_SLICE0`
const SLICE: usize = 0;
const SLICE_MASK: u32 = 1 << SLICE;
const DIVIDER: u8 = 10;

/// Keeps the slice configured for the lifetime of the firmware
static TIMER: StaticCell<Pwm<'static>> = StaticCell::new();

/// Starts the counter and its wrap interrupt, returns the tick rate in Hz
pub fn start(r: PulseTimerResources) -> f32 {
    let mut config = pwm::Config::default();
    config.divider = DIVIDER.into();
    config.top = u16::MAX;
    TIMER.init(Pwm::new_free(r.slice, config));

    pac::PWM.intr().write_value(pac::pwm::regs::Intr(SLICE_MASK));
    pac::PWM.irq0_inte().modify(|w| w.0 |= SLICE_MASK);
    interrupt::PWM_IRQ_WRAP_0.set_priority(Priority::P1);
    unsafe { interrupt::PWM_IRQ_WRAP_0.enable() };

    let hz = embassy_rp::clocks::clk_sys_freq() as f32 / f32::from(DIVIDER);
    info!("pulse timer running at {} Hz", hz);
    hz
}

/// Counter value and whether a wrap is pending, read in that order
///
/// Call with interrupts masked so the wrap handler cannot run in between.
pub fn read() -> (u16, bool) {
    let counter = pac::PWM.ch(SLICE).ctr().read().ctr();
    let wrap_pending = pac::PWM.intr().read().0 & SLICE_MASK != 0;
    (counter, wrap_pending)
}

/// Body of the wrap interrupt
pub fn on_wrap(shared: &SharedState) {
    if pac::PWM.intr().read().0 & SLICE_MASK != 0 {
        pac::PWM.intr().write_value(pac::pwm::regs::Intr(SLICE_MASK));
        shared.on_timer_overflow();
    }
}
