//! Motor controller firmware entry point
//!
//! Interrupt-side work (encoder edges, serial bytes, sample ticks) runs as
//! tasks on a high priority interrupt executor and only touches [`SHARED`].
//! The scheduler then busy-polls the shared state in thread mode forever.

#![no_std]
#![no_main]

use defmt::{error, info};
use duo_motor::system::{
    config::ControllerConfig, motor::MotorId, scheduler::Scheduler, shared::SharedState,
};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::uart::{self, UartRx};
use embassy_time::Duration;
use task::resources::{
    AssignedResources, EncoderResources, IndicatorResources, Irqs, MotorDriverResources,
    PulseTimerResources, SerialResources,
};
use task::{
    bridge::BridgeDriver, capture::encoder_capture, indicator, pulse_timer, sample::sample_tick,
    serial::serial_receive,
};
use {defmt_rtt as _, panic_probe as _};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Task implementations
mod task;

/// Flags and latches written by interrupts, read by the scheduler
pub static SHARED: SharedState = SharedState::new();

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[interrupt]
fn PWM_IRQ_WRAP_0() {
    pulse_timer::on_wrap(&SHARED);
}

/// Firmware entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Config::default());
    let r = split_resources!(p);

    let led = Output::new(r.indicator.led_pin, Level::Low);

    let config = ControllerConfig {
        clock_frequency_hz: pulse_timer::start(r.pulse_timer),
        ..ControllerConfig::DEFAULT
    };
    let driver = BridgeDriver::new(r.motor_driver, config.max_compare);

    // outputs are off from here on, whatever happens next
    let mut scheduler = match Scheduler::new(&SHARED, config, driver) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            error!("{}", e);
            indicator::halt(led)
        }
    };

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);

    let encoder_a = Input::new(r.encoders.a_pin, Pull::Up);
    let encoder_b = Input::new(r.encoders.b_pin, Pull::Up);
    spawner.must_spawn(encoder_capture(MotorId::A, encoder_a));
    spawner.must_spawn(encoder_capture(MotorId::B, encoder_b));

    let rx = UartRx::new(r.serial.uart, r.serial.rx_pin, Irqs, r.serial.rx_dma, uart::Config::default());
    spawner.must_spawn(serial_receive(rx));

    let period_us = (1_000_000.0 / config.sampling_frequency_hz) as u64;
    spawner.must_spawn(sample_tick(Duration::from_micros(period_us)));

    info!("controller ready: {}", config);
    scheduler.run()
}
