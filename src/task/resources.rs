//! Hardware Resource Management
//!
//! Assigns the RP2350 pins and peripherals to the firmware's parts.
//!
//! # Resource Groups
//! - Pulse timer: free-running PWM slice used as the 16-bit tick counter
//! - Motor driver: PWM slice for both bridges plus four direction pins
//! - Encoders: Hall sensor output of each motor
//! - Serial: UART0 receive pin and its DMA channel
//! - Indicator: on-board LED for the fatal-error blink

use assign_resources::assign_resources;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{self, UART0};
use embassy_rp::uart::InterruptHandler as UartInterruptHandler;

assign_resources! {
    /// Free-running slice counting pulse ticks
    pulse_timer: PulseTimerResources {
        slice: PWM_SLICE0,
    },
    /// Dual H-bridge: PWM inputs on slice 4, channel A to motor A
    motor_driver: MotorDriverResources {
        slice: PWM_SLICE4,
        pwm_a_pin: PIN_8,
        pwm_b_pin: PIN_9,
        a_in_a_pin: PIN_10,
        a_in_b_pin: PIN_11,
        b_in_a_pin: PIN_12,
        b_in_b_pin: PIN_13,
    },
    /// Hall encoder outputs, one edge per pulse
    encoders: EncoderResources {
        a_pin: PIN_14,
        b_pin: PIN_15,
    },
    /// Command link
    serial: SerialResources {
        uart: UART0,
        rx_pin: PIN_1,
        rx_dma: DMA_CH0,
    },
    /// On-board LED
    indicator: IndicatorResources {
        led_pin: PIN_25,
    },
}

bind_interrupts!(pub struct Irqs {
    UART0_IRQ => UartInterruptHandler<UART0>;
});
