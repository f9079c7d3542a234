//! Serial command receiver
//!
//! Reads UART0 one byte at a time at 115200 baud, 8N1. Every byte is offered
//! to the command slot, which drops it while a command runs.

use defmt::{trace, warn};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{Async, UartRx};

use crate::SHARED;

#[embassy_executor::task]
pub async fn serial_receive(mut rx: UartRx<'static, UART0, Async>) {
    let mut buf = [0u8; 1];
    loop {
        match rx.read(&mut buf).await {
            Ok(()) => {
                if !SHARED.on_command_byte(buf[0]) {
                    trace!("byte {:#x} dropped while running", buf[0]);
                }
            }
            Err(e) => warn!("uart receive error: {:?}", e),
        }
    }
}
