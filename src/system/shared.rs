//! State shared between interrupt handlers and the main loop
//!
//! The firmware keeps one [`SharedState`] in a `static`; tests build their
//! own. Its `on_*` methods are the bodies of the interrupt handlers. None of
//! them block or do floating-point work.

use portable_atomic::{AtomicBool, Ordering};

use crate::system::command::CommandState;
use crate::system::encoder::HallEncoder;
use crate::system::motor::{MotorId, MOTOR_COUNT};
use crate::system::tick::TickExtender;

pub struct SharedState {
    ticks: TickExtender,
    encoders: [HallEncoder; MOTOR_COUNT],
    sample_ready: AtomicBool,
    command: CommandState,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            ticks: TickExtender::new(),
            encoders: [HallEncoder::new(), HallEncoder::new()],
            sample_ready: AtomicBool::new(false),
            command: CommandState::new(),
        }
    }

    /// Pulse timer overflow interrupt
    pub fn on_timer_overflow(&self) {
        self.ticks.on_overflow();
    }

    /// Encoder edge interrupt of `motor`
    ///
    /// `counter` is the pulse timer value read in the handler and
    /// `wrap_pending` its not-yet-serviced overflow flag.
    pub fn on_encoder_edge(&self, motor: MotorId, counter: u16, wrap_pending: bool) {
        // the overflow handler may run at a different priority
        critical_section::with(|_| {
            let tick = self.ticks.extend(counter, wrap_pending);
            self.encoders[motor.index()].capture(tick);
        });
    }

    /// Control sampling interrupt
    pub fn on_sample_tick(&self) {
        self.command.on_sample();
        self.sample_ready.store(true, Ordering::Release);
    }

    /// Serial receive interrupt, returns whether the byte was kept
    pub fn on_command_byte(&self, byte: u8) -> bool {
        self.command.offer(byte)
    }

    pub fn encoder(&self, motor: MotorId) -> &HallEncoder {
        &self.encoders[motor.index()]
    }

    pub fn command(&self) -> &CommandState {
        &self.command
    }

    /// Whether a control sample is due
    pub fn sample_ready(&self) -> bool {
        self.sample_ready.load(Ordering::Acquire)
    }

    /// Consumes the pending control sample
    pub fn take_sample(&self) -> bool {
        self.sample_ready.swap(false, Ordering::AcqRel)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
