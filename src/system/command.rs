//! Serial motion commands
//!
//! Commands arrive as single unframed ASCII bytes:
//! - `w` forward
//! - `s` backward
//! - `a` turn left in place
//! - `d` turn right in place
//! - `x` stop
//!
//! There is one receive slot and no queue. While a command runs, received
//! bytes are dropped. While idle, a byte that arrives before the main loop
//! picked up the previous one replaces it.

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

use crate::system::motor::MOTOR_COUNT;
use crate::system::pwm::BridgeState;

/// Motion command decoded from one serial byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    /// Anything else, carries the masked byte
    Unknown(u8),
}

impl Command {
    /// Decodes a received byte after applying `mask`
    pub fn parse(byte: u8, mask: u8) -> Self {
        match byte & mask {
            b'w' => Command::Forward,
            b's' => Command::Backward,
            b'a' => Command::Left,
            b'd' => Command::Right,
            b'x' => Command::Stop,
            other => Command::Unknown(other),
        }
    }

    /// Bridge states for motors A and B, `None` leaves them as they are
    ///
    /// The motors are mounted mirrored, so driving forward spins them in
    /// opposite directions.
    pub fn bridges(self) -> Option<[BridgeState; MOTOR_COUNT]> {
        use BridgeState::*;
        match self {
            Command::Forward => Some([Clockwise, CounterClockwise]),
            Command::Backward => Some([CounterClockwise, Clockwise]),
            Command::Left => Some([Clockwise, Clockwise]),
            Command::Right => Some([CounterClockwise, CounterClockwise]),
            Command::Stop => Some([Brake, Brake]),
            Command::Unknown(_) => None,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Command::Unknown(_))
    }
}

/// Command slot and run timer, shared between interrupts and the main loop
pub struct CommandState {
    pending: Signal<CriticalSectionRawMutex, u8>,
    running: AtomicBool,
    elapsed_samples: AtomicU32,
}

impl CommandState {
    pub const fn new() -> Self {
        Self {
            pending: Signal::new(),
            running: AtomicBool::new(false),
            elapsed_samples: AtomicU32::new(0),
        }
    }

    /// Serial receive interrupt: stores `byte` unless a command is running
    ///
    /// Returns whether the byte was accepted.
    pub fn offer(&self, byte: u8) -> bool {
        if self.is_running() {
            return false;
        }
        self.pending.signal(byte);
        true
    }

    /// Whether a received byte waits to be parsed
    pub fn command_ready(&self) -> bool {
        self.pending.signaled()
    }

    /// Empties the receive slot
    pub fn take_pending(&self) -> Option<u8> {
        self.pending.try_take()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Control samples counted since the current command started
    pub fn elapsed_samples(&self) -> u32 {
        self.elapsed_samples.load(Ordering::Acquire)
    }

    /// Sample interrupt: count one period towards the running command
    pub fn on_sample(&self) {
        if self.is_running() {
            self.elapsed_samples.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Starts the run timer; counting begins with the next sample interrupt
    pub fn begin(&self) {
        self.elapsed_samples.store(0, Ordering::Release);
        self.running.store(true, Ordering::Release);
    }

    /// Stops the run timer
    pub fn finish(&self) {
        self.running.store(false, Ordering::Release);
        self.elapsed_samples.store(0, Ordering::Release);
    }
}

impl Default for CommandState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASK: u8 = 0x7F;

    #[test]
    fn parses_all_motion_bytes() {
        assert_eq!(Command::parse(b'w', MASK), Command::Forward);
        assert_eq!(Command::parse(b's', MASK), Command::Backward);
        assert_eq!(Command::parse(b'a', MASK), Command::Left);
        assert_eq!(Command::parse(b'd', MASK), Command::Right);
        assert_eq!(Command::parse(b'x', MASK), Command::Stop);
    }

    #[test]
    fn high_bit_is_masked_off() {
        assert_eq!(Command::parse(0xF7, MASK), Command::parse(0x77, MASK));
        assert_eq!(Command::parse(0xF7, MASK), Command::Forward);
    }

    #[test]
    fn unknown_byte_keeps_masked_value() {
        assert_eq!(Command::parse(b'W', MASK), Command::Unknown(b'W'));
        assert_eq!(Command::parse(0x80, MASK), Command::Unknown(0));
        assert!(!Command::Unknown(0).is_known());
        assert_eq!(Command::Unknown(b'q').bridges(), None);
    }

    #[test]
    fn turning_spins_both_motors_the_same_way() {
        let [a, b] = Command::Left.bridges().unwrap();
        assert_eq!(a, b);
        let [a, b] = Command::Forward.bridges().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn last_byte_wins_while_idle() {
        let state = CommandState::new();
        assert!(state.offer(b'w'));
        assert!(state.offer(b'a'));
        assert!(state.command_ready());
        assert_eq!(state.take_pending(), Some(b'a'));
        assert!(!state.command_ready());
        assert_eq!(state.take_pending(), None);
    }

    #[test]
    fn bytes_dropped_while_running() {
        let state = CommandState::new();
        state.begin();
        assert!(!state.offer(b'd'));
        assert_eq!(state.take_pending(), None);
        state.finish();
        assert!(state.offer(b'd'));
        assert_eq!(state.take_pending(), Some(b'd'));
    }

    #[test]
    fn samples_count_only_while_running() {
        let state = CommandState::new();
        state.on_sample();
        assert_eq!(state.elapsed_samples(), 0);
        state.begin();
        assert_eq!(state.elapsed_samples(), 0);
        state.on_sample();
        state.on_sample();
        assert_eq!(state.elapsed_samples(), 2);
        state.finish();
        state.on_sample();
        assert_eq!(state.elapsed_samples(), 0);
    }
}
