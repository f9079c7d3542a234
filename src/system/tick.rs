//! Pulse tick extension
//!
//! The pulse timer is a free-running 16-bit counter. Its overflow interrupt
//! counts full wraps in a second 16-bit counter, and the two together form a
//! 32-bit tick position. The rollover count itself wraps after 2^16
//! overflows; consumers only ever subtract two positions taken a few hundred
//! milliseconds apart, so that is harmless.

use portable_atomic::{AtomicU16, Ordering};

/// Counter values below this are treated as "just wrapped"
const WRAP_WINDOW: u16 = 0x8000;

/// Rollover counter for a 16-bit hardware pulse timer
pub struct TickExtender {
    rollovers: AtomicU16,
}

impl TickExtender {
    pub const fn new() -> Self {
        Self {
            rollovers: AtomicU16::new(0),
        }
    }

    /// Timer overflow interrupt: one more full wrap of the hardware counter
    pub fn on_overflow(&self) {
        self.rollovers.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of wraps seen so far (modulo 2^16)
    pub fn rollovers(&self) -> u16 {
        self.rollovers.load(Ordering::Acquire)
    }

    /// Widens a hardware counter reading into a 32-bit tick position
    ///
    /// `wrap_pending` is the timer's overflow flag at the time of the read.
    /// When it is set and the counter is in its lower half, the counter has
    /// already wrapped but the overflow interrupt has not run yet, so the
    /// rollover count is one short.
    pub fn extend(&self, counter: u16, wrap_pending: bool) -> u32 {
        let mut high = self.rollovers();
        if wrap_pending && counter < WRAP_WINDOW {
            high = high.wrapping_add(1);
        }
        u32::from(counter) | (u32::from(high) << 16)
    }
}

impl Default for TickExtender {
    fn default() -> Self {
        Self::new()
    }
}

/// Ticks elapsed from `earlier` to `later`, across at most one 32-bit wrap
///
/// Equals `later + (2^32 - earlier)` when `earlier > later`.
pub fn ticks_between(earlier: u32, later: u32) -> u32 {
    later.wrapping_sub(earlier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combines_counter_and_rollovers() {
        let ext = TickExtender::new();
        assert_eq!(ext.extend(0x1234, false), 0x0000_1234);
        ext.on_overflow();
        ext.on_overflow();
        assert_eq!(ext.extend(0x1234, false), 0x0002_1234);
    }

    #[test]
    fn monotonic_over_many_wraps() {
        let ext = TickExtender::new();
        let mut last = 0u32;
        for _ in 0..1_000 {
            for counter in [0x0100u16, 0x7FFF, 0xC000, 0xFFFF] {
                let now = ext.extend(counter, false);
                assert!(now >= last, "{:#x} went backwards from {:#x}", now, last);
                last = now;
            }
            ext.on_overflow();
        }
        assert_eq!(ext.rollovers(), 1_000);
    }

    #[test]
    fn pending_wrap_counts_as_serviced() {
        let ext = TickExtender::new();
        ext.on_overflow();
        let before = ext.extend(0xFFF0, false);
        // counter wrapped, interrupt not yet run
        let pending = ext.extend(0x0004, true);
        ext.on_overflow();
        let serviced = ext.extend(0x0004, false);
        assert_eq!(pending, serviced);
        assert_eq!(ticks_between(before, pending), 0x14);
    }

    #[test]
    fn pending_flag_ignored_for_late_counter_values() {
        let ext = TickExtender::new();
        // flag set right at the end of a period, counter not yet back to zero
        assert_eq!(ext.extend(0xFFFE, true), 0x0000_FFFE);
    }

    #[test]
    fn rollover_counter_wraps_silently() {
        let ext = TickExtender::new();
        for _ in 0..=u16::MAX as u32 {
            ext.on_overflow();
        }
        assert_eq!(ext.rollovers(), 0);
        assert_eq!(ext.extend(5, false), 5);
    }

    #[test]
    fn difference_across_one_full_wrap() {
        let earlier = 0xFFFF_FF00u32;
        let later = 0x0000_0100u32;
        let expected = (later as u64 + (1u64 << 32) - earlier as u64) as u32;
        assert_eq!(ticks_between(earlier, later), expected);
        assert_eq!(ticks_between(earlier, later), 0x200);
    }

    #[test]
    fn difference_without_wrap() {
        assert_eq!(ticks_between(1_000, 66_306), 65_306);
    }
}
