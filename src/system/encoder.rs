//! Hall encoder capture and speed estimation
//!
//! Each motor carries a single-channel Hall encoder producing one rising edge
//! per fixed angular step. The edge interrupt latches the current 32-bit tick
//! position into a [`HallEncoder`]; the main loop takes the latched interval
//! and feeds it to the motor's [`RpsEstimator`].
//!
//! # Operation
//! - Capture and take both run inside one critical section, so the main loop
//!   never sees half of a 32-bit tick pair
//! - At most one interval is pending per motor; a second edge before the
//!   main loop gets to it overwrites the first (data loss, not corruption)
//! - Near-zero intervals (double edges) are ignored
//! - Readings at or above the believability bound are rejected and the
//!   previous filtered value is held. This also rejects genuine over-speed.
//! - Accepted readings go through a single-pole EMA

use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::system::config::ControllerConfig;
use crate::system::tick::ticks_between;

/// Intervals shorter than this are a spurious double edge
const SPURIOUS_TICKS: f32 = 0.9;

/// Two consecutive edge timestamps of one encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseInterval {
    /// Tick position of the previous edge
    pub buffered_tick: u32,
    /// Tick position of the latest edge
    pub raw_tick: u32,
}

impl PulseInterval {
    /// Elapsed ticks, tolerating one wrap of the 32-bit position
    pub fn ticks(&self) -> u32 {
        ticks_between(self.buffered_tick, self.raw_tick)
    }
}

#[derive(Clone, Copy)]
struct Latch {
    interval: PulseInterval,
    measurement_ready: bool,
}

/// Edge latch of one Hall encoder, shared between its interrupt and the main loop
pub struct HallEncoder {
    latch: Mutex<CriticalSectionRawMutex, Cell<Latch>>,
}

impl HallEncoder {
    pub const fn new() -> Self {
        Self {
            latch: Mutex::new(Cell::new(Latch {
                interval: PulseInterval {
                    buffered_tick: 0,
                    raw_tick: 0,
                },
                measurement_ready: false,
            })),
        }
    }

    /// Edge interrupt: shift the last position into the buffer and latch `tick`
    pub fn capture(&self, tick: u32) {
        self.latch.lock(|cell| {
            let mut latch = cell.get();
            latch.interval.buffered_tick = latch.interval.raw_tick;
            latch.interval.raw_tick = tick;
            latch.measurement_ready = true;
            cell.set(latch);
        });
    }

    /// Takes the pending interval, if any, and clears the ready flag
    pub fn take(&self) -> Option<PulseInterval> {
        self.latch.lock(|cell| {
            let mut latch = cell.get();
            if !latch.measurement_ready {
                return None;
            }
            latch.measurement_ready = false;
            cell.set(latch);
            Some(latch.interval)
        })
    }

    /// Whether an interval is waiting to be taken
    pub fn measurement_ready(&self) -> bool {
        self.latch.lock(|cell| cell.get().measurement_ready)
    }
}

impl Default for HallEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of feeding one interval to the estimator
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RpsUpdate {
    /// Reading accepted, carries the new filtered speed
    Filtered(f32),
    /// Interval of (almost) zero ticks, nothing changed
    SpuriousEdge,
    /// Raw speed above the believability bound, nothing changed
    Outlier(f32),
}

/// Filtered revolutions-per-second estimate of one motor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RpsEstimator {
    filtered_rps: f32,
}

impl RpsEstimator {
    pub const fn new() -> Self {
        Self { filtered_rps: 0.0 }
    }

    /// Current filtered speed
    pub fn rps(&self) -> f32 {
        self.filtered_rps
    }

    /// Converts one edge interval into a speed and folds it into the filter
    pub fn update(&mut self, interval: PulseInterval, config: &ControllerConfig) -> RpsUpdate {
        let ticks = interval.ticks() as f32;
        if ticks < SPURIOUS_TICKS {
            return RpsUpdate::SpuriousEdge;
        }

        let raw_rps =
            config.clock_frequency_hz / (ticks * f32::from(config.pulses_per_revolution));
        if raw_rps >= config.rps_upper_discard_limit {
            return RpsUpdate::Outlier(raw_rps);
        }

        let alpha = config.rps_alpha;
        self.filtered_rps = alpha * self.filtered_rps + (1.0 - alpha) * raw_rps;
        RpsUpdate::Filtered(self.filtered_rps)
    }
}

impl Default for RpsEstimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interval(buffered_tick: u32, raw_tick: u32) -> PulseInterval {
        PulseInterval {
            buffered_tick,
            raw_tick,
        }
    }

    fn raw_rps(ticks: u32) -> f32 {
        let cfg = ControllerConfig::DEFAULT;
        cfg.clock_frequency_hz / (ticks as f32 * f32::from(cfg.pulses_per_revolution))
    }

    #[test]
    fn nothing_pending_initially() {
        let encoder = HallEncoder::new();
        assert!(!encoder.measurement_ready());
        assert_eq!(encoder.take(), None);
    }

    #[test]
    fn capture_shifts_previous_tick_into_buffer() {
        let encoder = HallEncoder::new();
        encoder.capture(100);
        assert_eq!(encoder.take(), Some(interval(0, 100)));
        encoder.capture(350);
        assert!(encoder.measurement_ready());
        assert_eq!(encoder.take(), Some(interval(100, 350)));
        assert!(!encoder.measurement_ready());
        assert_eq!(encoder.take(), None);
    }

    #[test]
    fn second_capture_before_take_overwrites_buffer() {
        let encoder = HallEncoder::new();
        encoder.capture(100);
        encoder.capture(200);
        encoder.capture(300);
        assert_eq!(encoder.take(), Some(interval(200, 300)));
        assert_eq!(encoder.take(), None);
    }

    #[test]
    fn interval_ticks_across_wrap() {
        let wrapped = interval(u32::MAX - 100, 65_205);
        assert_eq!(wrapped.ticks(), 65_306);
    }

    #[test]
    fn one_rps_at_default_config() {
        let mut est = RpsEstimator::new();
        // 16 MHz / 245 pulses = 65306 ticks per pulse at 1 RPS
        let update = est.update(interval(10, 65_316), &ControllerConfig::DEFAULT);
        let expected = 0.5 * raw_rps(65_306);
        assert_eq!(update, RpsUpdate::Filtered(expected));
        assert!((est.rps() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn zero_interval_is_ignored() {
        let mut est = RpsEstimator::new();
        est.update(interval(0, 65_306), &ControllerConfig::DEFAULT);
        let before = est.rps();
        assert_eq!(
            est.update(interval(500, 500), &ControllerConfig::DEFAULT),
            RpsUpdate::SpuriousEdge
        );
        assert_eq!(est.rps(), before);
    }

    #[test]
    fn over_limit_reading_keeps_previous_value() {
        let mut est = RpsEstimator::new();
        est.update(interval(0, 65_306), &ControllerConfig::DEFAULT);
        let before = est.rps();

        let update = est.update(interval(0, 1_000), &ControllerConfig::DEFAULT);
        match update {
            RpsUpdate::Outlier(rps) => assert!((rps - 65.306).abs() < 0.01),
            other => panic!("expected outlier, got {:?}", other),
        }
        assert_eq!(est.rps(), before);
    }

    #[test]
    fn ema_converges_monotonically_within_seven_updates() {
        let cfg = ControllerConfig::DEFAULT;
        let ticks = 13_061;
        let target = raw_rps(ticks);
        let needed = (0.01f32.ln() / cfg.rps_alpha.ln()).ceil() as usize;
        assert_eq!(needed, 7);

        let mut est = RpsEstimator::new();
        let mut last = est.rps();
        for _ in 0..needed {
            est.update(interval(0, ticks), &cfg);
            assert!(est.rps() > last);
            assert!(est.rps() <= target);
            last = est.rps();
        }
        assert!((target - est.rps()) / target < 0.01);
    }
}
