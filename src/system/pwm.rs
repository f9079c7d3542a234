//! Motor outputs
//!
//! Each motor sits behind an H-bridge with two direction inputs and one PWM
//! input. Both PWM inputs come from the two channels of one timer, running
//! phase-correct and active-low-on-match: a compare value of `max_compare`
//! keeps the output off for the whole period, a compare of 0 keeps it on.

use crate::system::motor::MotorId;

/// Direction inputs of one H-bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeState {
    /// IN A high, IN B low
    Clockwise,
    /// IN A low, IN B high
    CounterClockwise,
    /// Both inputs low
    Brake,
}

/// Hardware behind the two motors
///
/// Implemented by the firmware for the real H-bridges and by tests to record
/// what the control path asked for.
pub trait MotorDriver {
    /// Sets the direction inputs of one bridge
    fn set_bridge(&mut self, motor: MotorId, state: BridgeState);

    /// Writes the PWM compare register of one motor
    fn set_compare(&mut self, motor: MotorId, compare: u16);

    /// Restarts the shared PWM counter at zero so both channels begin their
    /// next period in phase
    fn restart_pwm_counter(&mut self);
}

/// Converts a duty cycle percentage into a compare value for the inverted
/// waveform: `round(max_compare * (100 - duty) / 100)`
///
/// Duty is clamped to `[0, 100]` first, so the result never exceeds
/// `max_compare`.
pub fn duty_to_compare(duty: f32, max_compare: u16) -> u16 {
    let duty = if duty.is_nan() {
        0.0
    } else {
        duty.clamp(0.0, 100.0)
    };
    libm::roundf(f32::from(max_compare) * (100.0 - duty) / 100.0) as u16
}

/// Compare register value for a phase-correct slice with inverted outputs
///
/// The output is active while the counter is at or above the compare value,
/// so a compare equal to `top` still leaves a one-count pulse at the peak.
/// `top + 1` is never reached and keeps the output off for the full period.
pub fn compare_register(compare: u16, top: u16) -> u16 {
    if compare >= top {
        top.saturating_add(1)
    } else {
        compare
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_duty_is_fully_off() {
        assert_eq!(duty_to_compare(0.0, 255), 255);
    }

    #[test]
    fn full_duty_is_fully_on() {
        assert_eq!(duty_to_compare(100.0, 255), 0);
    }

    #[test]
    fn half_duty_is_half_compare() {
        let compare = duty_to_compare(50.0, 255);
        assert!(compare == 127 || compare == 128);
    }

    #[test]
    fn default_upper_bound_never_reaches_zero() {
        assert_eq!(duty_to_compare(95.0, 255), 13);
    }

    #[test]
    fn out_of_range_duty_is_clamped() {
        assert_eq!(duty_to_compare(-20.0, 255), 255);
        assert_eq!(duty_to_compare(180.0, 255), 0);
        assert_eq!(duty_to_compare(f32::NAN, 255), 255);
    }

    #[test]
    fn follows_counter_top() {
        assert_eq!(duty_to_compare(25.0, 1000), 750);
    }

    #[test]
    fn off_compare_clears_the_peak_pulse() {
        let off = duty_to_compare(0.0, 255);
        assert_eq!(compare_register(off, 255), 256);
        // counter runs 0..=top, none of it reaches the off value
        assert!((0..=255u16).all(|ctr| ctr < compare_register(off, 255)));
    }

    #[test]
    fn on_compares_pass_through() {
        assert_eq!(compare_register(0, 255), 0);
        assert_eq!(compare_register(duty_to_compare(95.0, 255), 255), 13);
        assert_eq!(compare_register(254, 255), 254);
    }
}
