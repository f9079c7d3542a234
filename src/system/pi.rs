//! PI speed controller
//!
//! Standard (ISA) form with an optional derivative term:
//!
//! `u = kp * (e + (1 / ti) * integral(e dt) + td * de/dt)`
//!
//! Output is always clamped to `[output_min, output_max]`. While the output
//! is saturated, the integrator does not accumulate error that would drive it
//! further into saturation.

use crate::system::config::PiGains;

/// Bounded PI(D) controller for one motor
#[derive(Debug, Clone, PartialEq)]
pub struct PiController {
    gains: PiGains,
    output_min: f32,
    output_max: f32,

    /// Accumulated `e * dt`
    integral: f32,
    /// Last error, `None` until the first sample after a clear
    prev_error: Option<f32>,
}

impl PiController {
    pub fn new(gains: PiGains, output_min: f32, output_max: f32) -> Self {
        Self {
            gains,
            output_min,
            output_max,
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Accumulated error integral in error-seconds
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Advances the controller by one sample and returns the bounded output
    pub fn advance(&mut self, sample_period_s: f32, error: f32) -> f32 {
        // a non-finite error would poison the integrator for good
        if !error.is_finite() {
            return self.output_min;
        }

        let PiGains { kp, td, ti } = self.gains;
        let dt_valid = sample_period_s.is_finite() && sample_period_s > 0.0;

        let candidate = if dt_valid && ti > 0.0 {
            self.integral + error * sample_period_s
        } else {
            self.integral
        };

        let derivative = match self.prev_error {
            Some(prev) if dt_valid && td > 0.0 => td * (error - prev) / sample_period_s,
            _ => 0.0,
        };
        self.prev_error = Some(error);

        let integral_term = |integral: f32| if ti > 0.0 { integral / ti } else { 0.0 };

        let unclamped = kp * (error + integral_term(candidate) + derivative);
        let winding_up = (unclamped > self.output_max && error > 0.0)
            || (unclamped < self.output_min && error < 0.0);

        let output = if winding_up {
            kp * (error + integral_term(self.integral) + derivative)
        } else {
            self.integral = candidate;
            unclamped
        };

        self.clamp(output)
    }

    /// Forgets integral and derivative history, keeps gains and bounds
    pub fn clear_accumulated(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }

    fn clamp(&self, output: f32) -> f32 {
        if output.is_nan() {
            return self.output_min;
        }
        output.clamp(self.output_min, self.output_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.016;

    fn controller(kp: f32, td: f32, ti: f32) -> PiController {
        PiController::new(PiGains { kp, td, ti }, 0.0, 95.0)
    }

    #[test]
    fn proportional_only_without_integral_time() {
        let mut pi = controller(4.0, 0.0, 0.0);
        assert_eq!(pi.advance(DT, 2.5), 10.0);
        assert_eq!(pi.advance(DT, 2.5), 10.0);
        assert_eq!(pi.integral(), 0.0);
    }

    #[test]
    fn integral_accumulates_error() {
        let mut pi = controller(1.0, 0.0, 1.0);
        pi.advance(0.5, 2.0);
        let out = pi.advance(0.5, 2.0);
        // 2 + (2 * 0.5 + 2 * 0.5) / 1
        assert!((out - 4.0).abs() < 1e-6);
        assert!((pi.integral() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn output_stays_within_bounds() {
        let mut pi = controller(50.0, 0.0, 1.0);
        assert_eq!(pi.advance(DT, 10.0), 95.0);
        assert_eq!(pi.advance(DT, -10.0), 0.0);
    }

    #[test]
    fn saturation_stops_integration() {
        let mut pi = controller(50.0, 0.0, 0.1);
        pi.advance(DT, 1.0);
        let saturated_integral = pi.integral();
        for _ in 0..100 {
            assert_eq!(pi.advance(DT, 10.0), 95.0);
        }
        assert_eq!(pi.integral(), saturated_integral);
    }

    #[test]
    fn derivative_acts_on_error_change() {
        let mut pi = controller(1.0, 0.5, 0.0);
        // first sample has no history
        assert_eq!(pi.advance(0.5, 1.0), 1.0);
        // 2 + 0.5 * (2 - 1) / 0.5
        assert!((pi.advance(0.5, 2.0) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn clear_keeps_gains() {
        let mut pi = controller(4.0, 0.0, 2.0);
        for _ in 0..10 {
            pi.advance(DT, 1.0);
        }
        assert!(pi.integral() > 0.0);
        pi.clear_accumulated();
        assert_eq!(pi.integral(), 0.0);
        assert_eq!(pi.advance(DT, 0.0), 0.0);
        let mut fresh = controller(4.0, 0.0, 2.0);
        assert_eq!(pi.advance(DT, 1.0), fresh.advance(DT, 1.0));
    }

    #[test]
    fn nan_error_yields_lower_bound_and_keeps_state() {
        let mut pi = controller(4.0, 0.0, 1.0);
        pi.advance(DT, 1.0);
        let integral = pi.integral();
        assert_eq!(pi.advance(DT, f32::NAN), 0.0);
        assert_eq!(pi.integral(), integral);
    }
}
