//! Controller configuration
//!
//! Named values for every tuning constant of the control path. The firmware
//! starts from [`ControllerConfig::DEFAULT`] and overrides what it measures
//! at runtime (the pulse timer clock); tests inject their own values.
//!
//! # Defaults
//! - 16 MHz pulse tick timer
//! - IG32E-35K gear motor: 245 encoder pulses per output revolution
//! - 62.5 Hz control loop, commands last 376 samples (~6 s)
//! - 1 RPS setpoint while a command runs
//! - PI output limited to 0-95 % duty

use crate::system::error::ConfigError;

/// What to do with a command byte that maps to no known motion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UnknownCommandPolicy {
    /// Drop the byte; nothing starts
    Ignore,
    /// Start a timed run at the on speed without touching the direction outputs
    TimedRun,
}

/// PI collaborator gains
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PiGains {
    /// Proportional gain
    pub kp: f32,
    /// Derivative time in seconds, 0 disables the derivative term
    pub td: f32,
    /// Integral time in seconds, 0 disables the integral term
    pub ti: f32,
}

/// Tuning and hardware constants of the control path
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerConfig {
    /// Frequency of the pulse tick timer in Hz
    pub clock_frequency_hz: f32,
    /// Encoder pulses per output shaft revolution
    pub pulses_per_revolution: u16,
    /// Weight of the previous filtered speed in the EMA
    pub rps_alpha: f32,
    /// Raw readings at or above this speed are rejected as glitches
    pub rps_upper_discard_limit: f32,
    /// Control loop rate in Hz
    pub sampling_frequency_hz: f32,
    /// Length of a timed command in control samples
    pub command_duration_samples: u32,
    /// Setpoint of both motors while a command runs
    pub motor_on_rps: f32,
    /// PI gains shared by both motors
    pub gains: PiGains,
    /// Lower PI output bound in percent duty
    pub output_min: f32,
    /// Upper PI output bound in percent duty
    pub output_max: f32,
    /// PWM counter top value
    pub max_compare: u16,
    /// Mask applied to every received command byte
    pub command_mask: u8,
    /// Handling of unrecognised command bytes
    pub unknown_command: UnknownCommandPolicy,
}

impl ControllerConfig {
    pub const DEFAULT: Self = Self {
        clock_frequency_hz: 16_000_000.0,
        pulses_per_revolution: 245,
        rps_alpha: 0.5,
        rps_upper_discard_limit: 10.0,
        sampling_frequency_hz: 62.5,
        command_duration_samples: 2 * 188,
        motor_on_rps: 1.0,
        gains: PiGains {
            kp: 4.0,
            td: 0.0,
            ti: 128.8773,
        },
        output_min: 0.0,
        output_max: 95.0,
        max_compare: 255,
        // the serial link sometimes delivers bytes with the MSB set
        command_mask: 0x7F,
        unknown_command: UnknownCommandPolicy::Ignore,
    };

    /// Time between two control loop evaluations in seconds
    pub fn sample_period_s(&self) -> f32 {
        1.0 / self.sampling_frequency_hz
    }

    /// Checks every value the control path divides by or clamps against
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.clock_frequency_hz) {
            return Err(ConfigError::ClockFrequency);
        }
        if self.pulses_per_revolution == 0 {
            return Err(ConfigError::PulsesPerRevolution);
        }
        if !(0.0..1.0).contains(&self.rps_alpha) {
            return Err(ConfigError::FilterAlpha);
        }
        if !positive(self.rps_upper_discard_limit) {
            return Err(ConfigError::DiscardLimit);
        }
        if !positive(self.sampling_frequency_hz) {
            return Err(ConfigError::SamplingFrequency);
        }
        if self.command_duration_samples == 0 {
            return Err(ConfigError::CommandDuration);
        }
        if !non_negative(self.motor_on_rps) {
            return Err(ConfigError::MotorOnSpeed);
        }
        let PiGains { kp, td, ti } = self.gains;
        if !(non_negative(kp) && non_negative(td) && non_negative(ti)) {
            return Err(ConfigError::Gains);
        }
        let bounds_ok = self.output_min.is_finite()
            && self.output_max.is_finite()
            && self.output_min >= 0.0
            && self.output_max <= 100.0
            && self.output_min < self.output_max;
        if !bounds_ok {
            return Err(ConfigError::OutputBounds);
        }
        if self.max_compare == 0 {
            return Err(ConfigError::MaxCompare);
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn non_negative(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}
