//! Error types
//!
//! Only invariant violations are errors. Sensor glitches and rejected
//! command bytes are handled where they occur and never reach this module.

use core::fmt;

/// Reasons a [`ControllerConfig`](crate::system::config::ControllerConfig) is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Pulse timer frequency is zero, negative or not finite
    ClockFrequency,
    /// Encoder reports zero pulses per revolution
    PulsesPerRevolution,
    /// Filter coefficient outside `[0, 1)`
    FilterAlpha,
    /// Upper believability bound is not a positive finite number
    DiscardLimit,
    /// Sampling frequency is not a positive finite number
    SamplingFrequency,
    /// A timed command must last at least one sample
    CommandDuration,
    /// Setpoint speed is negative or not finite
    MotorOnSpeed,
    /// A controller gain is negative or not finite
    Gains,
    /// Output bounds are inverted or leave the 0-100 % duty range
    OutputBounds,
    /// PWM counter top value is zero
    MaxCompare,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ClockFrequency => "pulse timer frequency must be positive",
            ConfigError::PulsesPerRevolution => "pulses per revolution must be non-zero",
            ConfigError::FilterAlpha => "filter alpha must lie in [0, 1)",
            ConfigError::DiscardLimit => "discard limit must be positive",
            ConfigError::SamplingFrequency => "sampling frequency must be positive",
            ConfigError::CommandDuration => "command duration must be at least one sample",
            ConfigError::MotorOnSpeed => "motor on speed must be non-negative",
            ConfigError::Gains => "controller gains must be non-negative",
            ConfigError::OutputBounds => "output bounds must satisfy 0 <= min < max <= 100",
            ConfigError::MaxCompare => "max compare must be non-zero",
        };
        f.write_str(msg)
    }
}

/// Invariant violations of the control core
///
/// None of these are recoverable; firmware hands them to its halt routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration failed validation
    Config(ConfigError),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(err) => write!(f, "invalid configuration: {}", err),
        }
    }
}
