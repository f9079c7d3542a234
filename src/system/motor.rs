//! Per-motor control state
//!
//! A motor pairs the speed estimate from its encoder with its PI controller
//! and the current setpoint. Both instances are owned by the scheduler for
//! the whole lifetime of the firmware.

use crate::system::config::ControllerConfig;
use crate::system::encoder::{PulseInterval, RpsEstimator, RpsUpdate};
use crate::system::pi::PiController;

/// Number of driven motors
pub const MOTOR_COUNT: usize = 2;

/// Motor identifiers, A on bridge 1 and B on bridge 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorId {
    A,
    B,
}

impl MotorId {
    pub const ALL: [MotorId; MOTOR_COUNT] = [MotorId::A, MotorId::B];

    pub const fn index(self) -> usize {
        match self {
            MotorId::A => 0,
            MotorId::B => 1,
        }
    }
}

/// Speed estimate, controller and setpoint of one motor
#[derive(Debug, Clone)]
pub struct Motor {
    id: MotorId,
    estimator: RpsEstimator,
    controller: PiController,
    setpoint_rps: f32,
}

impl Motor {
    pub fn new(id: MotorId, config: &ControllerConfig) -> Self {
        Self {
            id,
            estimator: RpsEstimator::new(),
            controller: PiController::new(config.gains, config.output_min, config.output_max),
            setpoint_rps: 0.0,
        }
    }

    pub fn id(&self) -> MotorId {
        self.id
    }

    /// Filtered speed in revolutions per second
    pub fn rps(&self) -> f32 {
        self.estimator.rps()
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint_rps
    }

    pub fn set_setpoint(&mut self, rps: f32) {
        self.setpoint_rps = rps;
    }

    pub fn controller(&self) -> &PiController {
        &self.controller
    }

    /// Folds a new encoder interval into the speed estimate
    pub fn update_speed(&mut self, interval: PulseInterval, config: &ControllerConfig) -> RpsUpdate {
        self.estimator.update(interval, config)
    }

    /// Runs one controller sample and returns the duty cycle in percent
    pub fn advance(&mut self, sample_period_s: f32) -> f32 {
        let error = self.setpoint_rps - self.estimator.rps();
        self.controller.advance(sample_period_s, error)
    }

    /// Zeroes the setpoint and clears controller history
    pub fn stop(&mut self) {
        self.setpoint_rps = 0.0;
        self.controller.clear_accumulated();
    }
}
