//! Cooperative main loop
//!
//! Interrupt handlers only set flags and latch values in [`SharedState`].
//! The scheduler polls them in a fixed order once per pass:
//! 1. RPS update for motor A, then motor B, when an interval is latched
//! 2. PI advance for both motors, when a sample is due and a command runs
//! 3. Command parse, when a byte is waiting
//! 4. Command completion, when the running command used up its samples
//!
//! A command parsed in step 3 starts with zero elapsed samples, so step 4
//! of the same pass cannot end it. Samples are counted from the following
//! sample interrupt on.
//!
//! While no command runs, step 2 is skipped and the sample flag stays set;
//! the first pass after a command starts advances the controllers at once.

use crate::system::command::Command;
use crate::system::config::{ControllerConfig, UnknownCommandPolicy};
use crate::system::encoder::RpsUpdate;
use crate::system::error::Error;
use crate::system::motor::{Motor, MotorId, MOTOR_COUNT};
use crate::system::pwm::{duty_to_compare, MotorDriver};
use crate::system::shared::SharedState;

/// Command state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RunState {
    Idle,
    Running,
}

/// What happened to a parsed command byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandOutcome {
    /// A timed run started
    Started(Command),
    /// Unrecognised byte, dropped by policy
    Ignored(Command),
    /// Arrived while a command was running, dropped
    Busy(Command),
}

/// Work done by one scheduler pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollReport {
    /// Estimator outcome per motor, `None` when no interval was latched
    pub rps: [Option<RpsUpdate>; MOTOR_COUNT],
    /// Duty cycles written by the PI step
    pub duties: Option<[f32; MOTOR_COUNT]>,
    /// Outcome of a parsed command byte
    pub command: Option<CommandOutcome>,
    /// The running command reached its duration
    pub completed: bool,
}

impl PollReport {
    /// Nothing was pending this pass
    pub fn is_empty(&self) -> bool {
        *self == PollReport::default()
    }
}

/// Fixed-order main loop over both motors
pub struct Scheduler<'a, D: MotorDriver> {
    shared: &'a SharedState,
    config: ControllerConfig,
    motors: [Motor; MOTOR_COUNT],
    driver: D,
}

impl<'a, D: MotorDriver> Scheduler<'a, D> {
    /// Validates `config` and forces both PWM outputs fully off
    pub fn new(shared: &'a SharedState, config: ControllerConfig, mut driver: D) -> Result<Self, Error> {
        config.validate()?;

        for id in MotorId::ALL {
            driver.set_compare(id, config.max_compare);
        }

        Ok(Self {
            shared,
            config,
            motors: MotorId::ALL.map(|id| Motor::new(id, &config)),
            driver,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn motor(&self, id: MotorId) -> &Motor {
        &self.motors[id.index()]
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn state(&self) -> RunState {
        if self.shared.command().is_running() {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Polls forever
    pub fn run(&mut self) -> ! {
        info!("scheduler running");
        loop {
            let report = self.poll();
            if !report.is_empty() {
                trace!("pass {:?}", report);
            }
        }
    }

    /// One pass over all pending work, in fixed priority order
    pub fn poll(&mut self) -> PollReport {
        let shared = self.shared;
        let mut report = PollReport::default();

        for id in MotorId::ALL {
            if let Some(interval) = shared.encoder(id).take() {
                let update = self.motors[id.index()].update_speed(interval, &self.config);
                trace!("motor {:?} ticks {} -> {:?}", id, interval.ticks(), update);
                report.rps[id.index()] = Some(update);
            }
        }

        if shared.command().is_running() && shared.take_sample() {
            report.duties = Some(self.advance_controllers());
        }

        if let Some(byte) = shared.command().take_pending() {
            report.command = Some(self.dispatch(byte));
        }

        let command = shared.command();
        if command.is_running() && command.elapsed_samples() >= self.config.command_duration_samples {
            self.complete();
            report.completed = true;
        }

        report
    }

    fn advance_controllers(&mut self) -> [f32; MOTOR_COUNT] {
        let period = self.config.sample_period_s();
        let mut duties = [0.0; MOTOR_COUNT];

        for motor in self.motors.iter_mut() {
            let duty = motor.advance(period);
            self.driver
                .set_compare(motor.id(), duty_to_compare(duty, self.config.max_compare));
            duties[motor.id().index()] = duty;
        }
        // both channels start their next period together
        self.driver.restart_pwm_counter();

        debug!(
            "pi A {} rps -> {}%, B {} rps -> {}%",
            self.motors[0].rps(),
            duties[0],
            self.motors[1].rps(),
            duties[1]
        );
        duties
    }

    fn dispatch(&mut self, byte: u8) -> CommandOutcome {
        let command = Command::parse(byte, self.config.command_mask);

        if self.shared.command().is_running() {
            warn!("command {:?} dropped, another command is running", command);
            return CommandOutcome::Busy(command);
        }

        if !command.is_known() && self.config.unknown_command == UnknownCommandPolicy::Ignore {
            warn!("unknown command byte {} ignored", byte);
            return CommandOutcome::Ignored(command);
        }

        for motor in self.motors.iter_mut() {
            motor.set_setpoint(self.config.motor_on_rps);
        }
        if let Some(bridges) = command.bridges() {
            for id in MotorId::ALL {
                self.driver.set_bridge(id, bridges[id.index()]);
            }
        }
        self.shared.command().begin();

        info!("command {:?} started", command);
        CommandOutcome::Started(command)
    }

    fn complete(&mut self) {
        for motor in self.motors.iter_mut() {
            motor.stop();
            self.driver.set_compare(motor.id(), self.config.max_compare);
        }
        self.shared.command().finish();
        info!("command complete");
    }
}
