//! H-bridge outputs
//!
//! Both bridge PWM inputs share one slice: channel A drives motor A and
//! channel B drives motor B. The slice runs phase-correct with both outputs
//! inverted, so the compare value is the off time. `max_compare` is written
//! as `top + 1` so a motor is off for the whole period.

use defmt::debug;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{self, Pwm};

use duo_motor::system::motor::{MotorId, MOTOR_COUNT};
use duo_motor::system::pwm::{compare_register, BridgeState, MotorDriver};

use super::resources::MotorDriverResources;

/// Clock divider for the bridge PWM, about 9 kHz with a 255 top at 150 MHz
const DIVIDER: u8 = 32;

/// Direction inputs of one bridge
struct Bridge {
    in_a: Output<'static>,
    in_b: Output<'static>,
}

impl Bridge {
    fn set(&mut self, state: BridgeState) {
        let (a, b) = match state {
            BridgeState::Clockwise => (Level::High, Level::Low),
            BridgeState::CounterClockwise => (Level::Low, Level::High),
            BridgeState::Brake => (Level::Low, Level::Low),
        };
        self.in_a.set_level(a);
        self.in_b.set_level(b);
    }
}

/// Real motor outputs behind [`MotorDriver`]
pub struct BridgeDriver {
    pwm: Pwm<'static>,
    config: pwm::Config,
    bridges: [Bridge; MOTOR_COUNT],
}

impl BridgeDriver {
    /// Configures the slice with both outputs off and all direction pins low
    pub fn new(r: MotorDriverResources, max_compare: u16) -> Self {
        let mut config = pwm::Config::default();
        config.divider = DIVIDER.into();
        config.top = max_compare;
        config.phase_correct = true;
        config.invert_a = true;
        config.invert_b = true;
        config.compare_a = compare_register(max_compare, max_compare);
        config.compare_b = compare_register(max_compare, max_compare);

        let pwm = Pwm::new_output_ab(r.slice, r.pwm_a_pin, r.pwm_b_pin, config.clone());
        let bridges = [
            Bridge {
                in_a: Output::new(r.a_in_a_pin, Level::Low),
                in_b: Output::new(r.a_in_b_pin, Level::Low),
            },
            Bridge {
                in_a: Output::new(r.b_in_a_pin, Level::Low),
                in_b: Output::new(r.b_in_b_pin, Level::Low),
            },
        ];

        Self {
            pwm,
            config,
            bridges,
        }
    }
}

impl MotorDriver for BridgeDriver {
    fn set_bridge(&mut self, motor: MotorId, state: BridgeState) {
        debug!("bridge {:?} -> {:?}", motor, state);
        self.bridges[motor.index()].set(state);
    }

    fn set_compare(&mut self, motor: MotorId, compare: u16) {
        let compare = compare_register(compare, self.config.top);
        match motor {
            MotorId::A => self.config.compare_a = compare,
            MotorId::B => self.config.compare_b = compare,
        }
        self.pwm.set_config(&self.config);
    }

    fn restart_pwm_counter(&mut self) {
        self.pwm.set_counter(0);
    }
}
