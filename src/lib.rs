//! Closed-loop speed control core for two Hall-encoded DC gear motors
//!
//! Everything in here is hardware independent. Interrupt handlers feed
//! [`system::shared::SharedState`], and the cooperative main loop drives
//! [`system::scheduler::Scheduler`], which owns both motors and talks to
//! the hardware through [`system::pwm::MotorDriver`].

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

/// Control core components
pub mod system;
