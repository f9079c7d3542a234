//! Control path components, leaves first
pub mod config;
pub mod error;
pub mod tick;
pub mod encoder;
pub mod pi;
pub mod pwm;
pub mod motor;
pub mod command;
pub mod shared;
pub mod scheduler;
