pub mod bridge;
pub mod capture;
pub mod indicator;
pub mod pulse_timer;
pub mod resources;
pub mod sample;
pub mod serial;
