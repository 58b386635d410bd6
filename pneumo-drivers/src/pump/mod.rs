//! Pump drivers

pub mod pwm;

pub use pwm::PwmPump;
