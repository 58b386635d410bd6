//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in pneumo-core on top of `embedded-hal` pins:
//!
//! - Solenoid valves (GPIO, active-high or active-low)
//! - Pumps (PWM drive leg plus a return leg held low)
//! - Analog multiplexer for the output-side pressure sensors

#![no_std]
#![deny(unsafe_code)]

pub mod pump;
pub mod sensor;
pub mod valve;
