//! Board-agnostic core logic for the pneumatic control board
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (valves, pumps)
//! - Sensor calibration and averaging
//! - Pump pressure regulation
//! - Command dispatch against board state
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod regulation;
pub mod sensor;
pub mod traits;
