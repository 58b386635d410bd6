//! Sensor front-end drivers

pub mod mux;

pub use mux::{AnalogMux, MuxError};
