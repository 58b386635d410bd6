//! Pressure sensing: calibration, averaging and per-channel state

pub mod calibration;
pub mod channel;
pub mod filter;

pub use calibration::LinearCalibration;
pub use channel::PressureChannel;
pub use filter::ExponentialAverage;
