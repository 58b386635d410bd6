//! Valve drivers

pub mod gpio;

pub use gpio::GpioValve;
