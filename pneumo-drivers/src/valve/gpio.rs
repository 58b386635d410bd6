//! GPIO solenoid valve
//!
//! Drives a valve through a transistor or relay on one digital output.

use embedded_hal::digital::OutputPin;
use pneumo_core::traits::{ActuatorError, ValveOutput};

/// Solenoid valve on a GPIO pin
///
/// The pin can be configured as active-high (default) or active-low.
pub struct GpioValve<P> {
    pin: P,
    /// If true, valve OPEN = pin LOW
    inverted: bool,
    /// Last state written successfully
    open: bool,
}

impl<P: OutputPin> GpioValve<P> {
    /// Create a new valve and close it
    ///
    /// # Arguments
    /// - `pin`: The GPIO pin to control
    /// - `inverted`: If true, the valve opens when the pin is LOW
    pub fn new(pin: P, inverted: bool) -> Result<Self, ActuatorError> {
        let mut valve = Self {
            pin,
            inverted,
            open: false,
        };
        valve.set_open(false)?;
        Ok(valve)
    }

    /// Create a new valve with active-high output
    pub fn new_active_high(pin: P) -> Result<Self, ActuatorError> {
        Self::new(pin, false)
    }

    /// Create a new valve with active-low output
    pub fn new_active_low(pin: P) -> Result<Self, ActuatorError> {
        Self::new(pin, true)
    }
}

impl<P: OutputPin> ValveOutput for GpioValve<P> {
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError> {
        let result = if open != self.inverted {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| ActuatorError::Pin)?;

        self.open = open;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{Error, ErrorKind, ErrorType};

    #[derive(Debug)]
    struct MockError;

    impl Error for MockError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Mock GPIO pin for testing
    struct MockPin {
        high: bool,
        fail: bool,
    }

    impl MockPin {
        fn new() -> Self {
            Self {
                high: true,
                fail: false,
            }
        }
    }

    impl ErrorType for MockPin {
        type Error = MockError;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), MockError> {
            if self.fail {
                return Err(MockError);
            }
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), MockError> {
            if self.fail {
                return Err(MockError);
            }
            self.high = false;
            Ok(())
        }
    }

    #[test]
    fn test_active_high_valve() {
        let mut valve = GpioValve::new_active_high(MockPin::new()).unwrap();

        // Initially closed
        assert!(!valve.is_open());
        assert!(!valve.pin.high);

        valve.set_open(true).unwrap();
        assert!(valve.is_open());
        assert!(valve.pin.high);

        valve.set_open(false).unwrap();
        assert!(!valve.is_open());
        assert!(!valve.pin.high);
    }

    #[test]
    fn test_active_low_valve() {
        let mut valve = GpioValve::new_active_low(MockPin::new()).unwrap();

        // Initially closed (pin is high for active-low)
        assert!(!valve.is_open());
        assert!(valve.pin.high);

        valve.set_open(true).unwrap();
        assert!(valve.is_open());
        assert!(!valve.pin.high);
    }

    #[test]
    fn test_failed_write_keeps_state() {
        let mut valve = GpioValve::new_active_high(MockPin::new()).unwrap();
        valve.pin.fail = true;

        assert_eq!(valve.set_open(true), Err(ActuatorError::Pin));
        assert!(!valve.is_open());
    }

    #[test]
    fn test_new_fails_on_bad_pin() {
        let mut pin = MockPin::new();
        pin.fail = true;
        assert!(GpioValve::new_active_high(pin).is_err());
    }
}
