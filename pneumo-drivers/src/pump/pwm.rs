//! PWM-driven diaphragm pump
//!
//! The pump motor sits between a PWM drive pin and a return pin. The
//! return pin is held low for the driver's whole lifetime so the drive pin
//! alone sets the motor voltage.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use pneumo_core::traits::{ActuatorError, PumpOutput};

/// Full-scale duty value accepted by [`PumpOutput::set_duty`]
pub const DUTY_MAX: u8 = 255;

/// Pump on a PWM channel with a grounded return leg
pub struct PwmPump<D, R> {
    drive: D,
    #[allow(dead_code)]
    ret: R,
    duty: u8,
}

impl<D: SetDutyCycle, R: OutputPin> PwmPump<D, R> {
    /// Create a new pump driver and stop the motor
    pub fn new(mut drive: D, mut ret: R) -> Result<Self, ActuatorError> {
        ret.set_low().map_err(|_| ActuatorError::Pin)?;
        drive
            .set_duty_cycle_fully_off()
            .map_err(|_| ActuatorError::Pwm)?;

        Ok(Self {
            drive,
            ret,
            duty: 0,
        })
    }
}

impl<D: SetDutyCycle, R: OutputPin> PumpOutput for PwmPump<D, R> {
    fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.drive
            .set_duty_cycle_fraction(u16::from(duty), u16::from(DUTY_MAX))
            .map_err(|_| ActuatorError::Pwm)?;
        self.duty = duty;
        Ok(())
    }

    fn duty(&self) -> u8 {
        self.duty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType as PinErrorType;
    use embedded_hal::pwm::{Error, ErrorKind, ErrorType};

    #[derive(Debug)]
    struct MockPwmError;

    impl Error for MockPwmError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Mock PWM channel with a 1000-step counter
    struct MockPwm {
        duty: u16,
        fail: bool,
    }

    impl ErrorType for MockPwm {
        type Error = MockPwmError;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), MockPwmError> {
            if self.fail {
                return Err(MockPwmError);
            }
            self.duty = duty;
            Ok(())
        }
    }

    struct MockPin {
        high: bool,
    }

    impl PinErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }
    }

    fn pump() -> PwmPump<MockPwm, MockPin> {
        let pwm = MockPwm {
            duty: 500,
            fail: false,
        };
        PwmPump::new(pwm, MockPin { high: true }).unwrap()
    }

    #[test]
    fn test_new_stops_motor_and_grounds_return() {
        let pump = pump();
        assert_eq!(pump.drive.duty, 0);
        assert!(!pump.ret.high);
        assert_eq!(pump.duty(), 0);
        assert!(!pump.is_running());
    }

    #[test]
    fn test_duty_scaled_to_counter() {
        let mut pump = pump();

        pump.set_duty(DUTY_MAX).unwrap();
        assert_eq!(pump.drive.duty, 1000);

        // 130/255 of 1000
        pump.set_duty(130).unwrap();
        assert_eq!(pump.drive.duty, 509);
        assert_eq!(pump.duty(), 130);
        assert!(pump.is_running());

        pump.set_duty(0).unwrap();
        assert_eq!(pump.drive.duty, 0);
    }

    #[test]
    fn test_pwm_failure_keeps_duty() {
        let mut pump = pump();
        pump.set_duty(100).unwrap();
        pump.drive.fail = true;

        assert_eq!(pump.set_duty(200), Err(ActuatorError::Pwm));
        assert_eq!(pump.duty(), 100);
    }
}
