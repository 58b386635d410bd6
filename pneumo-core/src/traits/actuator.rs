//! Valve and pump output traits

/// Errors from writing to an actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActuatorError {
    /// Digital output write failed
    Pin,
    /// PWM duty write failed
    Pwm,
}

impl core::fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Pin => f.write_str("pin write failed"),
            Self::Pwm => f.write_str("PWM write failed"),
        }
    }
}

/// Trait for solenoid valve outputs
pub trait ValveOutput {
    /// Open (`true`) or close the valve
    fn set_open(&mut self, open: bool) -> Result<(), ActuatorError>;

    /// Last state successfully written
    fn is_open(&self) -> bool;
}

/// Trait for PWM-driven pump outputs
pub trait PumpOutput {
    /// Set the drive duty cycle (0 = off, 255 = full)
    fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError>;

    /// Last duty successfully written
    fn duty(&self) -> u8;

    /// Check if the pump is being driven
    fn is_running(&self) -> bool {
        self.duty() > 0
    }
}
