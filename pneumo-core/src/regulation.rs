//! Pump pressure regulation
//!
//! On/off control with a hysteresis band on one side of the setpoint.
//! A pressure pump starts when the line falls more than the band below
//! its setpoint and stops once the line rises past the setpoint. A vacuum
//! pump mirrors this around the negative setpoint.

use pneumo_protocol::Pump;

/// Direction a pump moves its line's pressure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PumpPolarity {
    /// Pulls pressure down (vacuum)
    Vacuum,
    /// Pushes pressure up
    Pressure,
}

impl From<Pump> for PumpPolarity {
    fn from(pump: Pump) -> Self {
        match pump {
            Pump::Negative => Self::Vacuum,
            Pump::Positive => Self::Pressure,
        }
    }
}

/// Hysteresis regulator for one pump
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PumpRegulator {
    polarity: PumpPolarity,
    hysteresis_kpa: f32,
    driving: bool,
}

impl PumpRegulator {
    pub const fn new(polarity: PumpPolarity, hysteresis_kpa: f32) -> Self {
        Self {
            polarity,
            hysteresis_kpa,
            driving: false,
        }
    }

    /// Start driving regardless of the last measurement
    pub fn engage(&mut self) {
        self.driving = true;
    }

    /// Stop driving
    pub fn reset(&mut self) {
        self.driving = false;
    }

    /// Whether the pump is currently being driven
    pub fn is_driving(&self) -> bool {
        self.driving
    }

    /// Run one control step, returning whether the pump should be driven
    pub fn update(&mut self, setpoint_kpa: f32, measured_kpa: f32) -> bool {
        let h = self.hysteresis_kpa;
        match self.polarity {
            PumpPolarity::Pressure => {
                if measured_kpa < setpoint_kpa - h {
                    self.driving = true;
                } else if measured_kpa > setpoint_kpa {
                    self.driving = false;
                }
            }
            PumpPolarity::Vacuum => {
                if measured_kpa > setpoint_kpa + h {
                    self.driving = true;
                } else if measured_kpa < setpoint_kpa {
                    self.driving = false;
                }
            }
        }
        self.driving
    }
}
