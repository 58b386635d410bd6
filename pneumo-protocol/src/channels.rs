//! Named indices for the input side of the board
//!
//! The wire protocol only carries numeric indices. These enums give the
//! fixed input-side indices their names, shared by firmware and host.

/// Input valve positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputValve {
    /// Vacuum line
    Negative = 0,
    /// Vent to atmosphere
    Neutral = 1,
    /// Pressure line
    Positive = 2,
}

impl InputValve {
    /// All input valves in index order
    pub const ALL: [Self; 3] = [Self::Negative, Self::Neutral, Self::Positive];

    /// Wire index of this valve
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Short name used by the host tooling
    pub const fn name(self) -> &'static str {
        match self {
            Self::Negative => "NEG",
            Self::Neutral => "NEU",
            Self::Positive => "POS",
        }
    }

    /// Look up a valve by its short name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }
}

/// Input pressure sensors, one per supply line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputSensor {
    Negative = 0,
    Positive = 1,
}

impl InputSensor {
    pub const ALL: [Self; 2] = [Self::Negative, Self::Positive];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Negative => "NEG",
            Self::Positive => "POS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Pumps feeding the supply lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pump {
    /// Vacuum pump, pulls the negative line below its setpoint
    Negative = 0,
    /// Pressure pump, pushes the positive line above its setpoint
    Positive = 1,
}

impl Pump {
    pub const ALL: [Self; 2] = [Self::Negative, Self::Positive];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Negative => "NEG",
            Self::Positive => "POS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Pump at a wire index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Sensor that measures the line this pump feeds
    pub const fn sensor(self) -> InputSensor {
        match self {
            Self::Negative => InputSensor::Negative,
            Self::Positive => InputSensor::Positive,
        }
    }
}
