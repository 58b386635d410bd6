//! Board configuration
//!
//! Tunables compiled into the firmware from `board.toml`. The bank sizes
//! are fixed by the hardware and are not configurable.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of pumps (vacuum and pressure)
pub const NUM_PUMPS: usize = 2;
/// Number of input-side valves (NEG, NEU, POS)
pub const NUM_IN_VALVES: usize = 3;
/// Number of output-side valves
pub const NUM_OUT_VALVES: usize = 8;
/// Number of input-side pressure sensors
pub const NUM_IN_SENSORS: usize = 2;
/// Number of output-side pressure sensors
pub const NUM_OUT_SENSORS: usize = 8;

/// Complete board configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BoardConfig {
    pub calibration: CalibrationConfig,
    pub regulation: RegulationConfig,
    pub sampling: SamplingConfig,
    pub serial: SerialConfig,
}

/// Pressure sensor calibration
///
/// `pressure = scale * (mV / 1000 - offset)` with
/// `mV = raw * full_scale_mv / adc_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CalibrationConfig {
    /// Highest raw ADC reading
    pub adc_max: u16,
    /// Sensor output in millivolts at `adc_max`
    pub full_scale_mv: u32,
    /// Sensor gain in kPa per volt
    pub scale_kpa_per_v: f32,
    /// Zero-pressure output of each input sensor (V)
    pub input_offsets_v: [f32; NUM_IN_SENSORS],
    /// Zero-pressure output of each output sensor (V)
    pub output_offsets_v: [f32; NUM_OUT_SENSORS],
}

/// Pump regulation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RegulationConfig {
    /// Regulate pumps toward their setpoints (otherwise run at constant duty)
    pub enabled: bool,
    /// PWM duty (0-255) applied while a pump is driven
    pub duty: u8,
    /// Hysteresis band in kPa
    pub hysteresis_kpa: f32,
}

/// Sensor sampling
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SamplingConfig {
    /// Interval between full sensor sweeps
    pub period_ms: u32,
    /// Settling time after switching the output multiplexer
    pub mux_settle_us: u32,
    /// Weight of each new sample in the running average, in (0, 1]
    pub filter_alpha: f32,
}

/// Host serial link
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SerialConfig {
    pub baud: u32,
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `adc_max` is zero
    AdcMaxZero,
    /// `full_scale_mv` is zero
    FullScaleZero,
    /// Scale or an offset is NaN or infinite
    NonFiniteCalibration,
    /// Hysteresis is negative or not finite
    InvalidHysteresis,
    /// Pump duty is zero
    DutyZero,
    /// Sample period is zero
    SamplePeriodZero,
    /// Filter weight outside (0, 1]
    InvalidFilterAlpha,
    /// Baud rate is zero
    BaudZero,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            Self::AdcMaxZero => "calibration.adc_max must be greater than 0",
            Self::FullScaleZero => "calibration.full_scale_mv must be greater than 0",
            Self::NonFiniteCalibration => "calibration scale and offsets must be finite",
            Self::InvalidHysteresis => "regulation.hysteresis_kpa must be finite and >= 0",
            Self::DutyZero => "regulation.duty must be 1-255",
            Self::SamplePeriodZero => "sampling.period_ms must be greater than 0",
            Self::InvalidFilterAlpha => "sampling.filter_alpha must be in (0, 1]",
            Self::BaudZero => "serial.baud must be greater than 0",
        };
        f.write_str(msg)
    }
}

impl CalibrationConfig {
    pub const DEFAULT: Self = Self {
        adc_max: 4095,
        full_scale_mv: 5000,
        scale_kpa_per_v: 50.0,
        input_offsets_v: [2.519, 2.512],
        output_offsets_v: [2.516, 2.5, 2.5, 2.5, 2.5, 2.5, 2.5, 2.5],
    };
}

impl RegulationConfig {
    pub const DEFAULT: Self = Self {
        enabled: true,
        duty: 130,
        hysteresis_kpa: 0.3,
    };
}

impl SamplingConfig {
    pub const DEFAULT: Self = Self {
        period_ms: 10,
        mux_settle_us: 10,
        filter_alpha: 0.1,
    };
}

impl SerialConfig {
    pub const DEFAULT: Self = Self { baud: 19_200 };
}

impl BoardConfig {
    pub const DEFAULT: Self = Self {
        calibration: CalibrationConfig::DEFAULT,
        regulation: RegulationConfig::DEFAULT,
        sampling: SamplingConfig::DEFAULT,
        serial: SerialConfig::DEFAULT,
    };

    /// Check every field for values the firmware cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cal = &self.calibration;
        if cal.adc_max == 0 {
            return Err(ConfigError::AdcMaxZero);
        }
        if cal.full_scale_mv == 0 {
            return Err(ConfigError::FullScaleZero);
        }
        let offsets_finite = cal
            .input_offsets_v
            .iter()
            .chain(cal.output_offsets_v.iter())
            .all(|v| v.is_finite());
        if !cal.scale_kpa_per_v.is_finite() || !offsets_finite {
            return Err(ConfigError::NonFiniteCalibration);
        }

        let reg = &self.regulation;
        if !reg.hysteresis_kpa.is_finite() || reg.hysteresis_kpa < 0.0 {
            return Err(ConfigError::InvalidHysteresis);
        }
        if reg.duty == 0 {
            return Err(ConfigError::DutyZero);
        }

        let sampling = &self.sampling;
        if sampling.period_ms == 0 {
            return Err(ConfigError::SamplePeriodZero);
        }
        // Written so NaN fails too
        if !(sampling.filter_alpha > 0.0 && sampling.filter_alpha <= 1.0) {
            return Err(ConfigError::InvalidFilterAlpha);
        }

        if self.serial.baud == 0 {
            return Err(ConfigError::BaudZero);
        }

        Ok(())
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Default for RegulationConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(BoardConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_default_matches_board_constants() {
        let config = BoardConfig::default();
        assert_eq!(config.regulation.duty, 130);
        assert_eq!(config.serial.baud, 19_200);
        assert_eq!(config.calibration.scale_kpa_per_v, 50.0);
        assert_eq!(config.calibration.input_offsets_v, [2.519, 2.512]);
        assert_eq!(config.calibration.output_offsets_v[0], 2.516);
    }

    #[test]
    fn test_rejects_bad_filter_alpha() {
        for alpha in [0.0, -0.5, 1.5, f32::NAN] {
            let mut config = BoardConfig::default();
            config.sampling.filter_alpha = alpha;
            assert_eq!(config.validate(), Err(ConfigError::InvalidFilterAlpha));
        }

        let mut config = BoardConfig::default();
        config.sampling.filter_alpha = 1.0;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_fields() {
        let mut config = BoardConfig::default();
        config.calibration.adc_max = 0;
        assert_eq!(config.validate(), Err(ConfigError::AdcMaxZero));

        let mut config = BoardConfig::default();
        config.regulation.duty = 0;
        assert_eq!(config.validate(), Err(ConfigError::DutyZero));

        let mut config = BoardConfig::default();
        config.sampling.period_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::SamplePeriodZero));

        let mut config = BoardConfig::default();
        config.serial.baud = 0;
        assert_eq!(config.validate(), Err(ConfigError::BaudZero));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let mut config = BoardConfig::default();
        config.calibration.output_offsets_v[5] = f32::INFINITY;
        assert_eq!(config.validate(), Err(ConfigError::NonFiniteCalibration));

        let mut config = BoardConfig::default();
        config.regulation.hysteresis_kpa = -0.1;
        assert_eq!(config.validate(), Err(ConfigError::InvalidHysteresis));
    }
}
