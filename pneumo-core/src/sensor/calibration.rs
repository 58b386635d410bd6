//! Linear pressure sensor calibration
//!
//! The board's sensors output a voltage centred on a per-sensor offset
//! with a fixed gain. Raw ADC counts are first mapped to whole millivolts
//! (truncating, like Arduino `map`), then to kPa.

use crate::config::CalibrationConfig;

/// Calibration for a single sensor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearCalibration {
    /// Highest raw ADC reading
    pub adc_max: u16,
    /// Sensor output in millivolts at `adc_max`
    pub full_scale_mv: u32,
    /// Gain in kPa per volt
    pub scale_kpa_per_v: f32,
    /// Sensor output at zero gauge pressure (V)
    pub offset_v: f32,
}

impl LinearCalibration {
    /// Calibration sharing the board-wide settings with its own offset
    pub const fn from_config(config: &CalibrationConfig, offset_v: f32) -> Self {
        Self {
            adc_max: config.adc_max,
            full_scale_mv: config.full_scale_mv,
            scale_kpa_per_v: config.scale_kpa_per_v,
            offset_v,
        }
    }

    /// Map a raw reading to whole millivolts
    ///
    /// Readings above `adc_max` are clamped.
    pub fn millivolts(&self, raw: u16) -> u32 {
        if self.adc_max == 0 {
            return 0;
        }
        let raw = raw.min(self.adc_max) as u64;
        (raw * self.full_scale_mv as u64 / self.adc_max as u64) as u32
    }

    /// Convert a raw reading to gauge pressure in kPa
    pub fn pressure_kpa(&self, raw: u16) -> f32 {
        let volts = self.millivolts(raw) as f32 / 1000.0;
        self.scale_kpa_per_v * (volts - self.offset_v)
    }
}
