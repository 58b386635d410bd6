//! Per-sensor pressure state

use super::{ExponentialAverage, LinearCalibration};

/// One pressure sensor's calibration and latest readings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressureChannel {
    calibration: LinearCalibration,
    average: ExponentialAverage,
    raw: Option<u16>,
    current_kpa: Option<f32>,
}

impl PressureChannel {
    pub fn new(calibration: LinearCalibration, filter_alpha: f32) -> Self {
        Self {
            calibration,
            average: ExponentialAverage::new(filter_alpha),
            raw: None,
            current_kpa: None,
        }
    }

    /// Record a raw ADC reading, returning the calibrated pressure
    pub fn record(&mut self, raw: u16) -> f32 {
        let kpa = self.calibration.pressure_kpa(raw);
        self.raw = Some(raw);
        self.current_kpa = Some(kpa);
        self.average.update(kpa);
        kpa
    }

    /// Latest raw reading
    pub fn raw(&self) -> Option<u16> {
        self.raw
    }

    /// Latest calibrated pressure
    pub fn current_kpa(&self) -> Option<f32> {
        self.current_kpa
    }

    /// Averaged pressure, `None` until the first sample
    pub fn average_kpa(&self) -> Option<f32> {
        self.average.value()
    }

    /// Averaged pressure as reported to the host, 0.0 until the first sample
    pub fn reported_kpa(&self) -> f32 {
        self.average_kpa().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> PressureChannel {
        let cal = LinearCalibration {
            adc_max: 1023,
            full_scale_mv: 5000,
            scale_kpa_per_v: 50.0,
            offset_v: 2.5,
        };
        PressureChannel::new(cal, 0.5)
    }

    #[test]
    fn test_unsampled_channel_reports_zero() {
        let ch = channel();
        assert_eq!(ch.raw(), None);
        assert_eq!(ch.average_kpa(), None);
        assert_eq!(ch.reported_kpa(), 0.0);
    }

    #[test]
    fn test_record_updates_all_views() {
        let mut ch = channel();
        assert_eq!(ch.record(1023), 125.0);
        assert_eq!(ch.raw(), Some(1023));
        assert_eq!(ch.current_kpa(), Some(125.0));
        assert_eq!(ch.average_kpa(), Some(125.0));

        ch.record(0);
        assert_eq!(ch.current_kpa(), Some(-125.0));
        assert_eq!(ch.reported_kpa(), 0.0);
    }
}
