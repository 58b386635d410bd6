//! Property tests for calibration, averaging and regulation

use pneumo_core::config::CalibrationConfig;
use pneumo_core::regulation::{PumpPolarity, PumpRegulator};
use pneumo_core::sensor::{ExponentialAverage, LinearCalibration};
use proptest::prelude::*;

proptest! {
    #[test]
    fn calibration_is_monotonic(a in 0u16..=u16::MAX, b in 0u16..=u16::MAX, offset in 0.0f32..5.0) {
        let cal = LinearCalibration::from_config(&CalibrationConfig::DEFAULT, offset);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cal.millivolts(lo) <= cal.millivolts(hi));
        prop_assert!(cal.pressure_kpa(lo) <= cal.pressure_kpa(hi));
    }

    #[test]
    fn millivolts_never_exceed_full_scale(raw in 0u16..=u16::MAX) {
        let cal = LinearCalibration::from_config(&CalibrationConfig::DEFAULT, 2.5);
        prop_assert!(cal.millivolts(raw) <= CalibrationConfig::DEFAULT.full_scale_mv);
    }

    #[test]
    fn average_stays_within_sample_range(
        alpha in 0.01f32..=1.0,
        samples in prop::collection::vec(-500.0f32..500.0, 1..64),
    ) {
        let mut avg = ExponentialAverage::new(alpha);
        let mut lo = f32::MAX;
        let mut hi = f32::MIN;
        for s in samples {
            lo = lo.min(s);
            hi = hi.max(s);
            let v = avg.update(s);
            prop_assert!(v >= lo - 1e-2 && v <= hi + 1e-2);
        }
    }

    #[test]
    fn pressure_pump_respects_band(
        setpoint in -100.0f32..100.0,
        hysteresis in 0.0f32..5.0,
        readings in prop::collection::vec(-150.0f32..150.0, 1..64),
    ) {
        let mut reg = PumpRegulator::new(PumpPolarity::Pressure, hysteresis);
        for measured in readings {
            let driving = reg.update(setpoint, measured);
            if measured < setpoint - hysteresis {
                prop_assert!(driving);
            }
            if measured > setpoint {
                prop_assert!(!driving);
            }
        }
    }

    #[test]
    fn vacuum_pump_respects_band(
        setpoint in -100.0f32..100.0,
        hysteresis in 0.0f32..5.0,
        readings in prop::collection::vec(-150.0f32..150.0, 1..64),
    ) {
        let mut reg = PumpRegulator::new(PumpPolarity::Vacuum, hysteresis);
        for measured in readings {
            let driving = reg.update(setpoint, measured);
            if measured > setpoint + hysteresis {
                prop_assert!(driving);
            }
            if measured < setpoint {
                prop_assert!(!driving);
            }
        }
    }
}
