//! Exponential moving average for pressure readings

/// Exponential moving average
///
/// `avg += alpha * (sample - avg)`. The first sample seeds the average so
/// the output does not ramp up from zero after boot.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExponentialAverage {
    alpha: f32,
    value: Option<f32>,
}

impl ExponentialAverage {
    /// Create an empty average with weight `alpha` for new samples
    ///
    /// `alpha` is clamped to (0, 1]; 1.0 disables smoothing.
    pub fn new(alpha: f32) -> Self {
        let alpha = if alpha.is_nan() {
            1.0
        } else {
            alpha.clamp(f32::EPSILON, 1.0)
        };
        Self { alpha, value: None }
    }

    /// Fold in a sample and return the new average
    pub fn update(&mut self, sample: f32) -> f32 {
        let next = match self.value {
            Some(avg) => avg + self.alpha * (sample - avg),
            None => sample,
        };
        self.value = Some(next);
        next
    }

    /// Current average, `None` before the first sample
    pub fn value(&self) -> Option<f32> {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_seeds() {
        let mut avg = ExponentialAverage::new(0.1);
        assert_eq!(avg.value(), None);
        assert_eq!(avg.update(20.0), 20.0);
    }

    #[test]
    fn test_converges_toward_step() {
        let mut avg = ExponentialAverage::new(0.5);
        avg.update(0.0);
        assert_eq!(avg.update(10.0), 5.0);
        assert_eq!(avg.update(10.0), 7.5);
        for _ in 0..30 {
            avg.update(10.0);
        }
        assert!(10.0 - avg.value().unwrap() < 1e-3);
    }

    #[test]
    fn test_alpha_one_tracks_input() {
        let mut avg = ExponentialAverage::new(1.0);
        avg.update(3.0);
        assert_eq!(avg.update(-7.0), -7.0);
    }

    #[test]
    fn test_alpha_clamped() {
        let mut avg = ExponentialAverage::new(5.0);
        avg.update(1.0);
        assert_eq!(avg.update(2.0), 2.0);

        let mut avg = ExponentialAverage::new(f32::NAN);
        avg.update(1.0);
        assert_eq!(avg.update(2.0), 2.0);
    }
}
