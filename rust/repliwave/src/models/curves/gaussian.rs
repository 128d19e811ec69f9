use serde::{
    Deserialize,
    Serialize,
};

use super::{
    PeakCurve,
    check_parameter_count,
    inverse_is_defined,
};
use crate::errors::CurveModelError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub height: f64,
    pub center: f64,
    pub stdev: f64,
}

impl Gaussian {
    pub fn new(height: f64, center: f64, stdev: f64) -> Self {
        Self {
            height,
            center,
            stdev,
        }
    }

    /// Distance from the centre at which the curve falls to `y`.
    pub(crate) fn half_span_at(height: f64, stdev: f64, y: f64) -> f64 {
        (-2.0 * stdev * stdev * (y / height).ln()).sqrt()
    }
}

impl PeakCurve for Gaussian {
    const NUM_PARAMETERS: usize = 3;

    fn from_parameters(parameters: &[f64]) -> Result<Self, CurveModelError> {
        check_parameter_count(parameters, Self::NUM_PARAMETERS)?;
        Ok(Self::new(parameters[0], parameters[1], parameters[2]))
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.height, self.center, self.stdev]
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn value(&self, x: f64) -> f64 {
        let d = x - self.center;
        self.height * (-d * d / (2.0 * self.stdev * self.stdev)).exp()
    }

    fn inverse(&self, y: f64) -> Option<(f64, f64)> {
        if !inverse_is_defined(self.height, y) {
            return None;
        }
        let larger = self.center + Self::half_span_at(self.height, self.stdev, y);
        let smaller = 2.0 * self.center - larger;
        Some((smaller, larger))
    }

    fn full_width_at_half_max(&self) -> f64 {
        let half_height = self.value(self.center) / 2.0;
        if half_height == 0.0 {
            return 0.0;
        }
        self.inverse(half_height)
            .map_or(0.0, |(smaller, larger)| larger - smaller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_round_trip() {
        let params = [(1.0, 0.0, 1.0), (12.5, 40.0, 3.2), (-4.0, -10.0, 0.7)];
        for (h, c, s) in params {
            let g = Gaussian::new(h, c, s);
            for x0 in [c - 2.5 * s, c - 0.3 * s, c + 0.1 * s, c + 1.7 * s] {
                let (smaller, larger) = g.inverse(g.value(x0)).unwrap();
                let hit = (smaller - x0).abs() < 1e-9 || (larger - x0).abs() < 1e-9;
                assert!(hit, "x0={} gave ({}, {})", x0, smaller, larger);
                assert!(smaller <= larger);
            }
        }
    }

    #[test]
    fn test_inverse_undefined() {
        let g = Gaussian::new(2.0, 0.0, 1.0);
        assert_eq!(g.inverse(3.0), None);
        assert_eq!(g.inverse(-1.0), None);
        assert_eq!(g.inverse(0.0), None);
        assert_eq!(Gaussian::new(0.0, 0.0, 1.0).inverse(0.0), None);
        assert_eq!(Gaussian::new(-2.0, 0.0, 1.0).inverse(1.0), None);
    }

    #[test]
    fn test_fwhm() {
        let g = Gaussian::new(5.0, 3.0, 2.0);
        let expected = 2.0 * (2.0 * 2.0_f64.ln()).sqrt() * 2.0;
        assert!((g.full_width_at_half_max() - expected).abs() < 1e-9);
        assert_eq!(Gaussian::new(0.0, 3.0, 2.0).full_width_at_half_max(), 0.0);
    }

    #[test]
    fn test_full_width_at_percent() {
        let g = Gaussian::new(5.0, 3.0, 2.0);
        assert!((g.full_width_at_percent_of_max(50.0) - g.full_width_at_half_max()).abs() < 1e-9);
        assert_eq!(g.full_width_at_percent_of_max(100.0), 0.0);
        assert_eq!(g.full_width_at_percent_of_max(150.0), 0.0);
    }

    #[test]
    fn test_wrong_parameter_count() {
        assert_eq!(
            Gaussian::from_parameters(&[1.0, 2.0]).unwrap_err(),
            CurveModelError::WrongParameterCount {
                expected: 3,
                found: 2
            }
        );
        let g = Gaussian::from_parameters(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(g.parameters(), vec![1.0, 2.0, 3.0]);
    }
}
