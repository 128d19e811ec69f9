use serde::{
    Deserialize,
    Serialize,
};

use super::{
    Gaussian,
    PeakCurve,
    check_parameter_count,
    inverse_is_defined,
};
use crate::errors::CurveModelError;

/// Gaussian split at its centre with a plateau of `top_width` inserted.
///
/// A negative `top_width` removes that much of the middle of the curve
/// instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlatToppedGaussian {
    pub height: f64,
    pub center: f64,
    pub stdev: f64,
    pub top_width: f64,
}

impl FlatToppedGaussian {
    pub fn new(height: f64, center: f64, stdev: f64, top_width: f64) -> Self {
        Self {
            height,
            center,
            stdev,
            top_width,
        }
    }
}

impl PeakCurve for FlatToppedGaussian {
    const NUM_PARAMETERS: usize = 4;

    fn from_parameters(parameters: &[f64]) -> Result<Self, CurveModelError> {
        check_parameter_count(parameters, Self::NUM_PARAMETERS)?;
        Ok(Self::new(
            parameters[0],
            parameters[1],
            parameters[2],
            parameters[3],
        ))
    }

    fn parameters(&self) -> Vec<f64> {
        vec![self.height, self.center, self.stdev, self.top_width]
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn value(&self, x: f64) -> f64 {
        let half_top = self.top_width / 2.0;
        let top_lhs = self.center - half_top;
        let top_rhs = top_lhs + self.top_width;
        if x > top_lhs && x < top_rhs {
            return self.height;
        }
        let mapped_x = if x < self.center {
            x + half_top
        } else {
            x - half_top
        };
        let d = mapped_x - self.center;
        self.height * (-d * d / (2.0 * self.stdev * self.stdev)).exp()
    }

    fn inverse(&self, y: f64) -> Option<(f64, f64)> {
        if !inverse_is_defined(self.height, y) {
            return None;
        }
        let larger = self.center
            + Gaussian::half_span_at(self.height, self.stdev, y)
            + self.top_width / 2.0;
        let smaller = 2.0 * self.center - larger;
        Some((smaller, larger))
    }

    fn full_width_at_half_max(&self) -> f64 {
        if self.top_width >= 0.0 {
            return (2.0 * (2.0 * 2.0_f64.ln()).sqrt() * self.stdev).abs() + self.top_width;
        }
        let half_height = self.value(self.center) / 2.0;
        if half_height == 0.0 {
            return 0.0;
        }
        self.inverse(half_height)
            .map_or(0.0, |(smaller, larger)| larger - smaller)
    }
}
