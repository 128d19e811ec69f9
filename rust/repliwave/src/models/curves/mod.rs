//! Closed-form peak shapes that can be fitted to a region of signal.

mod flat_topped_gaussian;
mod gaussian;

pub use flat_topped_gaussian::FlatToppedGaussian;
pub use gaussian::Gaussian;

use crate::errors::CurveModelError;

pub trait PeakCurve: Sized {
    /// Number of entries in the parameter vector.
    const NUM_PARAMETERS: usize;

    fn from_parameters(parameters: &[f64]) -> Result<Self, CurveModelError>;
    fn parameters(&self) -> Vec<f64>;
    fn height(&self) -> f64;

    fn value(&self, x: f64) -> f64;

    /// The two x values where the curve reaches `y`, smaller first.
    /// `None` when the curve never reaches `y`.
    fn inverse(&self, y: f64) -> Option<(f64, f64)>;

    fn full_width_at_half_max(&self) -> f64;

    /// Width at `percent` of the peak height, 0 when undefined.
    fn full_width_at_percent_of_max(&self, percent: f64) -> f64 {
        self.inverse(percent * self.height() / 100.0)
            .map_or(0.0, |(smaller, larger)| larger - smaller)
    }
}

pub(crate) fn check_parameter_count(
    parameters: &[f64],
    expected: usize,
) -> Result<(), CurveModelError> {
    if parameters.len() != expected {
        return Err(CurveModelError::WrongParameterCount {
            expected,
            found: parameters.len(),
        });
    }
    Ok(())
}

/// Shared guard for the inverse of Gaussian-like curves.
pub(crate) fn inverse_is_defined(height: f64, y: f64) -> bool {
    if y.abs() > height.abs() || height == 0.0 || y == 0.0 {
        return false;
    }
    !((y < 0.0 && height > 0.0) || (y > 0.0 && height < 0.0))
}
