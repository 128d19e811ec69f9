mod convolution;
mod kernel;

pub use convolution::convolve_same;
pub use kernel::{
    RickerKernel,
    ricker_kernel,
};

/// Fraction of the Ricker kernel span covered by its positive lobe.
pub const POSITIVE_LOBE_FRACTION: f64 = 0.225;

/// Converts a positive-lobe width in kb into a kernel width in bins.
///
/// Always even, so the kernel built from `width + 1` points has a centre tap.
pub fn kernel_width_bins(peak_width_kb: f64, bin_size_kb: f64) -> usize {
    let half_width_kb = peak_width_kb / (POSITIVE_LOBE_FRACTION * 2.0);
    let half_bins = (half_width_kb / bin_size_kb).round();
    if half_bins.is_finite() && half_bins > 0.0 {
        2 * half_bins as usize
    } else {
        0
    }
}

/// Kernel used for a dataset-wide analysis at `width_bins`.
pub fn dataset_kernel(width_bins: usize) -> RickerKernel {
    ricker_kernel(1.0 / width_bins as f64, width_bins + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_width_bins() {
        // 200 / 0.45 = 444 kb half width, 8.9 bins rounds to 9
        assert_eq!(kernel_width_bins(200.0, 50.0), 18);
        assert_eq!(kernel_width_bins(1000.0, 50.0) % 2, 0);
        assert_eq!(kernel_width_bins(0.0, 50.0), 0);
    }

    #[test]
    fn test_dataset_kernel_is_odd() {
        let kernel = dataset_kernel(18);
        assert_eq!(kernel.y_values.len(), 19);
        assert!((kernel.y_values[9] - 1.0 / 18.0).abs() < 1e-12);
    }
}
