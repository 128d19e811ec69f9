use crate::errors::DataProcessingError;

/// Slides `kernel` over `signal`, centred on each sample.
///
/// The output has the signal's length. Kernel taps falling outside the
/// signal are dropped (zero padding), so responses near the edges are partial
/// sums.
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>, DataProcessingError> {
    if kernel.len() % 2 != 1 {
        return Err(DataProcessingError::MisalignedKernel {
            kernel_len: kernel.len(),
        });
    }
    let half = kernel.len() / 2;
    let n = signal.len();
    let out = (0..n)
        .map(|i| {
            // Taps k with 0 <= i + k - half < n
            let k_start = half.saturating_sub(i);
            let k_end = kernel.len().min(n + half - i);
            (k_start..k_end)
                .map(|k| kernel[k] * signal[i + k - half])
                .sum()
        })
        .collect();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::ricker_kernel;

    #[test]
    fn test_even_kernel_is_rejected() {
        let err = convolve_same(&[1.0, 2.0, 3.0], &[1.0, 1.0]).unwrap_err();
        assert_eq!(err, DataProcessingError::MisalignedKernel { kernel_len: 2 });
        assert!(convolve_same(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_identity_kernel() {
        let signal = vec![1.0, -2.0, 3.5, 4.0];
        assert_eq!(convolve_same(&signal, &[0.0, 1.0, 0.0]).unwrap(), signal);
    }

    #[test]
    fn test_edges_are_partial_sums() {
        let out = convolve_same(&[1.0, 1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(out, vec![2.0, 3.0, 3.0, 2.0]);
    }

    #[test]
    fn test_kernel_longer_than_signal() {
        let out = convolve_same(&[1.0, 2.0], &[1.0, 1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(out, vec![3.0, 3.0]);
    }

    #[test]
    fn test_constant_signal_has_near_zero_interior_response() {
        let width = 40;
        let kernel = ricker_kernel(1.0 / width as f64, width + 1);
        let signal = vec![3.0; 400];
        let response = convolve_same(&signal, &kernel.y_values).unwrap();
        let peak_kernel_response: f64 = kernel.y_values.iter().map(|k| k.abs() * 3.0).sum();
        for value in &response[width..400 - width] {
            assert!(
                value.abs() < 0.05 * peak_kernel_response,
                "interior response {} is not near zero",
                value
            );
        }
    }
}
