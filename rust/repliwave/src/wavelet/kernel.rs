use std::f64::consts::PI;

/// Sampled Ricker (Mexican hat) wavelet.
#[derive(Debug, Clone, PartialEq)]
pub struct RickerKernel {
    pub x_values: Vec<f64>,
    pub y_values: Vec<f64>,
}

/// Samples `y = (1 - 2 pi^2 x^2) exp(-pi^2 x^2) * peak_height` at
/// `number_of_points` evenly spaced x values spanning [-1, 1].
///
/// Fewer than two points gives an empty kernel.
pub fn ricker_kernel(peak_height: f64, number_of_points: usize) -> RickerKernel {
    if number_of_points <= 1 {
        return RickerKernel {
            x_values: Vec::new(),
            y_values: Vec::new(),
        };
    }
    let x_delta = 2.0 / (number_of_points - 1) as f64;
    let pi_squared = PI * PI;
    let (x_values, y_values) = (0..number_of_points)
        .map(|i| {
            let x = x_delta * i as f64 - 1.0;
            let square_product = pi_squared * x * x;
            let y = (1.0 - 2.0 * square_product) * (-square_product).exp() * peak_height;
            (x, y)
        })
        .unzip();
    RickerKernel { x_values, y_values }
}
