/// Measures how alike neighbouring entries of `values` are.
///
/// Compares the mean adjacent difference `D` with the value a sorted sequence
/// would give (`S = (max - min) / (n - 1)`) and with the all-pairs mean
/// difference `P`, the expectation for a random ordering:
///
/// `1 - (D - S) / (P - S)`
///
/// 1 means perfectly ordered, around 0 random, negative anti-ordered.
/// Fewer than three values gives 0. When `P == S` (for instance every value
/// equal) the metric is undefined and `f64::NAN` is returned.
pub fn adjacent_value_similarity(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }

    let adjacent: f64 = values.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    let adjacent_mean = adjacent / (n - 1) as f64;

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let sorted_mean = (max - min) / (n - 1) as f64;

    let mut pair_sum = 0.0;
    let mut pair_count = 0usize;
    for (i, a) in values.iter().enumerate() {
        for b in &values[i + 1..] {
            pair_sum += (a - b).abs();
            pair_count += 1;
        }
    }
    let pair_mean = pair_sum / pair_count as f64;

    let denominator = pair_mean - sorted_mean;
    if denominator == 0.0 {
        return f64::NAN;
    }
    1.0 - (adjacent_mean - sorted_mean) / denominator
}
