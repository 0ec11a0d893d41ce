//! Sample standard deviation over a price window.
//!
//! STDDEV = sqrt(sum((V[j] - mean)^2) / (n - 1)), undefined for n < 2.

/// Mean and sample standard deviation of a window of at least two values.
pub(crate) fn mean_and_sample_std(window: &[f64]) -> (f64, f64) {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / (n - 1.0);
    (mean, variance.sqrt())
}
