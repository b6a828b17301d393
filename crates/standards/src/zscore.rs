/// Standardized deviation of `value` from a reference population.
///
/// A zero standard deviation is a degenerate reference, not an error: it yields 0.
pub fn z_score(value: f64, mean: f64, sd: f64) -> f64 {
    if sd == 0.0 {
        return 0.0;
    }
    (value - mean) / sd
}
