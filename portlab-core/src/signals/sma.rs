//! Simple Moving Average over a close series.
//!
//! First valid value at index period-1; earlier entries are NaN.

/// Rolling mean of `closes` over `period` values.
pub fn sma(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum: f64 = closes[..period].iter().sum();
    result[period - 1] = sum / period as f64;

    for i in period..n {
        sum += closes[i] - closes[i - period];
        result[i] = sum / period as f64;
    }

    result
}
