//! Binomial coefficients and binomial probabilities over f64.

/// C(n, k) as a float, 0 outside `0 ≤ k ≤ n`.
///
/// Uses the multiplicative recurrence over `min(k, n − k)` factors, dividing at
/// every step so intermediate values stay ratios rather than factorials. This is
/// exact for small arguments and stays finite for n in the tens of thousands
/// when k is small.
pub fn binomial(n: i64, k: i64) -> f64 {
    if k < 0 || k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    let mut r = 1.0;
    for i in 0..k {
        r = r * (n - i) as f64 / (i + 1) as f64;
    }
    r
}

/// P(X = k) for X ~ Binomial(n, p).
#[inline]
pub fn binomial_pmf(n: i64, k: i64, p: f64) -> f64 {
    if k < 0 || k > n {
        return 0.0;
    }
    binomial(n, k) * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32)
}
