//! Floating point tolerance helpers shared by the numeric fallbacks.

/// Default tolerance for floating-point comparisons
pub(crate) const FLOAT_TOLERANCE: f64 = 1e-10;

/// Tolerance used when deciding whether a numerically refined root is real.
pub(crate) const IMAG_TOLERANCE: f64 = 1e-9;

/// Check if a float is approximately zero (within tolerance)
#[inline]
pub(crate) fn is_zero(n: f64) -> bool {
    n.abs() < FLOAT_TOLERANCE
}

/// Check if two floats agree within a tolerance relative to their size
#[inline]
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOAT_TOLERANCE * (1.0 + a.abs().max(b.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_zero() {
        assert!(is_zero(0.0));
        assert!(is_zero(1e-11));
        assert!(is_zero(-1e-11));
        assert!(!is_zero(0.1));
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(1.0, 1.0 + 1e-12));
        assert!(approx_eq(1e6, 1e6 + 1e-5));
        assert!(!approx_eq(1.0, 1.001));
    }
}
