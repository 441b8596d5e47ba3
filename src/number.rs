//! Exact rational numbers and the numeric coefficients used by the canonical form.
//!
//! Every literal that the parser reads (integers, decimals, scientific notation)
//! becomes an exact [`Rational`]. Floating point values only appear as
//! [`Numeric::Approx`] when a numeric fallback had to be used (for example
//! refined roots of an irreducible cubic).

use dashu::base::{Abs, Inverse, Signed as DashuSigned};
use dashu::integer::{IBig, UBig};
use dashu::rational::RBig;
use num_traits::{One, Zero};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::traits::FLOAT_TOLERANCE;

/// Largest exponent an exact power is evaluated for.
const MAX_EXACT_EXPONENT: u64 = 4096;

/// Largest prime tried when pulling perfect powers out of a radicand.
const MAX_TRIAL_FACTOR: u128 = 10_000;

/// An arbitrary precision rational number, always in lowest terms.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rational(RBig);

impl Rational {
    /// Rational from an integer.
    #[must_use]
    pub fn from_i64(n: i64) -> Self {
        Self(RBig::from(IBig::from(n)))
    }

    /// Rational `n / d`, `None` when `d == 0`.
    #[must_use]
    pub fn frac(n: i64, d: i64) -> Option<Self> {
        if d == 0 {
            return None;
        }
        let num = if d < 0 { -IBig::from(n) } else { IBig::from(n) };
        Some(Self(RBig::from_parts(num, UBig::from(d.unsigned_abs()))))
    }

    /// Rational from big integer parts, `None` when the denominator is zero.
    #[must_use]
    pub fn from_parts(num: IBig, den: UBig) -> Option<Self> {
        if den == UBig::ZERO {
            None
        } else {
            Some(Self(RBig::from_parts(num, den)))
        }
    }

    /// Rational from a big integer.
    #[must_use]
    pub fn from_ibig(n: IBig) -> Self {
        Self(RBig::from(n))
    }

    /// Parse a decimal literal such as `12`, `0.25`, `1e-3` or `2.5E10` exactly.
    #[must_use]
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(pos) => (&text[..pos], text[pos + 1..].parse::<i64>().ok()?),
            None => (text, 0),
        };
        if exponent.unsigned_abs() > MAX_EXACT_EXPONENT {
            return None;
        }
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let digits: String = int_part.chars().chain(frac_part.chars()).collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let num = IBig::from_str_radix(&digits, 10).ok()?;
        let scale = exponent - frac_part.len() as i64;
        let ten = UBig::from(10u8);
        let value = if scale >= 0 {
            RBig::from(num * IBig::from(ten.pow(scale as usize)))
        } else {
            RBig::from_parts(num, ten.pow(scale.unsigned_abs() as usize))
        };
        Some(Self(value))
    }

    #[must_use]
    pub fn numer(&self) -> &IBig {
        self.0.numerator()
    }

    #[must_use]
    pub fn denom(&self) -> &UBig {
        self.0.denominator()
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.0.denominator().is_one()
    }

    /// The value as an `i64`, if it is an integer that fits.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        if self.is_integer() {
            i64::try_from(self.numer().clone()).ok()
        } else {
            None
        }
    }

    /// Numerator and denominator as machine integers, if they fit.
    #[must_use]
    pub fn to_i128_parts(&self) -> Option<(i128, u128)> {
        let n = i128::try_from(self.numer().clone()).ok()?;
        let d = u128::try_from(self.denom().clone()).ok()?;
        Some((n, d))
    }

    #[must_use]
    pub fn signum(&self) -> i8 {
        if self.0.is_zero() {
            0
        } else if DashuSigned::is_positive(&self.0) {
            1
        } else {
            -1
        }
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        DashuSigned::is_negative(&self.0)
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        DashuSigned::is_positive(&self.0)
    }

    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.clone().abs())
    }

    /// `1 / self`, `None` for zero.
    #[must_use]
    pub fn checked_recip(&self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(Self(self.0.clone().inv()))
        }
    }

    /// `self / rhs`, `None` when dividing by zero.
    #[must_use]
    pub fn checked_div(&self, rhs: &Self) -> Option<Self> {
        rhs.checked_recip().map(|r| self * &r)
    }

    /// Integer power. `None` for `0^-n` and for exponents too large to evaluate.
    #[must_use]
    pub fn checked_pow(&self, exp: i64) -> Option<Self> {
        if exp.unsigned_abs() > MAX_EXACT_EXPONENT {
            return None;
        }
        if exp >= 0 {
            Some(Self(self.0.pow(exp as usize)))
        } else {
            let r = self.checked_recip()?;
            Some(Self(r.0.pow(exp.unsigned_abs() as usize)))
        }
    }

    /// Approximate value. Very large magnitudes may become infinite.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        let n = self.numer().to_string().parse::<f64>().unwrap_or(f64::NAN);
        let d = self.denom().to_string().parse::<f64>().unwrap_or(f64::NAN);
        n / d
    }

    /// `floor(self)` as an integer, if it fits.
    #[must_use]
    pub fn floor_i64(&self) -> Option<i64> {
        let (n, d) = self.to_i128_parts()?;
        let d = i128::try_from(d).ok()?;
        i64::try_from(n.div_euclid(d)).ok()
    }
}

impl Zero for Rational {
    fn zero() -> Self {
        Self(RBig::ZERO)
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Rational {
    fn one() -> Self {
        Self(RBig::ONE)
    }

    fn is_one(&self) -> bool {
        self.0 == RBig::ONE
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({self})")
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() {
            write!(f, "{}", self.numer())
        } else {
            write!(f, "{}/{}", self.numer(), self.denom())
        }
    }
}

impl Add for Rational {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Add for &Rational {
    type Output = Rational;
    fn add(self, rhs: Self) -> Rational {
        Rational(&self.0 + &rhs.0)
    }
}

impl Sub for Rational {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Sub for &Rational {
    type Output = Rational;
    fn sub(self, rhs: Self) -> Rational {
        Rational(&self.0 - &rhs.0)
    }
}

impl Mul for Rational {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Mul for &Rational {
    type Output = Rational;
    fn mul(self, rhs: Self) -> Rational {
        Rational(&self.0 * &rhs.0)
    }
}

impl Neg for Rational {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational(-self.0.clone())
    }
}

/// Split `n = outside^q * inside` pulling out every perfect `q`-th power
/// that trial division up to a fixed bound (plus a final perfect-power check) can find.
#[must_use]
pub fn extract_perfect_power(n: u128, q: u32) -> (u128, u128) {
    if n <= 1 || q <= 1 {
        return if q <= 1 { (n, 1) } else { (1, n) };
    }
    let mut outside: u128 = 1;
    let mut inside = n;
    let mut p: u128 = 2;
    while p <= MAX_TRIAL_FACTOR {
        let Some(pq) = p.checked_pow(q) else { break };
        if pq > inside {
            break;
        }
        while inside % pq == 0 {
            inside /= pq;
            outside = outside.saturating_mul(p);
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if inside > 1
        && let Some(r) = exact_integer_root(inside, q)
    {
        outside = outside.saturating_mul(r);
        inside = 1;
    }
    (outside, inside)
}

/// `Some(r)` when `r^q == n` exactly.
#[must_use]
pub fn exact_integer_root(n: u128, q: u32) -> Option<u128> {
    if q == 0 {
        return None;
    }
    let guess = (n as f64).powf(1.0 / f64::from(q)).round() as u128;
    let lo = guess.saturating_sub(1);
    (lo..=guess + 1).find(|r| r.checked_pow(q) == Some(n))
}

/// A numeric coefficient: exact when possible, approximate after a float crept in.
#[derive(Clone, Debug)]
pub enum Numeric {
    Exact(Rational),
    Approx(f64),
}

impl Numeric {
    #[must_use]
    pub fn one() -> Self {
        Numeric::Exact(Rational::one())
    }

    #[must_use]
    pub fn zero() -> Self {
        Numeric::Exact(Rational::zero())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Numeric::Exact(r) => r.is_zero(),
            Numeric::Approx(f) => *f == 0.0,
        }
    }

    #[must_use]
    pub fn is_one(&self) -> bool {
        match self {
            Numeric::Exact(r) => r.is_one(),
            Numeric::Approx(_) => false,
        }
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Numeric::Exact(r) => r.is_negative(),
            Numeric::Approx(f) => *f < 0.0,
        }
    }

    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match self {
            Numeric::Exact(r) => r.to_f64(),
            Numeric::Approx(f) => *f,
        }
    }

    #[must_use]
    pub fn add(&self, other: &Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => Numeric::Exact(a + b),
            _ => Numeric::Approx(self.to_f64() + other.to_f64()),
        }
    }

    #[must_use]
    pub fn mul(&self, other: &Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Exact(a), Numeric::Exact(b)) => Numeric::Exact(a * b),
            _ => Numeric::Approx(self.to_f64() * other.to_f64()),
        }
    }

    #[must_use]
    pub fn neg(&self) -> Numeric {
        match self {
            Numeric::Exact(a) => Numeric::Exact(-a),
            Numeric::Approx(f) => Numeric::Approx(-f),
        }
    }

    /// Approximate values within tolerance of zero count as zero.
    #[must_use]
    pub fn is_negligible(&self) -> bool {
        match self {
            Numeric::Exact(r) => r.is_zero(),
            Numeric::Approx(f) => f.abs() < FLOAT_TOLERANCE,
        }
    }
}
