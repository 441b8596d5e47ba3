//! Polynomial views of expressions
//!
//! Degrees and coefficients are read off the expanded form, so
//! `(x + 1)**2 - x**2` has degree 1 in `x`. [`UniPoly`] is the exact
//! univariate polynomial over the rationals the equation solver factors.

use dashu::integer::IBig;
use num_complex::Complex64;
use num_traits::{One, Zero};

use crate::ast::ExprKind;
use crate::error::SolveError;
use crate::number::Rational;
use crate::simplification::expand;
use crate::{Expr, Symbol};

const LEADING_ZERO_TOL: f64 = 1.0e-12;
const RESULT_ZERO_TOL: f64 = 1.0e-10;
const MAX_ROOT_ITERATIONS: usize = 500;
/// Relative Durand-Kerner step below which the iteration has settled.
const STEP_TOL: f64 = 1.0e-14;
/// Relative residual accepted from an iteration that ran out of rounds.
const RESIDUAL_TOL: f64 = 1.0e-9;
const SEED_ROTATION: f64 = 0.4;
/// Constant terms above this are not searched for rational roots.
const MAX_DIVISOR_SEARCH: i128 = 1_000_000_000_000;

/// Degree in `var` of an expression that is already expanded.
fn structural_degree(e: &Expr, var: &Symbol) -> Option<u32> {
    if e.is_free_of(var) {
        return Some(0);
    }
    match e.kind() {
        ExprKind::Symbol(_) => Some(1),
        ExprKind::Sum(terms) => terms
            .iter()
            .try_fold(0, |acc, t| Some(acc.max(structural_degree(t, var)?))),
        ExprKind::Product(factors) => factors
            .iter()
            .try_fold(0u32, |acc, f| acc.checked_add(structural_degree(f, var)?)),
        ExprKind::Pow(base, exp) => {
            let n = u32::try_from(exp.as_rational()?.to_i64()?).ok()?;
            structural_degree(base, var)?.checked_mul(n)
        }
        _ => None,
    }
}

/// Degree of `e` as a polynomial in `var`, `None` if it is not one.
pub fn degree_in(e: &Expr, var: &Symbol) -> Option<u32> {
    structural_degree(&expand(e), var)
}

/// Largest total degree over all free variables, `None` if `e` is not a
/// polynomial in every one of them.
pub fn total_degree(e: &Expr) -> Option<u32> {
    let expanded = expand(e);
    let vars = expanded.free_symbols();
    let terms = match expanded.kind() {
        ExprKind::Sum(ts) => ts.clone(),
        _ => vec![expanded.clone()],
    };
    terms.iter().try_fold(0, |acc, t| {
        let d = vars
            .iter()
            .try_fold(0u32, |sum, v| sum.checked_add(structural_degree(t, v)?))?;
        Some(acc.max(d))
    })
}

/// Whether `e` is a polynomial in each of `vars`.
pub fn is_polynomial_in(e: &Expr, vars: &[Symbol]) -> bool {
    let expanded = expand(e);
    vars.iter().all(|v| structural_degree(&expanded, v).is_some())
}

/// Coefficients of `e` in `var`, lowest power first.
pub fn coefficients(e: &Expr, var: &Symbol) -> Option<Vec<Expr>> {
    let expanded = expand(e);
    let degree = structural_degree(&expanded, var)? as usize;
    let mut buckets: Vec<Vec<Expr>> = vec![Vec::new(); degree + 1];
    let terms = match expanded.kind() {
        ExprKind::Sum(ts) => ts.clone(),
        _ => vec![expanded.clone()],
    };
    for t in terms {
        let k = structural_degree(&t, var)?;
        let coeff = Expr::product(vec![t, Expr::pow(var.to_expr(), Expr::integer(-i64::from(k)))]);
        if !coeff.is_free_of(var) {
            return None;
        }
        buckets[k as usize].push(coeff);
    }
    Some(buckets.into_iter().map(Expr::sum).collect())
}

fn rational_from_i128(n: i128) -> Rational {
    Rational::from_ibig(IBig::from(n))
}

fn gcd_i128(mut a: i128, mut b: i128) -> i128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.abs()
}

fn positive_divisors(n: i128) -> Vec<i128> {
    let n = n.abs();
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1;
    while d * d <= n {
        if n % d == 0 {
            small.push(d);
            if d * d != n {
                large.push(n / d);
            }
        }
        d += 1;
    }
    small.extend(large.into_iter().rev());
    small
}

/// Snap tiny real/imaginary parts to zero.
pub(crate) fn canonicalize_root(z: Complex64) -> Complex64 {
    if !z.re.is_finite() || !z.im.is_finite() {
        return z;
    }
    let mut real = z.re;
    let mut imag = z.im;
    let scale = 1.0 + real.abs();
    if imag.abs() <= RESULT_ZERO_TOL * scale {
        imag = 0.0;
    }
    if real.abs() <= RESULT_ZERO_TOL {
        real = 0.0;
    }
    Complex64::new(real, imag)
}

/// Exact univariate polynomial with rational coefficients, lowest power first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniPoly {
    coeffs: Vec<Rational>,
}

impl UniPoly {
    pub fn new(mut coeffs: Vec<Rational>) -> Self {
        while coeffs.last().is_some_and(Zero::is_zero) {
            coeffs.pop();
        }
        Self { coeffs }
    }

    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    pub fn constant(c: Rational) -> Self {
        Self::new(vec![c])
    }

    /// `x - root`
    pub fn linear_factor(root: &Rational) -> Self {
        Self::new(vec![-root, Rational::one()])
    }

    /// Read `e` as a polynomial in `var` with rational coefficients.
    pub fn from_expr(e: &Expr, var: &Symbol) -> Option<Self> {
        let coeffs = coefficients(e, var)?
            .iter()
            .map(|c| c.as_rational().cloned())
            .collect::<Option<Vec<_>>>()?;
        Some(Self::new(coeffs))
    }

    pub fn coeffs(&self) -> &[Rational] {
        &self.coeffs
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree; the zero polynomial reports 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn leading(&self) -> Rational {
        self.coeffs.last().cloned().unwrap_or_default()
    }

    pub fn to_expr(&self, var: &Symbol) -> Expr {
        Expr::sum(
            self.coeffs
                .iter()
                .enumerate()
                .filter(|(_, c)| !c.is_zero())
                .map(|(k, c)| {
                    Expr::product(vec![
                        Expr::rational(c.clone()),
                        Expr::pow(var.to_expr(), Expr::integer(k as i64)),
                    ])
                })
                .collect(),
        )
    }

    /// Horner evaluation.
    pub fn eval(&self, x: &Rational) -> Rational {
        self.coeffs
            .iter()
            .rev()
            .fold(Rational::zero(), |acc, c| &(&acc * x) + c)
    }

    pub fn derivative(&self) -> Self {
        Self::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(k, c)| c * &Rational::from_i64(k as i64))
                .collect(),
        )
    }

    pub fn scale(&self, s: &Rational) -> Self {
        Self::new(self.coeffs.iter().map(|c| c * s).collect())
    }

    pub fn add(&self, other: &Self) -> Self {
        let n = self.coeffs.len().max(other.coeffs.len());
        Self::new(
            (0..n)
                .map(|i| {
                    let a = self.coeffs.get(i).cloned().unwrap_or_default();
                    let b = other.coeffs.get(i).cloned().unwrap_or_default();
                    a + b
                })
                .collect(),
        )
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.scale(&Rational::from_i64(-1)))
    }

    pub fn mul(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let mut out = vec![Rational::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] = &out[i + j] + &(a * b);
            }
        }
        Self::new(out)
    }

    /// Quotient and remainder, `None` when dividing by zero.
    pub fn divrem(&self, divisor: &Self) -> Option<(Self, Self)> {
        if divisor.is_zero() {
            return None;
        }
        let lead = divisor.leading();
        let dd = divisor.degree();
        let mut rem = self.coeffs.clone();
        if rem.len() <= dd {
            return Some((Self::zero(), self.clone()));
        }
        let mut quot = vec![Rational::zero(); rem.len() - dd];
        for k in (0..quot.len()).rev() {
            let c = rem[k + dd].checked_div(&lead)?;
            if !c.is_zero() {
                for (j, d) in divisor.coeffs.iter().enumerate() {
                    rem[k + j] = &rem[k + j] - &(&c * d);
                }
            }
            quot[k] = c;
        }
        rem.truncate(dd);
        Some((Self::new(quot), Self::new(rem)))
    }

    pub fn monic(&self) -> Self {
        match self.leading().checked_recip() {
            Some(inv) => self.scale(&inv),
            None => self.clone(),
        }
    }

    /// Monic greatest common divisor.
    pub fn gcd(&self, other: &Self) -> Self {
        let (mut a, mut b) = (self.clone(), other.clone());
        while !b.is_zero() {
            let Some((_, r)) = a.divrem(&b) else { break };
            a = b;
            b = r;
        }
        a.monic()
    }

    /// The polynomial with every repeated factor reduced to multiplicity one.
    pub fn square_free(&self) -> Self {
        let g = self.gcd(&self.derivative());
        if g.degree() == 0 {
            return self.clone();
        }
        self.divrem(&g).map_or_else(|| self.clone(), |(q, _)| q)
    }

    /// Integer coefficients with no common factor, if they fit machine integers.
    fn primitive_integer_coeffs(&self) -> Option<Vec<i128>> {
        let mut scale = Rational::one();
        for c in &self.coeffs {
            let den = Rational::from_ibig(IBig::from(c.denom().clone()));
            if !(&scale * &den.checked_recip()?).is_integer() {
                scale = &scale * &den;
            }
        }
        let ints = self
            .coeffs
            .iter()
            .map(|c| {
                let (n, d) = (c * &scale).to_i128_parts()?;
                (d == 1).then_some(n)
            })
            .collect::<Option<Vec<i128>>>()?;
        let g = ints.iter().fold(0, |acc, &n| gcd_i128(acc, n));
        if g <= 1 {
            return Some(ints);
        }
        Some(ints.into_iter().map(|n| n / g).collect())
    }

    /// Distinct rational roots and the factor left once they are divided out
    /// with full multiplicity.
    pub fn extract_rational_roots(&self) -> (Vec<Rational>, Self) {
        let mut roots = Vec::new();
        let mut rest = self.clone();
        if rest.degree() == 0 {
            return (roots, rest);
        }

        // x = 0
        let zeros = rest.coeffs.iter().take_while(|c| c.is_zero()).count();
        if zeros > 0 {
            roots.push(Rational::zero());
            rest = Self::new(rest.coeffs[zeros..].to_vec());
        }

        let Some(ints) = rest.primitive_integer_coeffs() else {
            return (roots, rest);
        };
        let (Some(&a0), Some(&an)) = (ints.first(), ints.last()) else {
            return (roots, rest);
        };
        if a0.abs() > MAX_DIVISOR_SEARCH || an.abs() > MAX_DIVISOR_SEARCH {
            tracing::debug!("rational root search skipped, coefficients too large");
            return (roots, rest);
        }

        for p in positive_divisors(a0) {
            for q in positive_divisors(an) {
                if gcd_i128(p, q) != 1 {
                    continue;
                }
                for sign in [1, -1] {
                    if rest.degree() == 0 {
                        break;
                    }
                    let Some(candidate) = rational_from_i128(sign * p)
                        .checked_div(&rational_from_i128(q))
                    else {
                        continue;
                    };
                    let mut found = false;
                    while rest.degree() > 0 && rest.eval(&candidate).is_zero() {
                        rest = rest.deflate(&candidate);
                        found = true;
                    }
                    if found {
                        roots.push(candidate);
                    }
                }
            }
        }
        roots.sort();
        (roots, rest)
    }

    /// Divide out `(x - root)`.
    pub fn deflate(&self, root: &Rational) -> Self {
        self.divrem(&Self::linear_factor(root))
            .map_or_else(|| self.clone(), |(q, _)| q)
    }

    /// All complex roots, numerically, by Durand-Kerner iteration on the
    /// square-free part. Sorted by real then imaginary part.
    ///
    /// Starting points sit on a circle of the Cauchy root bound, rotated off
    /// the real axis.
    ///
    /// # Errors
    /// `SolveFailure` when the iteration does not settle on finite roots
    /// with small residuals.
    pub fn numeric_roots(&self) -> Result<Vec<Complex64>, SolveError> {
        let sf = self.square_free();
        let mut coeffs: Vec<Complex64> = sf
            .coeffs
            .iter()
            .rev()
            .map(|c| Complex64::new(c.to_f64(), 0.0))
            .collect();
        if coeffs.iter().any(|c| !c.re.is_finite()) {
            return Err(SolveError::failure(
                "Polynomial coefficients exceed floating point range",
            ));
        }
        let scale = coeffs.iter().map(|c| c.norm()).fold(0.0_f64, f64::max);
        let tol = if scale == 0.0 {
            LEADING_ZERO_TOL
        } else {
            LEADING_ZERO_TOL * scale
        };
        let first_nonzero = coeffs
            .iter()
            .position(|c| c.norm() > tol)
            .unwrap_or(coeffs.len());
        coeffs = coeffs.split_off(first_nonzero);
        if coeffs.len() <= 1 {
            return Ok(Vec::new());
        }
        let lead = coeffs[0];
        let monic: Vec<Complex64> = coeffs.iter().map(|c| c / lead).collect();
        let degree = monic.len() - 1;

        let eval = |z: Complex64| monic.iter().fold(Complex64::new(0.0, 0.0), |acc, c| acc * z + c);
        let radius = 1.0 + monic[1..].iter().map(|c| c.norm()).fold(0.0_f64, f64::max);
        let mut roots: Vec<Complex64> = (0..degree)
            .map(|k| {
                let angle = std::f64::consts::TAU * k as f64 / degree as f64 + SEED_ROTATION;
                Complex64::from_polar(radius, angle)
            })
            .collect();

        let mut converged = false;
        for _ in 0..MAX_ROOT_ITERATIONS {
            let mut max_step = 0.0_f64;
            for i in 0..degree {
                let zi = roots[i];
                let denom = roots
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .fold(Complex64::new(1.0, 0.0), |acc, (_, zj)| acc * (zi - zj));
                if denom.norm() == 0.0 {
                    continue;
                }
                let step = eval(zi) / denom;
                roots[i] = zi - step;
                max_step = max_step.max(step.norm() / (1.0 + zi.norm()));
            }
            if !max_step.is_finite() {
                break;
            }
            if max_step < STEP_TOL {
                converged = true;
                break;
            }
        }

        for z in &roots {
            if !z.re.is_finite() || !z.im.is_finite() {
                return Err(SolveError::failure("Numeric root search diverged"));
            }
            // residual relative to the size of the terms it sums
            let magnitude = monic
                .iter()
                .fold(0.0_f64, |acc, c| acc * z.norm() + c.norm());
            if !converged && eval(*z).norm() > RESIDUAL_TOL * magnitude.max(1.0) {
                return Err(SolveError::failure("Numeric root search did not converge"));
            }
        }

        let mut out: Vec<Complex64> = roots.into_iter().map(canonicalize_root).collect();
        out.sort_by(|a, b| a.re.total_cmp(&b.re).then(a.im.total_cmp(&b.im)));
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    fn poly(input: &str) -> UniPoly {
        UniPoly::from_expr(&parse(input).unwrap(), &sym("x")).unwrap()
    }

    fn r(n: i64, d: i64) -> Rational {
        Rational::frac(n, d).unwrap()
    }

    #[test]
    fn test_degrees_use_expanded_form() {
        let x = sym("x");
        assert_eq!(degree_in(&parse("(x + 1)**2 - x**2").unwrap(), &x), Some(1));
        assert_eq!(degree_in(&parse("sin(x)").unwrap(), &x), None);
        assert_eq!(degree_in(&parse("y**3").unwrap(), &x), Some(0));
        assert_eq!(total_degree(&parse("x*y + 1").unwrap()), Some(2));
        assert_eq!(total_degree(&parse("x + 1/y").unwrap()), None);
    }

    #[test]
    fn test_symbolic_coefficients() {
        let x = sym("x");
        let c = coefficients(&parse("a*x**2 + b*x + c").unwrap(), &x).unwrap();
        assert_eq!(c, vec![sym("c").to_expr(), sym("b").to_expr(), sym("a").to_expr()]);
    }

    #[test]
    fn test_divrem_and_gcd() {
        let p = poly("x**3 - 1");
        let (q, rem) = p.divrem(&poly("x - 1")).unwrap();
        assert_eq!(q, poly("x**2 + x + 1"));
        assert!(rem.is_zero());
        assert_eq!(poly("x**2 - 1").gcd(&poly("x**2 + 2*x + 1")), poly("x + 1"));
    }

    #[test]
    fn test_rational_roots_with_multiplicity() {
        let (roots, rest) = poly("(x - 2)**2 * (2*x + 1) * (x**2 + 1)").extract_rational_roots();
        assert_eq!(roots, vec![r(-1, 2), r(2, 1)]);
        assert_eq!(rest.monic(), poly("x**2 + 1"));
        let (roots, _) = poly("x**3 - x").extract_rational_roots();
        assert_eq!(roots, vec![r(-1, 1), r(0, 1), r(1, 1)]);
    }

    #[test]
    fn test_numeric_roots_of_irreducible_cubic() {
        let roots = poly("x**3 - 2*x - 5").numeric_roots().unwrap();
        assert_eq!(roots.len(), 3);
        let real: Vec<_> = roots.iter().filter(|z| z.im == 0.0).collect();
        assert_eq!(real.len(), 1);
        assert!((real[0].re - 2.0945514815423265).abs() < 1e-9);
    }

    #[test]
    fn test_numeric_roots_of_high_degree() {
        // x**60 + x + 1 has no rational roots; every seed must settle
        let roots = poly("x**60 + x + 1").numeric_roots().unwrap();
        assert_eq!(roots.len(), 60);
        assert!(roots.iter().all(|z| z.re.is_finite() && z.im.is_finite()));
        assert!(roots.iter().all(|z| (z.norm() - 1.0).abs() < 0.2));
    }

    #[test]
    fn test_to_expr() {
        let p = UniPoly::new(vec![r(-4, 1), r(0, 1), r(1, 1)]);
        assert_eq!(p.to_expr(&sym("x")).to_string(), "x**2 - 4");
        assert_eq!(p.eval(&r(2, 1)), Rational::zero());
    }
}
