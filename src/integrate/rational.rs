//! Rational functions with rational coefficients
//!
//! After polynomial division the proper part is split over the rational
//! roots of the denominator. What is left must be a quadratic without
//! rational roots, handled by completing the square.

use num_traits::{One, Zero};

use crate::error::SolveError;
use crate::number::Rational;
use crate::poly::UniPoly;
use crate::simplification::numer_denom;
use crate::{Expr, Symbol};

/// Antiderivative of `f` if it is a quotient of polynomials in `x` with a
/// nonconstant denominator, `Ok(None)` if it is not of that shape.
///
/// # Errors
/// `NotIntegrable` when the denominator has an irreducible factor of
/// degree three or more, or repeated roots next to other factors.
pub(super) fn integrate_rational(f: &Expr, x: &Symbol) -> Result<Option<Expr>, SolveError> {
    let (n, d) = numer_denom(f);
    if d.is_free_of(x) {
        return Ok(None);
    }
    let (Some(num), Some(den)) = (UniPoly::from_expr(&n, x), UniPoly::from_expr(&d, x)) else {
        return Ok(None);
    };
    if den.degree() == 0 {
        return Ok(None);
    }
    let Some((quot, rem)) = num.divrem(&den) else {
        return Ok(None);
    };

    let mut parts = vec![integrate_polynomial(&quot, x)];
    if !rem.is_zero() {
        parts.push(proper_fraction(&rem, &den, x).map_err(|e| match e {
            SolveError::NotIntegrable(_) => SolveError::NotIntegrable(f.to_string()),
            other => other,
        })?);
    }
    Ok(Some(Expr::sum(parts)))
}

fn integrate_polynomial(p: &UniPoly, x: &Symbol) -> Expr {
    let mut coeffs = vec![Rational::zero()];
    for (k, c) in p.coeffs().iter().enumerate() {
        let next = c
            .checked_div(&Rational::from_i64(k as i64 + 1))
            .unwrap_or_default();
        coeffs.push(next);
    }
    UniPoly::new(coeffs).to_expr(x)
}

fn x_minus(x: &Symbol, a: &Rational) -> Expr {
    UniPoly::linear_factor(a).to_expr(x)
}

fn log(arg: Expr) -> Expr {
    Expr::func1("log", arg)
}

fn refuse() -> SolveError {
    SolveError::NotIntegrable(String::new())
}

/// `∫ r/d` with `deg r < deg d`.
fn proper_fraction(r: &UniPoly, d: &UniPoly, x: &Symbol) -> Result<Expr, SolveError> {
    let inv = d.leading().checked_recip().ok_or_else(refuse)?;
    let (r, d) = (r.scale(&inv), d.scale(&inv));
    let (roots, rest) = d.extract_rational_roots();

    if roots.len() + rest.degree() != d.degree() {
        // Repeated roots: only a single one filling the whole denominator
        return match roots.as_slice() {
            [a] if rest.degree() == 0 => Ok(repeated_root(&r, a, d.degree(), x)),
            _ => Err(refuse()),
        };
    }

    let dprime = d.derivative();
    let mut parts = Vec::with_capacity(roots.len() + 1);
    let mut leftover = r.clone();
    for a in &roots {
        let residue = r
            .eval(a)
            .checked_div(&dprime.eval(a))
            .ok_or_else(refuse)?;
        if residue.is_zero() {
            continue;
        }
        let cofactor = d.deflate(a);
        leftover = leftover.sub(&cofactor.scale(&residue));
        parts.push(Expr::product(vec![
            Expr::rational(residue),
            log(x_minus(x, a)),
        ]));
    }

    match rest.degree() {
        0 => {}
        2 => {
            let linear = roots
                .iter()
                .fold(UniPoly::constant(Rational::one()), |acc, a| {
                    acc.mul(&UniPoly::linear_factor(a))
                });
            let (s, _) = leftover.divrem(&linear).ok_or_else(refuse)?;
            parts.push(irreducible_quadratic(&s, &rest, x));
        }
        _ => return Err(refuse()),
    }
    Ok(Expr::sum(parts))
}

/// `∫ r/(x - a)**m` through the Taylor expansion of `r` at `a`.
fn repeated_root(r: &UniPoly, a: &Rational, m: usize, x: &Symbol) -> Expr {
    let mut parts = Vec::new();
    let mut deriv = r.clone();
    let mut factorial = Rational::one();
    for k in 0..=r.degree() {
        if k > 0 {
            factorial = &factorial * &Rational::from_i64(k as i64);
        }
        let coeff = deriv.eval(a).checked_div(&factorial).unwrap_or_default();
        deriv = deriv.derivative();
        if coeff.is_zero() {
            continue;
        }
        // (x - a)**(k - m), with k < m
        let e = k as i64 - m as i64;
        let term = if e == -1 {
            log(x_minus(x, a))
        } else {
            Expr::div_expr(
                Expr::pow(x_minus(x, a), Expr::integer(e + 1)),
                Expr::integer(e + 1),
            )
        };
        parts.push(Expr::product(vec![Expr::rational(coeff), term]));
    }
    Expr::sum(parts)
}

/// `∫ (p*x + s)/(x**2 + b*x + c)` for a monic quadratic without rational
/// roots.
fn irreducible_quadratic(num: &UniPoly, quad: &UniPoly, x: &Symbol) -> Expr {
    let coeff = |p: &UniPoly, k: usize| p.coeffs().get(k).cloned().unwrap_or_default();
    let (s, p) = (coeff(num, 0), coeff(num, 1));
    let (c, b) = (coeff(quad, 0), coeff(quad, 1));
    let half = Rational::frac(1, 2).unwrap_or_default();
    let h = &b * &half;

    let mut parts = Vec::with_capacity(2);
    if !p.is_zero() {
        parts.push(Expr::product(vec![
            Expr::rational(&p * &half),
            log(quad.to_expr(x)),
        ]));
    }
    // what remains is k/((x + h)**2 + c - h**2)
    let k = &s - &(&p * &h);
    if k.is_zero() {
        return Expr::sum(parts);
    }
    let shifted = Expr::sum(vec![x.to_expr(), Expr::rational(h.clone())]);
    let w2 = &c - &(&h * &h);
    if w2.is_positive() {
        let w = Expr::sqrt(Expr::rational(w2));
        parts.push(Expr::product(vec![
            Expr::div_expr(Expr::rational(k), w.clone()),
            Expr::func1("atan", Expr::div_expr(shifted, w)),
        ]));
    } else {
        // real irrational roots -h ± v
        let v = Expr::sqrt(Expr::rational(-w2));
        let at = |sign: i64| {
            Expr::sum(vec![
                shifted.clone(),
                Expr::product(vec![Expr::integer(sign), v.clone()]),
            ])
        };
        parts.push(Expr::product(vec![
            Expr::div_expr(Expr::rational(k), Expr::product(vec![Expr::integer(2), v.clone()])),
            Expr::sub_expr(log(at(-1)), log(at(1))),
        ]));
    }
    Expr::sum(parts)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::simplification::{cancel, simplify};
    use crate::{parse, sym};

    fn integral(f: &str) -> Expr {
        integrate_rational(&parse(f).unwrap(), &sym("x")).unwrap().unwrap()
    }

    fn check_derivative(f: &str) {
        let x = sym("x");
        let r = integral(f);
        let back = simplify(&cancel(&Expr::sub_expr(r.diff(&x), parse(f).unwrap())));
        assert!(back.is_zero(), "d/dx of {} gave {}", r, back);
    }

    #[test]
    fn test_not_rational() {
        let x = sym("x");
        assert!(integrate_rational(&parse("x**2 + 1").unwrap(), &x).unwrap().is_none());
        assert!(integrate_rational(&parse("1/(x + sin(x))").unwrap(), &x).unwrap().is_none());
    }

    #[test]
    fn test_simple_roots() {
        assert_eq!(integral("1/(x - 2)"), parse("log(x - 2)").unwrap());
        check_derivative("1/(x**2 - 1)");
        check_derivative("(2*x + 3)/(x**3 - x)");
    }

    #[test]
    fn test_division_first() {
        check_derivative("x**3/(x**2 - 1)");
        check_derivative("(x**2 + 1)/(x + 1)");
    }

    #[test]
    fn test_repeated_root() {
        assert_eq!(integral("1/(x - 1)**2"), parse("-1/(x - 1)").unwrap());
        check_derivative("x/(x + 2)**3");
    }

    #[test]
    fn test_irreducible_quadratic() {
        assert_eq!(integral("1/(x**2 + 1)"), parse("atan(x)").unwrap());
        check_derivative("x/(x**2 + 1)");
        check_derivative("1/(x**2 + 2*x + 5)");
        check_derivative("1/((x - 1)*(x**2 + 1))");
    }

    #[test]
    fn test_irrational_roots() {
        check_derivative("1/(x**2 - 2)");
    }

    #[test]
    fn test_cubic_irreducible_refused() {
        let err = integrate_rational(&parse("1/(x**3 - 2)").unwrap(), &sym("x"));
        assert!(matches!(err, Err(SolveError::NotIntegrable(_))));
    }
}
