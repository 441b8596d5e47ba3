//! Centralized mathematical function registry
//!
//! This module is the single source of truth for the named functions the
//! parser accepts, including their derivative formulas and the exact values
//! they take at special arguments.

use crate::ast::{Constant, ExprKind};
use crate::number::{Numeric, Rational};
use crate::Expr;

pub(crate) mod definitions;
pub(crate) mod registry;

pub(crate) use registry::{LatexStyle, Registry};

/// Names rewritten into other forms on application rather than stored.
pub(crate) const ALIASES: &[&str] = &["exp", "sqrt", "ln"];

/// Whether `name` is a function the parser should recognize.
pub fn is_known_function(name: &str) -> bool {
    ALIASES.contains(&name) || Registry::get(name).is_some()
}

/// Apply a named function to its arguments.
///
/// `exp` and `sqrt` become powers, `ln` is `log`, `log(x, b)` is
/// `log(x)/log(b)`. Registered functions get exact evaluation at special
/// arguments and numeric evaluation on float arguments; unknown names
/// stay as undefined applications.
pub(crate) fn apply(name: &str, args: Vec<Expr>) -> Expr {
    match (name, args.as_slice()) {
        ("exp", [u]) => return Expr::exp(u.clone()),
        ("sqrt", [u]) => return Expr::sqrt(u.clone()),
        ("ln", [_]) => return apply("log", args),
        ("log", [x, b]) => {
            return Expr::div_expr(
                apply("log", vec![x.clone()]),
                apply("log", vec![b.clone()]),
            );
        }
        _ => {}
    }
    let Some(def) = Registry::get(name) else {
        return Expr::func_raw(name, args);
    };
    if !def.validate_arity(args.len()) {
        return Expr::func_raw(name, args);
    }
    if let Some(v) = (def.exact)(&args) {
        return v;
    }
    if args.iter().any(Expr::has_float) && args.iter().all(Expr::is_number) {
        let values: Vec<f64> = args
            .iter()
            .filter_map(|a| a.as_numeric().map(|n| n.to_f64()))
            .collect();
        if let Some(v) = (def.eval)(&values)
            && v.is_finite()
        {
            return Expr::float(v);
        }
    }
    Expr::func_raw(name, args)
}

// ===== Helpers for building derivative expressions =====

pub(crate) fn func(name: &str, arg: Expr) -> Expr {
    apply(name, vec![arg])
}

/// Multiply, skipping the product node when one side is 0 or 1
pub(crate) fn mul_opt(a: Expr, b: Expr) -> Expr {
    if a.is_zero() || b.is_zero() {
        Expr::zero()
    } else if a.is_one() {
        b
    } else if b.is_one() {
        a
    } else {
        Expr::product(vec![a, b])
    }
}

pub(crate) fn neg(e: Expr) -> Expr {
    Expr::negate(e)
}

// ===== Exact values =====

/// `r` when `e` is `r*pi`
pub(crate) fn pi_multiple(e: &Expr) -> Option<Rational> {
    if let Some(r) = e.as_rational() {
        return num_traits::Zero::is_zero(r).then(|| r.clone());
    }
    let (coeff, rest) = e.as_coeff_mul();
    match (coeff, rest.kind()) {
        (Numeric::Exact(r), ExprKind::Constant(Constant::Pi)) => Some(r),
        _ => None,
    }
}

/// Exact `sin(r*pi)` for multiples of pi/6 and pi/4.
pub(crate) fn sin_pi_multiple(r: &Rational) -> Option<Expr> {
    let two = Rational::from_i64(2);
    let turns = r.checked_div(&two)?.floor_i64()?;
    let mut reduced = r - &(&two * &Rational::from_i64(turns));
    let mut negative = false;
    let one = Rational::from_i64(1);
    if reduced >= one {
        reduced = &reduced - &one;
        negative = true;
    }
    let mirrored = &one - &reduced;
    let s = if mirrored < reduced { mirrored } else { reduced };
    let value = match s.to_i128_parts()? {
        (0, _) => Expr::zero(),
        (1, 2) => Expr::one(),
        (1, 3) => Expr::div_expr(Expr::sqrt(Expr::integer(3)), Expr::integer(2)),
        (1, 4) => Expr::div_expr(Expr::sqrt(Expr::integer(2)), Expr::integer(2)),
        (1, 6) => Expr::half(),
        _ => return None,
    };
    Some(if negative { Expr::negate(value) } else { value })
}

/// Exact `cos(r*pi)` via `sin(r*pi + pi/2)`.
pub(crate) fn cos_pi_multiple(r: &Rational) -> Option<Expr> {
    let half = Rational::frac(1, 2)?;
    sin_pi_multiple(&(r + &half))
}

/// For odd functions, `f(-u) = -f(u)`: the argument with its sign pulled out.
/// Negative numbers are included so `asin(-1)` reaches the exact table.
pub(crate) fn strip_negative(u: &Expr) -> Option<Expr> {
    if u.has_negative_coefficient() {
        Some(Expr::negate(u.clone()))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_exact_trig_values() {
        assert_eq!(Expr::func1("sin", Expr::zero()), Expr::zero());
        assert_eq!(Expr::func1("sin", Expr::pi()), Expr::zero());
        assert_eq!(Expr::func1("cos", Expr::pi()), Expr::neg_one());
        let sixth = Expr::product(vec![Expr::frac(1, 6), Expr::pi()]);
        assert_eq!(Expr::func1("sin", sixth), Expr::half());
        let three_halves = Expr::product(vec![Expr::frac(3, 2), Expr::pi()]);
        assert_eq!(Expr::func1("sin", three_halves), Expr::neg_one());
    }

    #[test]
    fn test_aliases() {
        let x = sym("x");
        assert_eq!(Expr::func1("exp", x.to_expr()), Expr::exp(x.to_expr()));
        assert_eq!(Expr::func1("ln", Expr::e()), Expr::one());
        assert_eq!(
            Expr::func1("sqrt", x.to_expr()),
            Expr::pow(x.to_expr(), Expr::half())
        );
    }

    #[test]
    fn test_odd_and_even_symmetry() {
        let x = sym("x");
        assert_eq!(
            Expr::func1("sin", Expr::negate(x.to_expr())),
            Expr::negate(Expr::func1("sin", x.to_expr()))
        );
        assert_eq!(
            Expr::func1("cos", Expr::negate(x.to_expr())),
            Expr::func1("cos", x.to_expr())
        );
    }

    #[test]
    fn test_negative_numbers_reach_exact_values() {
        let minus_half_pi = Expr::product(vec![Expr::frac(-1, 2), Expr::pi()]);
        assert_eq!(Expr::func1("asin", Expr::neg_one()), minus_half_pi);
        assert_eq!(
            Expr::func1("atan", Expr::neg_one()),
            Expr::product(vec![Expr::frac(-1, 4), Expr::pi()])
        );
        assert_eq!(
            Expr::func1("sin", Expr::integer(-2)),
            Expr::negate(Expr::func1("sin", Expr::integer(2)))
        );
        assert_eq!(Expr::func1("cosh", Expr::integer(-3)), Expr::func1("cosh", Expr::integer(3)));
    }

    #[test]
    fn test_undefined_function_stays_applied() {
        let f = Expr::func("f", vec![sym("x").to_expr()]);
        assert_eq!(f.function_name(), Some("f"));
        assert!(!is_known_function("f"));
        assert!(is_known_function("sin"));
    }

    #[test]
    fn test_float_arguments_evaluate() {
        let v = Expr::func1("cos", Expr::float(0.0));
        assert_eq!(v, Expr::float(1.0));
    }
}
