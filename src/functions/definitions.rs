//! Function definitions for the function registry
//!
//! Derivative formulas follow standard calculus (DLMF §4.21-4.28 for the
//! trigonometric family, §4.35-4.37 for the hyperbolic one).

use super::registry::{FunctionDefinition, LatexStyle};
use super::{apply, cos_pi_multiple, func, mul_opt, neg, pi_multiple, sin_pi_multiple, strip_negative};
use crate::ast::{Constant, ExprKind};
use crate::Expr;

fn pi_times(n: i64, d: i64) -> Expr {
    Expr::product(vec![Expr::frac(n, d), Expr::pi()])
}

/// Exact rational argument as `(numer, denom)` machine integers.
fn small_rational(e: &Expr) -> Option<(i128, u128)> {
    e.as_rational().and_then(|r| r.to_i128_parts())
}

fn odd(name: &str, u: &Expr) -> Option<Expr> {
    strip_negative(u).map(|pos| neg(apply(name, vec![pos])))
}

fn even(name: &str, u: &Expr) -> Option<Expr> {
    strip_negative(u).map(|pos| apply(name, vec![pos]))
}

/// `num/den`, complex infinity when `den` is zero
fn ratio(num: Expr, den: Expr) -> Expr {
    if den.is_zero() {
        Expr::complex_infinity()
    } else {
        Expr::div_expr(num, den)
    }
}

/// `1 + u**2`
fn one_plus_square(u: Expr) -> Expr {
    Expr::sum(vec![Expr::one(), Expr::pow(u, Expr::integer(2))])
}

/// `1 - u**2`
fn one_minus_square(u: Expr) -> Expr {
    Expr::sub_expr(Expr::one(), Expr::pow(u, Expr::integer(2)))
}

/// Return all function definitions for populating the registry
pub(crate) fn all_definitions() -> Vec<FunctionDefinition> {
    vec![
        // Trigonometric
        FunctionDefinition {
            name: "sin",
            arity: 1..=1,
            eval: |args| Some(args[0].sin()),
            exact: |args| {
                let u = &args[0];
                match pi_multiple(u) {
                    Some(r) => sin_pi_multiple(&r),
                    None => odd("sin", u),
                }
            },
            derivative: |args, primes| {
                // d/dx sin(u) = cos(u) * u'
                mul_opt(func("cos", args[0].clone()), primes[0].clone())
            },
            latex: LatexStyle::Command(r"\sin"),
        },
        FunctionDefinition {
            name: "cos",
            arity: 1..=1,
            eval: |args| Some(args[0].cos()),
            exact: |args| {
                let u = &args[0];
                match pi_multiple(u) {
                    Some(r) => cos_pi_multiple(&r),
                    None => even("cos", u),
                }
            },
            derivative: |args, primes| {
                // d/dx cos(u) = -sin(u) * u'
                mul_opt(neg(func("sin", args[0].clone())), primes[0].clone())
            },
            latex: LatexStyle::Command(r"\cos"),
        },
        FunctionDefinition {
            name: "tan",
            arity: 1..=1,
            eval: |args| Some(args[0].tan()),
            exact: |args| {
                let u = &args[0];
                match pi_multiple(u) {
                    Some(r) => Some(ratio(sin_pi_multiple(&r)?, cos_pi_multiple(&r)?)),
                    None => odd("tan", u),
                }
            },
            derivative: |args, primes| {
                // d/dx tan(u) = (1 + tan(u)^2) * u'
                mul_opt(one_plus_square(func("tan", args[0].clone())), primes[0].clone())
            },
            latex: LatexStyle::Command(r"\tan"),
        },
        FunctionDefinition {
            name: "cot",
            arity: 1..=1,
            eval: |args| Some(1.0 / args[0].tan()),
            exact: |args| {
                let u = &args[0];
                match pi_multiple(u) {
                    Some(r) => Some(ratio(cos_pi_multiple(&r)?, sin_pi_multiple(&r)?)),
                    None => odd("cot", u),
                }
            },
            derivative: |args, primes| {
                // d/dx cot(u) = -(1 + cot(u)^2) * u'
                mul_opt(
                    neg(one_plus_square(func("cot", args[0].clone()))),
                    primes[0].clone(),
                )
            },
            latex: LatexStyle::Command(r"\cot"),
        },
        FunctionDefinition {
            name: "sec",
            arity: 1..=1,
            eval: |args| Some(1.0 / args[0].cos()),
            exact: |args| {
                let u = &args[0];
                match pi_multiple(u) {
                    Some(r) => Some(ratio(Expr::one(), cos_pi_multiple(&r)?)),
                    None => even("sec", u),
                }
            },
            derivative: |args, primes| {
                // d/dx sec(u) = sec(u)tan(u) * u'
                let u = args[0].clone();
                mul_opt(
                    Expr::product(vec![func("sec", u.clone()), func("tan", u)]),
                    primes[0].clone(),
                )
            },
            latex: LatexStyle::Command(r"\sec"),
        },
        FunctionDefinition {
            name: "csc",
            arity: 1..=1,
            eval: |args| Some(1.0 / args[0].sin()),
            exact: |args| {
                let u = &args[0];
                match pi_multiple(u) {
                    Some(r) => Some(ratio(Expr::one(), sin_pi_multiple(&r)?)),
                    None => odd("csc", u),
                }
            },
            derivative: |args, primes| {
                // d/dx csc(u) = -csc(u)cot(u) * u'
                let u = args[0].clone();
                mul_opt(
                    neg(Expr::product(vec![func("csc", u.clone()), func("cot", u)])),
                    primes[0].clone(),
                )
            },
            latex: LatexStyle::Command(r"\csc"),
        },
        // Inverse trigonometric
        FunctionDefinition {
            name: "asin",
            arity: 1..=1,
            eval: |args| Some(args[0].asin()),
            exact: |args| {
                let u = &args[0];
                match small_rational(u) {
                    Some((0, _)) => Some(Expr::zero()),
                    Some((1, 1)) => Some(pi_times(1, 2)),
                    Some((1, 2)) => Some(pi_times(1, 6)),
                    _ => odd("asin", u),
                }
            },
            derivative: |args, primes| {
                // d/dx asin(u) = u' / sqrt(1 - u^2)
                mul_opt(
                    Expr::recip(Expr::sqrt(one_minus_square(args[0].clone()))),
                    primes[0].clone(),
                )
            },
            latex: LatexStyle::Operator("asin"),
        },
        FunctionDefinition {
            name: "acos",
            arity: 1..=1,
            eval: |args| Some(args[0].acos()),
            exact: |args| match small_rational(&args[0]) {
                Some((1, 1)) => Some(Expr::zero()),
                Some((0, _)) => Some(pi_times(1, 2)),
                Some((-1, 1)) => Some(Expr::pi()),
                Some((1, 2)) => Some(pi_times(1, 3)),
                Some((-1, 2)) => Some(pi_times(2, 3)),
                _ => None,
            },
            derivative: |args, primes| {
                // d/dx acos(u) = -u' / sqrt(1 - u^2)
                mul_opt(
                    neg(Expr::recip(Expr::sqrt(one_minus_square(args[0].clone())))),
                    primes[0].clone(),
                )
            },
            latex: LatexStyle::Operator("acos"),
        },
        FunctionDefinition {
            name: "atan",
            arity: 1..=1,
            eval: |args| Some(args[0].atan()),
            exact: |args| {
                let u = &args[0];
                match small_rational(u) {
                    Some((0, _)) => Some(Expr::zero()),
                    Some((1, 1)) => Some(pi_times(1, 4)),
                    _ => odd("atan", u),
                }
            },
            derivative: |args, primes| {
                // d/dx atan(u) = u' / (1 + u^2)
                mul_opt(
                    Expr::recip(one_plus_square(args[0].clone())),
                    primes[0].clone(),
                )
            },
            latex: LatexStyle::Operator("atan"),
        },
        // Hyperbolic
        FunctionDefinition {
            name: "sinh",
            arity: 1..=1,
            eval: |args| Some(args[0].sinh()),
            exact: |args| {
                let u = &args[0];
                if u.as_rational().is_some_and(|r| num_traits::Zero::is_zero(r)) {
                    return Some(Expr::zero());
                }
                odd("sinh", u)
            },
            derivative: |args, primes| mul_opt(func("cosh", args[0].clone()), primes[0].clone()),
            latex: LatexStyle::Command(r"\sinh"),
        },
        FunctionDefinition {
            name: "cosh",
            arity: 1..=1,
            eval: |args| Some(args[0].cosh()),
            exact: |args| {
                let u = &args[0];
                if u.as_rational().is_some_and(|r| num_traits::Zero::is_zero(r)) {
                    return Some(Expr::one());
                }
                even("cosh", u)
            },
            derivative: |args, primes| mul_opt(func("sinh", args[0].clone()), primes[0].clone()),
            latex: LatexStyle::Command(r"\cosh"),
        },
        FunctionDefinition {
            name: "tanh",
            arity: 1..=1,
            eval: |args| Some(args[0].tanh()),
            exact: |args| {
                let u = &args[0];
                if u.as_rational().is_some_and(|r| num_traits::Zero::is_zero(r)) {
                    return Some(Expr::zero());
                }
                odd("tanh", u)
            },
            derivative: |args, primes| {
                // d/dx tanh(u) = (1 - tanh(u)^2) * u'
                mul_opt(one_minus_square(func("tanh", args[0].clone())), primes[0].clone())
            },
            latex: LatexStyle::Command(r"\tanh"),
        },
        // Logarithm
        FunctionDefinition {
            name: "log",
            arity: 1..=1,
            eval: |args| (args[0] > 0.0).then(|| args[0].ln()),
            exact: |args| {
                let u = &args[0];
                if u.is_one() {
                    return Some(Expr::zero());
                }
                if u.as_rational().is_some_and(|r| num_traits::Zero::is_zero(r)) {
                    return Some(Expr::complex_infinity());
                }
                if u.is_constant(Constant::E) {
                    return Some(Expr::one());
                }
                match u.kind() {
                    ExprKind::Pow(b, e) if b.is_constant(Constant::E) && e.as_rational().is_some() => {
                        Some(e.clone())
                    }
                    _ => None,
                }
            },
            derivative: |args, primes| {
                // d/dx log(u) = u' / u
                mul_opt(Expr::recip(args[0].clone()), primes[0].clone())
            },
            latex: LatexStyle::Command(r"\log"),
        },
        // Absolute value and sign
        FunctionDefinition {
            name: "Abs",
            arity: 1..=1,
            eval: |args| Some(args[0].abs()),
            exact: |args| {
                let u = &args[0];
                match u.kind() {
                    ExprKind::Number(r) => Some(Expr::rational(r.abs())),
                    ExprKind::Float(v) => Some(Expr::float(v.0.abs())),
                    ExprKind::Constant(Constant::Pi | Constant::E) => Some(u.clone()),
                    _ => even("Abs", u),
                }
            },
            derivative: |args, primes| {
                // d/dx |u| = sign(u) * u'
                mul_opt(func("sign", args[0].clone()), primes[0].clone())
            },
            latex: LatexStyle::Abs,
        },
        FunctionDefinition {
            name: "sign",
            arity: 1..=1,
            eval: |args| Some(if args[0] == 0.0 { 0.0 } else { args[0].signum() }),
            exact: |args| {
                let u = &args[0];
                match u.kind() {
                    ExprKind::Number(r) => Some(Expr::integer(i64::from(r.signum()))),
                    ExprKind::Constant(Constant::Pi | Constant::E) => Some(Expr::one()),
                    _ => odd("sign", u),
                }
            },
            derivative: |_, _| Expr::zero(),
            latex: LatexStyle::Operator("sign"),
        },
    ]
}
