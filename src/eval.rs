//! Numerical evaluation of expressions
//!
//! Real evaluation goes through each registered function's `eval` entry.
//! Complex evaluation is used for root checks and for substituting numeric
//! roots back into equations.

use num_complex::Complex64;

use crate::ast::{Constant, ExprKind};
use crate::functions::Registry;
use crate::number::Numeric;
use crate::traits::IMAG_TOLERANCE;
use crate::{Expr, Symbol};

/// Evaluate to a real number. Returns `None` for unbound symbols,
/// undefined functions, unevaluated constructs or non-finite results.
///
/// # Example
/// ```
/// use symb_solve::{eval_real, parse, sym};
///
/// let e = parse("x**2 + 1").unwrap();
/// assert_eq!(eval_real(&e, &[(sym("x"), 3.0)]), Some(10.0));
/// ```
pub fn eval_real(expr: &Expr, bindings: &[(Symbol, f64)]) -> Option<f64> {
    let v = real(expr, bindings)?;
    v.is_finite().then_some(v)
}

fn real(expr: &Expr, bindings: &[(Symbol, f64)]) -> Option<f64> {
    match expr.kind() {
        ExprKind::Number(r) => Some(r.to_f64()),
        ExprKind::Float(f) => Some(f.0),
        ExprKind::Constant(Constant::Pi) => Some(std::f64::consts::PI),
        ExprKind::Constant(Constant::E) => Some(std::f64::consts::E),
        ExprKind::Constant(_) => None,
        ExprKind::Symbol(s) => bindings.iter().find(|(b, _)| b == s).map(|(_, v)| *v),
        ExprKind::Sum(ts) => ts.iter().try_fold(0.0, |acc, t| Some(acc + real(t, bindings)?)),
        ExprKind::Product(fs) => fs.iter().try_fold(1.0, |acc, f| Some(acc * real(f, bindings)?)),
        ExprKind::Pow(b, e) => {
            let base = real(b, bindings)?;
            // Odd roots of negative numbers stay real
            if base < 0.0
                && let Some(r) = e.as_rational()
                && !r.is_integer()
            {
                let (n, d) = r.to_i128_parts()?;
                if d % 2 == 1 {
                    let magnitude = (-base).powf(r.to_f64());
                    return Some(if n % 2 == 0 { magnitude } else { -magnitude });
                }
                return None;
            }
            Some(base.powf(real(e, bindings)?))
        }
        ExprKind::Function { name, args } => {
            let def = Registry::get(name.name())?;
            let values = args
                .iter()
                .map(|a| real(a, bindings))
                .collect::<Option<Vec<_>>>()?;
            (def.eval)(&values)
        }
        ExprKind::Derivative { .. }
        | ExprKind::Integral { .. }
        | ExprKind::Relation { .. }
        | ExprKind::Tuple(_) => None,
    }
}

/// Evaluate to a complex number.
pub fn eval_complex(expr: &Expr, bindings: &[(Symbol, Complex64)]) -> Option<Complex64> {
    let z = complex(expr, bindings)?;
    (z.re.is_finite() && z.im.is_finite()).then_some(z)
}

fn complex(expr: &Expr, bindings: &[(Symbol, Complex64)]) -> Option<Complex64> {
    let re = |v: f64| Some(Complex64::new(v, 0.0));
    match expr.kind() {
        ExprKind::Number(r) => re(r.to_f64()),
        ExprKind::Float(f) => re(f.0),
        ExprKind::Constant(Constant::Pi) => re(std::f64::consts::PI),
        ExprKind::Constant(Constant::E) => re(std::f64::consts::E),
        ExprKind::Constant(Constant::I) => Some(Complex64::i()),
        ExprKind::Constant(Constant::ComplexInfinity) => None,
        ExprKind::Symbol(s) => bindings.iter().find(|(b, _)| b == s).map(|(_, v)| *v),
        ExprKind::Sum(ts) => ts
            .iter()
            .try_fold(Complex64::new(0.0, 0.0), |acc, t| Some(acc + complex(t, bindings)?)),
        ExprKind::Product(fs) => fs
            .iter()
            .try_fold(Complex64::new(1.0, 0.0), |acc, f| Some(acc * complex(f, bindings)?)),
        ExprKind::Pow(b, e) => {
            let base = complex(b, bindings)?;
            if let Some(n) = e.as_rational().and_then(|r| r.to_i64())
                && let Ok(n) = i32::try_from(n)
            {
                return Some(base.powi(n));
            }
            Some(base.powc(complex(e, bindings)?))
        }
        ExprKind::Function { name, args } => {
            let [arg] = args.as_slice() else {
                return None;
            };
            let z = complex(arg, bindings)?;
            Some(match name.name() {
                "sin" => z.sin(),
                "cos" => z.cos(),
                "tan" => z.tan(),
                "cot" => z.tan().inv(),
                "sec" => z.cos().inv(),
                "csc" => z.sin().inv(),
                "asin" => z.asin(),
                "acos" => z.acos(),
                "atan" => z.atan(),
                "sinh" => z.sinh(),
                "cosh" => z.cosh(),
                "tanh" => z.tanh(),
                "log" => z.ln(),
                "Abs" => Complex64::new(z.norm(), 0.0),
                "sign" if z.norm() == 0.0 => z,
                "sign" => z / z.norm(),
                _ => return None,
            })
        }
        ExprKind::Derivative { .. }
        | ExprKind::Integral { .. }
        | ExprKind::Relation { .. }
        | ExprKind::Tuple(_) => None,
    }
}

/// A closed expression whose value has no imaginary part.
pub fn is_real_constant(expr: &Expr) -> bool {
    if !expr.free_symbols().is_empty() {
        return false;
    }
    if let Some(n) = expr.as_numeric() {
        return !matches!(n, Numeric::Approx(v) if v.is_nan());
    }
    if structurally_real(expr) {
        return true;
    }
    eval_complex(expr, &[]).is_some_and(|z| z.im.abs() <= IMAG_TOLERANCE * (1.0 + z.re.abs()))
}

/// Real by construction, without evaluating: rationals, `pi`, `E`, real
/// powers of positive bases, integer powers of real bases, and sums,
/// products and real functions of those. `false` means unknown.
fn structurally_real(expr: &Expr) -> bool {
    if let Some(n) = expr.as_numeric() {
        return !matches!(n, Numeric::Approx(v) if !v.is_finite());
    }
    match expr.kind() {
        ExprKind::Constant(c) => matches!(c, Constant::Pi | Constant::E),
        ExprKind::Sum(items) | ExprKind::Product(items) => items.iter().all(structurally_real),
        ExprKind::Pow(base, exp) => {
            let integer_exp = exp.as_rational().is_some_and(|r| r.is_integer());
            structurally_real(exp)
                && (structurally_positive(base) || (integer_exp && structurally_real(base)))
        }
        ExprKind::Function { name, args } => match (name.name(), args.as_slice()) {
            ("sin" | "cos" | "tan" | "atan" | "sinh" | "cosh" | "tanh" | "Abs", [u]) => {
                structurally_real(u)
            }
            ("log", [u]) => structurally_positive(u),
            _ => false,
        },
        _ => false,
    }
}

/// Positive by construction; see [`structurally_real`].
fn structurally_positive(expr: &Expr) -> bool {
    if let Some(n) = expr.as_numeric() {
        return match n {
            Numeric::Exact(r) => r.is_positive(),
            Numeric::Approx(v) => v > 0.0 && v.is_finite(),
        };
    }
    match expr.kind() {
        ExprKind::Constant(c) => matches!(c, Constant::Pi | Constant::E),
        ExprKind::Sum(items) | ExprKind::Product(items) => items.iter().all(structurally_positive),
        ExprKind::Pow(base, exp) => structurally_positive(base) && structurally_real(exp),
        ExprKind::Function { name, args } => match (name.name(), args.as_slice()) {
            ("cosh", [u]) => structurally_real(u),
            _ => false,
        },
        _ => false,
    }
}

/// Sign of a closed expression: `Some(1)`, `Some(-1)` or `Some(0)`,
/// `None` when it cannot be evaluated or is not real.
pub fn numeric_sign(expr: &Expr) -> Option<i8> {
    if let Some(r) = expr.as_rational() {
        return Some(r.signum());
    }
    let z = eval_complex(expr, &[])?;
    if z.im.abs() > IMAG_TOLERANCE * (1.0 + z.re.abs()) {
        return None;
    }
    Some(if crate::traits::is_zero(z.re) {
        0
    } else if z.re > 0.0 {
        1
    } else {
        -1
    })
}

/// Whether `expr` is nonnegative for every real value of its symbols,
/// judged from its structure: even powers, exponentials, `Abs`, and sums
/// and products built from those with nonnegative coefficients. `false`
/// means unknown, not negative.
pub fn is_nonnegative(expr: &Expr) -> bool {
    if expr.free_symbols().is_empty() {
        return numeric_sign(expr).is_some_and(|s| s >= 0);
    }
    match expr.kind() {
        ExprKind::Pow(base, exp) => {
            if base.is_constant(Constant::E) {
                return true;
            }
            let even = exp
                .as_rational()
                .and_then(|r| r.to_i64())
                .is_some_and(|n| n % 2 == 0);
            even || is_nonnegative(base)
        }
        ExprKind::Function { name, .. } => matches!(name.name(), "Abs" | "cosh"),
        ExprKind::Sum(terms) => terms.iter().all(is_nonnegative),
        ExprKind::Product(factors) => {
            let negatives = factors
                .iter()
                .filter(|f| f.as_numeric().is_some_and(|n| n.is_negative()))
                .count();
            negatives == 0
                && factors
                    .iter()
                    .all(|f| f.as_numeric().is_some() || is_nonnegative(f))
        }
        _ => false,
    }
}

/// [`is_nonnegative`] of `-expr`.
pub fn is_nonpositive(expr: &Expr) -> bool {
    is_nonnegative(&Expr::negate(expr.clone()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    #[test]
    fn test_real_functions() {
        let e = parse("sin(x)**2 + cos(x)**2").unwrap();
        let v = eval_real(&e, &[(sym("x"), 0.7)]).unwrap();
        assert!((v - 1.0).abs() < 1e-12);
        assert_eq!(eval_real(&parse("log(x)").unwrap(), &[(sym("x"), -1.0)]), None);
        assert_eq!(eval_real(&parse("y").unwrap(), &[]), None);
    }

    #[test]
    fn test_odd_root_of_negative() {
        let v = eval_real(&parse("x**(1/3)").unwrap(), &[(sym("x"), -8.0)]).unwrap();
        assert!((v + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_complex_and_realness() {
        let z = eval_complex(&parse("(1 + I)**2").unwrap(), &[]).unwrap();
        assert!(z.re.abs() < 1e-12 && (z.im - 2.0).abs() < 1e-12);
        assert!(is_real_constant(&parse("sqrt(2) + pi").unwrap()));
        assert!(!is_real_constant(&parse("sqrt(-2)").unwrap()));
        assert!(!is_real_constant(&parse("a + 1").unwrap()));
        assert_eq!(numeric_sign(&parse("1 - sqrt(2)").unwrap()), Some(-1));
    }

    #[test]
    fn test_realness_of_values_beyond_float_range() {
        assert!(is_real_constant(&parse("2**99999999").unwrap()));
        assert!(is_real_constant(&parse("sqrt(10**(-1001))").unwrap()));
        assert!(is_real_constant(&parse("-sqrt(3)/10**1000").unwrap()));
        assert!(!is_real_constant(&parse("I*2**99999999").unwrap()));
    }

    #[test]
    fn test_structural_sign() {
        assert!(is_nonnegative(&parse("3*x**2 + exp(x) + 1").unwrap()));
        assert!(is_nonnegative(&parse("2**x").unwrap()));
        assert!(!is_nonnegative(&parse("x**3").unwrap()));
        assert!(!is_nonnegative(&parse("x**2 - 1").unwrap()));
        assert!(is_nonpositive(&parse("-x**4").unwrap()));
        assert!(!is_nonpositive(&parse("x").unwrap()));
    }
}
