//! Symbolic integration
//!
//! [`integrate`] finds an antiderivative and reports which technique
//! produced it. [`evaluate_integrals`] replaces every `Integral` construct
//! in an expression by its value, applying the bounds of definite ones.

mod engine;
mod rational;

use std::fmt;

use crate::ast::ExprKind;
use crate::error::SolveError;
use crate::simplification::simplify;
use crate::solve::Budget;
use crate::{Expr, Symbol};

/// How an antiderivative was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    Constant,
    PowerRule,
    /// Sum of terms integrated with different techniques
    Linearity,
    /// Table entry of a linear argument `a*x + b`
    LinearSubstitution,
    Table,
    Expansion,
    DerivativeDivides,
    ByParts,
    PartialFractions,
}

impl Technique {
    pub fn as_str(self) -> &'static str {
        match self {
            Technique::Constant => "constant",
            Technique::PowerRule => "power_rule",
            Technique::Linearity => "linearity",
            Technique::LinearSubstitution => "linear_substitution",
            Technique::Table => "table",
            Technique::Expansion => "expansion",
            Technique::DerivativeDivides => "derivative_divides",
            Technique::ByParts => "by_parts",
            Technique::PartialFractions => "partial_fractions",
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An antiderivative (or a definite value) and how it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Integrated {
    pub result: Expr,
    pub technique: Technique,
}

/// Antiderivative of `f` with respect to `var`, without a constant of
/// integration.
///
/// # Example
/// ```
/// use symb_solve::integrate::{Technique, integrate};
/// use symb_solve::solve::Budget;
/// use symb_solve::{parse, sym};
///
/// let out = integrate(&parse("x**2").unwrap(), &sym("x"), &mut Budget::default()).unwrap();
/// assert_eq!(out.result, parse("x**3/3").unwrap());
/// assert_eq!(out.technique, Technique::PowerRule);
/// ```
///
/// # Errors
/// `NotIntegrable` when no technique applies.
pub fn integrate(f: &Expr, var: &Symbol, budget: &mut Budget) -> Result<Integrated, SolveError> {
    let f = evaluate_integrals(f, budget)?;
    let (result, technique) = engine::antiderivative(&f, var, budget)?;
    tracing::debug!(integrand = %f, %technique, "antiderivative found");
    Ok(Integrated {
        result: simplify(&result),
        technique,
    })
}

/// `F(hi) - F(lo)` for an antiderivative `F` of `f`.
///
/// # Errors
/// As [`integrate`].
pub fn integrate_definite(
    f: &Expr,
    var: &Symbol,
    lo: &Expr,
    hi: &Expr,
    budget: &mut Budget,
) -> Result<Integrated, SolveError> {
    let Integrated { result, technique } = integrate(f, var, budget)?;
    let value = Expr::sub_expr(result.subs(var, hi), result.subs(var, lo));
    Ok(Integrated {
        result: simplify(&value),
        technique,
    })
}

/// Replace every `Integral` construct, innermost first. The technique of
/// the outermost evaluated construct is returned alongside.
pub fn evaluate_integral_construct(
    e: &Expr,
    budget: &mut Budget,
) -> Result<Integrated, SolveError> {
    match e.kind() {
        ExprKind::Integral {
            integrand,
            var,
            bounds,
        } => {
            let integrand = evaluate_integrals(integrand, budget)?;
            match bounds {
                Some((lo, hi)) => integrate_definite(&integrand, var, lo, hi, budget),
                None => integrate(&integrand, var, budget),
            }
        }
        _ => Err(SolveError::failure(format!("{} is not an integral", e))),
    }
}

/// [`evaluate_integral_construct`] applied to every construct in `e`.
pub fn evaluate_integrals(e: &Expr, budget: &mut Budget) -> Result<Expr, SolveError> {
    if !e.contains_integral() {
        return Ok(e.clone());
    }
    if matches!(e.kind(), ExprKind::Integral { .. }) {
        return Ok(evaluate_integral_construct(e, budget)?.result);
    }
    let children = e
        .children()
        .iter()
        .map(|c| evaluate_integrals(c, budget))
        .collect::<Result<Vec<_>, _>>()?;
    let mut next = children.into_iter();
    Ok(e.map_children(&mut |c| next.next().unwrap_or_else(|| c.clone())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    fn p(s: &str) -> Expr {
        parse(s).unwrap()
    }

    #[test]
    fn test_definite_bounds() {
        let out = integrate_definite(&p("x**2"), &sym("x"), &p("0"), &p("3"), &mut Budget::default())
            .unwrap();
        assert_eq!(out.result, Expr::integer(9));
    }

    #[test]
    fn test_construct_evaluation() {
        let e = p("Integral(2*x, (x, 1, a))");
        let out = evaluate_integral_construct(&e, &mut Budget::default()).unwrap();
        assert_eq!(out.result, p("a**2 - 1"));
    }

    #[test]
    fn test_nested_constructs() {
        let e = p("Integral(x, x) + 1");
        let out = evaluate_integrals(&e, &mut Budget::default()).unwrap();
        assert_eq!(out, p("x**2/2 + 1"));
    }

    #[test]
    fn test_not_integrable() {
        let err = integrate(&p("exp(x**2)"), &sym("x"), &mut Budget::default());
        assert!(matches!(err, Err(SolveError::NotIntegrable(_))));
    }
}
