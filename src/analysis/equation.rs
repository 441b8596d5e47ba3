//! Single equations `lhs = rhs`
//!
//! The equation is solved for the alphabetically first free variable; any
//! other symbols are parameters. The linear path reads the root off the
//! coefficients, the nonlinear path goes through the general solver.

use serde_json::Value;

use super::{AnalysisResult, Fields, latex_all, sorted_variables};
use crate::config::SolveLimits;
use crate::error::SolveError;
use crate::eval::is_real_constant;
use crate::parser::parse_with_limits;
use crate::poly::coefficients;
use crate::simplification::simplify;
use crate::solve::{Budget, solve_for};
use crate::{Expr, Symbol};

const PARSE_PHASE: &str = "Equation parse error";
const SOLVE_PHASE: &str = "Equation solve error";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Path {
    Linear,
    Nonlinear,
}

/// Both sides of a string holding exactly one `=`.
pub(crate) fn split_equation(
    expr_str: &str,
    limits: &SolveLimits,
) -> Result<(Expr, Expr), SolveError> {
    let parts: Vec<&str> = expr_str.split('=').collect();
    let [lhs, rhs] = parts.as_slice() else {
        if parts.len() == 1 {
            return Err(SolveError::NotAnEquation);
        }
        return Err(SolveError::MalformedEquation(format!(
            "expected exactly one '=' in '{}'",
            expr_str.trim()
        )));
    };
    if lhs.trim().is_empty() || rhs.trim().is_empty() {
        return Err(SolveError::MalformedEquation(
            "both sides of '=' must be present".into(),
        ));
    }
    Ok((
        parse_with_limits(lhs.trim(), limits)?,
        parse_with_limits(rhs.trim(), limits)?,
    ))
}

fn linear_roots(zero: &Expr, var: &Symbol, budget: &mut Budget) -> Result<Vec<Expr>, SolveError> {
    budget.tick()?;
    match coefficients(zero, var).as_deref() {
        Some([c0, c1]) => {
            let c1 = simplify(c1);
            if c1.is_zero() {
                return Ok(Vec::new());
            }
            Ok(vec![simplify(&Expr::negate(Expr::div_expr(c0.clone(), c1)))])
        }
        _ => {
            tracing::debug!(equation = %zero, "not linear in {}, using the general solver", var);
            solve_for(zero, var, budget)
        }
    }
}

fn solve(expr_str: &str, limits: &SolveLimits, path: Path) -> AnalysisResult {
    let (lhs, rhs) = match split_equation(expr_str, limits) {
        Ok(sides) => sides,
        Err(SolveError::NotAnEquation) => {
            return AnalysisResult::Error(SolveError::NotAnEquation.to_string());
        }
        Err(e @ SolveError::MalformedEquation(_)) => return AnalysisResult::Error(e.to_string()),
        Err(e) => return AnalysisResult::failed(PARSE_PHASE, e),
    };

    let zero = simplify(&Expr::sub_expr(lhs.clone(), rhs.clone()));
    let var = sorted_variables(&zero).into_iter().next();
    let mut budget = Budget::new(*limits);
    let roots = match &var {
        None => Ok(Vec::new()),
        Some(v) => match path {
            Path::Linear => linear_roots(&zero, v, &mut budget),
            Path::Nonlinear => solve_for(&zero, v, &mut budget),
        },
    };
    let roots = match roots {
        Ok(roots) => roots,
        Err(e) => return AnalysisResult::failed(SOLVE_PHASE, e),
    };

    let mut fields = Fields::new();
    fields.insert("equation".into(), Expr::equation(lhs, rhs).to_latex().into());
    fields.insert(
        "variable".into(),
        var.map_or(Value::Null, |v| v.name().into()),
    );
    fields.insert("number_of_solution".into(), roots.len().into());
    fields.insert("solution".into(), latex_all(&roots).into());
    fields.insert(
        "all_roots_real".into(),
        roots.iter().all(is_real_constant).into(),
    );
    fields.insert(
        "all_roots_complex".into(),
        roots.iter().all(Expr::has_imaginary).into(),
    );
    fields.insert(
        "method".into(),
        match path {
            Path::Linear => "linear",
            Path::Nonlinear => "nonlinear",
        }
        .into(),
    );
    AnalysisResult::Ok(fields)
}

/// Solve an equation the linearity detector judged linear.
pub fn solve_linear_equation(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    solve(expr_str, limits, Path::Linear)
}

/// Solve an equation through the general univariate solver.
///
/// # Example
/// ```
/// use symb_solve::analysis::solve_nonlinear_equation;
/// use symb_solve::config::SolveLimits;
///
/// let out = solve_nonlinear_equation("x**2 - 4 = 0", &SolveLimits::default());
/// assert_eq!(out.get("number_of_solution"), Some(&2.into()));
/// ```
pub fn solve_nonlinear_equation(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    solve(expr_str, limits, Path::Nonlinear)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use serde_json::json;

    fn limits() -> SolveLimits {
        SolveLimits::default()
    }

    #[test]
    fn test_quadratic_scenario() {
        let out = solve_nonlinear_equation("x**2 - 4 = 0", &limits());
        assert_eq!(out.get("solution"), Some(&json!(["-2", "2"])));
        assert_eq!(out.get("number_of_solution"), Some(&json!(2)));
        assert_eq!(out.get("all_roots_real"), Some(&json!(true)));
        assert_eq!(out.get("all_roots_complex"), Some(&json!(false)));
        assert_eq!(out.get_str("equation"), Some("x^{2} - 4 = 0"));
        assert_eq!(out.get_str("variable"), Some("x"));
    }

    #[test]
    fn test_linear_path() {
        let out = solve_linear_equation("2*x + 3 = 7", &limits());
        assert_eq!(out.get("solution"), Some(&json!(["2"])));
        assert_eq!(out.get_str("method"), Some("linear"));
        let out = solve_linear_equation("a*x = 1", &limits());
        assert_eq!(out.get_str("variable"), Some("a"));
        assert_eq!(out.get("number_of_solution"), Some(&json!(1)));
    }

    #[test]
    fn test_complex_roots() {
        let out = solve_nonlinear_equation("x**2 + 1 = 0", &limits());
        assert_eq!(out.get("number_of_solution"), Some(&json!(2)));
        assert_eq!(out.get("all_roots_real"), Some(&json!(false)));
        assert_eq!(out.get("all_roots_complex"), Some(&json!(true)));
    }

    #[test]
    fn test_not_an_equation() {
        let out = solve_linear_equation("x**2 - 4", &limits());
        assert_eq!(out, AnalysisResult::Error("Not an equation".into()));
        let out = solve_nonlinear_equation("x = 1 = 2", &limits());
        assert!(out.error_message().unwrap().starts_with("Malformed equation"));
    }

    #[test]
    fn test_failures_name_the_phase() {
        let out = solve_nonlinear_equation("x = (", &limits());
        assert!(out.error_message().unwrap().starts_with("Equation parse error: "));
        let out = solve_nonlinear_equation("x = cos(x)", &limits());
        assert!(out.error_message().unwrap().starts_with("Equation solve error: "));
    }

    #[test]
    fn test_identity_and_contradiction() {
        let out = solve_nonlinear_equation("x + 1 = x + 1", &limits());
        assert_eq!(out.get("number_of_solution"), Some(&json!(0)));
        assert_eq!(out.get("variable"), Some(&Value::Null));
    }
}
