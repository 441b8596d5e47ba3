//! Derivative analysis: critical points, monotonicity and curvature
//!
//! A single-variable function gets its stationary points classified by the
//! second derivative test, its monotonicity intervals and its inflection
//! points. Several variables get gradient, Hessian and the stationary
//! points of the gradient only. Sub-steps that fail leave their field
//! `null` instead of failing the whole analysis.

use serde_json::{Value, json};

use super::convexity::HessianReport;
use super::{AnalysisResult, Fields, latex_all, names, sorted_variables};
use crate::ast::{ExprKind, RelOp};
use crate::config::SolveLimits;
use crate::display::latex_matrix;
use crate::error::SolveError;
use crate::eval::{eval_real, is_nonnegative, is_nonpositive, numeric_sign};
use crate::parser::parse_with_limits;
use crate::simplification::simplify;
use crate::solve::{Budget, RealSet, reduce_inequality, solve_for, solve_nonlinear_system};
use crate::{Expr, Symbol};

const SINGLE_PHASE: &str = "Single-variable derivative error";
const MULTI_PHASE: &str = "Multi-variable derivative error";

/// Distance on each side of an inflection candidate where `f2` is sampled.
const INFLECTION_EPSILON: f64 = 1e-3;

/// The function under analysis: the inner expression of a top-level
/// `Derivative`, otherwise the input with any nested construct evaluated.
fn target_function(expr: Expr) -> Expr {
    match expr.kind() {
        ExprKind::Derivative { inner, .. } => simplify(inner),
        _ if expr.contains_derivative() => simplify(&expr.doit()),
        _ => simplify(&expr),
    }
}

fn classify_stationary(f2: &Expr, x: &Symbol, point: &Expr) -> &'static str {
    if point.has_imaginary() {
        return "inconclusive";
    }
    match numeric_sign(&simplify(&f2.subs(x, point))) {
        Some(1) => "local_minimum",
        Some(-1) => "local_maximum",
        _ => "inconclusive",
    }
}

/// Every root of `f = 0`, complex ones included, without repeats.
fn candidates(f: &Expr, x: &Symbol, budget: &mut Budget) -> Result<Vec<Expr>, SolveError> {
    let mut roots: Vec<Expr> = Vec::new();
    for r in solve_for(f, x, budget)? {
        if !roots.contains(&r) {
            roots.push(r);
        }
    }
    Ok(roots)
}

/// `None` for complex points and where `f2` does not evaluate.
fn sign_change(f2: &Expr, x: &Symbol, point: &Expr) -> Option<bool> {
    if point.has_imaginary() {
        return None;
    }
    let at = eval_real(point, &[])?;
    let left = eval_real(f2, &[(x.clone(), at - INFLECTION_EPSILON)])?;
    let right = eval_real(f2, &[(x.clone(), at + INFLECTION_EPSILON)])?;
    Some(left * right < 0.0)
}

fn reduced(f1: &Expr, op: RelOp, x: &Symbol, budget: &mut Budget) -> Option<RealSet> {
    reduce_inequality(f1, op, x, budget)
        .inspect_err(|e| tracing::debug!(error = %e, "monotonicity not reduced"))
        .ok()
}

fn single_variable(expr: &Expr, x: &Symbol, limits: &SolveLimits) -> Result<Fields, SolveError> {
    let mut budget = Budget::new(*limits);
    budget.check_size(expr)?;
    let f1 = simplify(&expr.diff(x));
    let f2 = simplify(&f1.diff(x));
    budget.check_size(&f2)?;

    let critical_points = match candidates(&f1, x, &mut budget) {
        Ok(points) => Value::Array(
            points
                .iter()
                .map(|p| {
                    json!({
                        "point_latex": p.to_latex(),
                        "classification": classify_stationary(&f2, x, p),
                    })
                })
                .collect(),
        ),
        Err(e) => {
            tracing::debug!(error = %e, "critical points not found");
            Value::Null
        }
    };

    let increasing = reduced(&f1, RelOp::Ge, x, &mut budget);
    let decreasing = reduced(&f1, RelOp::Le, x, &mut budget);
    let whole_line = increasing.as_ref().is_some_and(RealSet::is_all);
    let monotonicity = json!({
        "increasing_intervals": increasing.map(|s| s.to_latex()),
        "decreasing_intervals": decreasing.map(|s| s.to_latex()),
    });

    let inflection_points = match candidates(&f2, x, &mut budget) {
        Ok(points) => Value::Array(
            points
                .iter()
                .map(|p| {
                    json!({
                        "point_latex": p.to_latex(),
                        "sign_change": sign_change(&f2, x, p),
                    })
                })
                .collect(),
        ),
        Err(e) => {
            tracing::debug!(error = %e, "inflection points not found");
            Value::Null
        }
    };

    let verdict = if is_nonnegative(&f1) || whole_line {
        "nondecreasing"
    } else if is_nonpositive(&f1) {
        "nonincreasing"
    } else {
        "undetermined"
    };

    let mut fields = Fields::new();
    fields.insert("first_derivative".into(), f1.to_latex().into());
    fields.insert("second_derivative".into(), f2.to_latex().into());
    fields.insert("critical_points".into(), critical_points);
    fields.insert("monotonicity".into(), monotonicity);
    fields.insert("inflection_points".into(), inflection_points);
    fields.insert("verdict".into(), verdict.into());
    fields.insert(
        "details".into(),
        json!({
            "first_derivative_srepr": f1.to_srepr(),
            "second_derivative_srepr": f2.to_srepr(),
        }),
    );
    Ok(fields)
}

fn multi_variable(expr: &Expr, vars: Vec<Symbol>, limits: &SolveLimits) -> Result<Fields, SolveError> {
    let mut budget = Budget::new(*limits);
    budget.check_size(expr)?;
    let report = HessianReport::compute(expr, vars);

    let critical_points = match solve_nonlinear_system(&report.gradient, &report.variables, &mut budget)
    {
        Ok(tuples) => Value::Array(
            tuples
                .iter()
                .map(|t| json!({ "point": latex_all(t) }))
                .collect(),
        ),
        Err(e) => {
            tracing::debug!(error = %e, "stationary points of the gradient not found");
            Value::Null
        }
    };

    let mut fields = Fields::new();
    fields.insert("gradient_latex".into(), latex_all(&report.gradient).into());
    fields.insert("hessian_latex".into(), latex_matrix(&report.hessian).into());
    fields.insert(
        "principal_minors_latex".into(),
        latex_all(&report.leading_principal_minors).into(),
    );
    fields.insert("critical_points".into(), critical_points);
    fields.insert("verdict".into(), "multi_var_undetermined_or_candidate".into());
    fields.insert(
        "details".into(),
        json!({
            "gradient_srepr": report.gradient.iter().map(Expr::to_srepr).collect::<Vec<_>>(),
            "hessian_srepr": report
                .hessian
                .iter()
                .map(|row| row.iter().map(Expr::to_srepr).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
        }),
    );
    Ok(fields)
}

/// Analyze a function or a `Derivative` of one.
///
/// # Example
/// ```
/// use symb_solve::analysis::handle_derivative;
/// use symb_solve::config::SolveLimits;
///
/// let out = handle_derivative("diff(x**3, x)", &SolveLimits::default());
/// assert_eq!(out.get_str("first_derivative"), Some("3 x^{2}"));
/// assert_eq!(out.get_str("verdict"), Some("nondecreasing"));
/// ```
pub fn handle_derivative(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let expr = match parse_with_limits(expr_str, limits) {
        Ok(e) => target_function(e),
        Err(e) => return AnalysisResult::failed("Derivative parse error", e),
    };
    let vars = sorted_variables(&expr);

    let analyzed = match vars.as_slice() {
        [] => {
            let mut fields = Fields::new();
            fields.insert("verdict".into(), "constant_function".into());
            fields.insert(
                "details".into(),
                json!({ "note": "Expression has no free symbols (constant)." }),
            );
            fields
        }
        [x] => match single_variable(&expr, x, limits) {
            Ok(fields) => fields,
            Err(e) => return AnalysisResult::failed(SINGLE_PHASE, e),
        },
        _ => match multi_variable(&expr, vars.clone(), limits) {
            Ok(fields) => fields,
            Err(e) => return AnalysisResult::failed(MULTI_PHASE, e),
        },
    };

    let mut fields = Fields::new();
    fields.insert("expression".into(), expr.to_latex().into());
    fields.insert("expression_srepr".into(), expr.to_srepr().into());
    fields.insert("variables".into(), names(&vars).into());
    fields.extend(analyzed);
    AnalysisResult::Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    fn run(s: &str) -> AnalysisResult {
        handle_derivative(s, &SolveLimits::default())
    }

    #[test]
    fn test_cubic_scenario() {
        let out = run("diff(x**3, x)");
        assert_eq!(out.get_str("expression_srepr"), Some("Pow(Symbol('x'), Integer(3))"));
        assert_eq!(out.get_str("second_derivative"), Some("6 x"));
        assert_eq!(
            out.get("critical_points"),
            Some(&json!([{"point_latex": "0", "classification": "inconclusive"}]))
        );
        assert_eq!(
            out.get("inflection_points"),
            Some(&json!([{"point_latex": "0", "sign_change": true}]))
        );
        assert_eq!(out.get("monotonicity").unwrap()["increasing_intervals"], r"\text{True}");
    }

    #[test]
    fn test_extrema_classification() {
        let out = run("x**3 - 3*x");
        let points = out.get("critical_points").unwrap();
        assert_eq!(points[0], json!({"point_latex": "-1", "classification": "local_maximum"}));
        assert_eq!(points[1], json!({"point_latex": "1", "classification": "local_minimum"}));
        assert_eq!(out.get_str("verdict"), Some("undetermined"));
    }

    #[test]
    fn test_complex_roots_are_reported() {
        let i = Expr::imaginary_unit();
        let minus_i = Expr::negate(i.clone());

        let out = run("x**3/3 + x");
        assert_eq!(
            out.get("critical_points"),
            Some(&json!([
                {"point_latex": minus_i.to_latex(), "classification": "inconclusive"},
                {"point_latex": i.to_latex(), "classification": "inconclusive"}
            ]))
        );
        assert_eq!(out.get_str("verdict"), Some("nondecreasing"));

        let out = run("x**4/12 + x**2/2");
        assert_eq!(
            out.get("inflection_points"),
            Some(&json!([
                {"point_latex": minus_i.to_latex(), "sign_change": null},
                {"point_latex": i.to_latex(), "sign_change": null}
            ]))
        );
    }

    #[test]
    fn test_nonincreasing_and_partial_failure() {
        let out = run("-exp(x)");
        assert_eq!(out.get_str("verdict"), Some("nonincreasing"));
        let out = run("x + sin(x)");
        assert!(out.is_ok());
        assert_eq!(out.get("monotonicity").unwrap()["increasing_intervals"], Value::Null);
    }

    #[test]
    fn test_constant() {
        let out = run("Derivative(3, x)");
        assert_eq!(out.get_str("verdict"), Some("constant_function"));
        assert_eq!(
            out.get("details").unwrap()["note"],
            "Expression has no free symbols (constant)."
        );
    }

    #[test]
    fn test_multi_variable() {
        let out = run("x**2 + y**2");
        assert_eq!(out.get_str("verdict"), Some("multi_var_undetermined_or_candidate"));
        assert_eq!(out.get("gradient_latex"), Some(&json!(["2 x", "2 y"])));
        assert_eq!(out.get("principal_minors_latex"), Some(&json!(["2", "4"])));
        assert_eq!(out.get("critical_points"), Some(&json!([{"point": ["0", "0"]}])));
    }

    #[test]
    fn test_parse_failure() {
        assert!(run("x**").is_error());
    }
}
