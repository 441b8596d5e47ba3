//! Inspection of a bare expression

use serde_json::{Map, Value};

use super::{AnalysisResult, Fields, names, sorted_variables};
use crate::config::SolveLimits;
use crate::parser::parse_with_limits;
use crate::poly::{degree_in, is_polynomial_in};
use crate::simplification::{expand_limited, simplify};
use crate::solve::Budget;

/// Simplified form, renderings, free symbols and polynomial structure.
///
/// # Example
/// ```
/// use symb_solve::analysis::analyze_expression;
/// use symb_solve::config::SolveLimits;
///
/// let out = analyze_expression("x*x + 2*x*y", &SolveLimits::default());
/// assert_eq!(out.get("is_polynomial"), Some(&true.into()));
/// assert_eq!(out.get("poly_degrees").unwrap()["x"], 2);
/// ```
pub fn analyze_expression(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let expr = match parse_with_limits(expr_str, limits) {
        Ok(e) => simplify(&e),
        Err(e) => return AnalysisResult::failed("Expression parse error", e),
    };
    let budget = Budget::new(*limits);
    if let Err(e) = budget.check_size(&expr) {
        return AnalysisResult::failed("Expression analysis error", e);
    }

    let vars = sorted_variables(&expr);
    let is_polynomial = !vars.is_empty() && is_polynomial_in(&expr, &vars);

    let mut fields = Fields::new();
    fields.insert("result".into(), expr.to_string().into());
    fields.insert("srepr".into(), expr.to_srepr().into());
    fields.insert("latex".into(), expr.to_latex().into());
    fields.insert("free_symbols".into(), names(&vars).into());
    fields.insert("is_polynomial".into(), is_polynomial.into());
    if is_polynomial {
        let degrees: Map<String, Value> = vars
            .iter()
            .filter_map(|v| Some((v.name().to_string(), degree_in(&expr, v)?.into())))
            .collect();
        fields.insert("poly_degrees".into(), Value::Object(degrees));
    }
    match expand_limited(&expr, budget.max_terms()) {
        Ok(expanded) if expanded != expr => {
            fields.insert("expanded".into(), expanded.to_string().into());
        }
        Ok(_) => {}
        Err(e) => tracing::debug!(error = %e, "expansion skipped"),
    }
    AnalysisResult::Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(s: &str) -> AnalysisResult {
        analyze_expression(s, &SolveLimits::default())
    }

    #[test]
    fn test_polynomial_inspection() {
        let out = run("(x + 1)**2");
        assert_eq!(out.get_str("result"), Some("(x + 1)**2"));
        assert_eq!(out.get_str("expanded"), Some("x**2 + 2*x + 1"));
        assert_eq!(out.get("free_symbols"), Some(&json!(["x"])));
        assert_eq!(out.get("poly_degrees"), Some(&json!({"x": 2})));
    }

    #[test]
    fn test_non_polynomial() {
        let out = run("sin(x) + y");
        assert_eq!(out.get("is_polynomial"), Some(&json!(false)));
        assert_eq!(out.get("poly_degrees"), None);
        assert_eq!(out.get("expanded"), None);
    }

    #[test]
    fn test_constant() {
        let out = run("2 + 3");
        assert_eq!(out.get_str("result"), Some("5"));
        assert_eq!(out.get("free_symbols"), Some(&json!([])));
        assert_eq!(out.get("is_polynomial"), Some(&json!(false)));
    }
}
