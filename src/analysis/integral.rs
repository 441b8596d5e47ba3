//! Integrals given either as a construct or as a bare integrand

use serde_json::Value;

use super::{AnalysisResult, Fields, sorted_variables};
use crate::ast::ExprKind;
use crate::config::SolveLimits;
use crate::error::SolveError;
use crate::integrate::{Integrated, Technique, evaluate_integral_construct, evaluate_integrals, integrate};
use crate::parser::{Tier, parse_tier, parse_with_limits};
use crate::solve::Budget;
use crate::{Expr, Symbol};

const PARSE_PHASE: &str = "Integral parse error";
const EVAL_PHASE: &str = "Integral evaluation error";

struct Evaluated {
    value: Expr,
    technique: Option<Technique>,
    method: String,
}

fn mentions_integral(expr_str: &str) -> bool {
    let lowered = expr_str.to_lowercase();
    lowered.contains("integral") || lowered.contains("integrate(")
}

fn first_variable(e: &Expr) -> Result<Symbol, SolveError> {
    sorted_variables(e)
        .into_iter()
        .next()
        .ok_or(SolveError::NoFreeVariable)
}

fn with_technique(method: String, out: Integrated) -> Evaluated {
    Evaluated {
        value: out.result,
        technique: Some(out.technique),
        method,
    }
}

/// Integrate a plain expression in its first variable, tagging the method
/// with `prefix` and the variable name.
fn integrate_plain(e: &Expr, prefix: &str, budget: &mut Budget) -> Result<Evaluated, SolveError> {
    let x = first_variable(e)?;
    let out = integrate(e, &x, budget)?;
    Ok(with_technique(format!("{}_{}", prefix, x), out))
}

/// An expression that holds integral constructs below its root.
fn evaluate_parsed(e: &Expr, budget: &mut Budget) -> Result<Evaluated, SolveError> {
    if matches!(e.kind(), ExprKind::Integral { .. }) {
        let out = evaluate_integral_construct(e, budget)?;
        return Ok(with_technique("parsed_integral".into(), out));
    }
    if e.contains_integral() {
        return Ok(Evaluated {
            value: evaluate_integrals(e, budget)?,
            technique: None,
            method: "parsed_integral".into(),
        });
    }
    integrate_plain(e, "integrate_wrt", budget)
}

fn evaluate(expr_str: &str, limits: &SolveLimits) -> Result<Evaluated, AnalysisResult> {
    let mut budget = Budget::new(*limits);
    let parsed = parse_with_limits(expr_str, limits);
    let eval_err = |e: SolveError| AnalysisResult::failed(EVAL_PHASE, e);

    if let Ok(e) = &parsed
        && matches!(e.kind(), ExprKind::Integral { .. })
    {
        let out = evaluate_integral_construct(e, &mut budget).map_err(eval_err)?;
        return Ok(with_technique("Integral.doit".into(), out));
    }

    if mentions_integral(expr_str) {
        tracing::debug!(input = %expr_str, "integral keyword found, re-parsing literally");
        return match parse_tier(expr_str, Tier::Strict, limits) {
            Ok(e) => evaluate_parsed(&e, &mut budget).map_err(eval_err),
            Err(strict) => {
                let plain = parsed.map_err(|_| AnalysisResult::failed(PARSE_PHASE, strict))?;
                integrate_plain(&plain, "fallback_integrate_wrt", &mut budget).map_err(eval_err)
            }
        };
    }

    let e = parsed.map_err(|e| AnalysisResult::failed(PARSE_PHASE, e))?;
    integrate_plain(&e, "integrate_wrt", &mut budget).map_err(eval_err)
}

/// Evaluate an integral construct, or integrate a bare expression in its
/// alphabetically first variable.
///
/// # Example
/// ```
/// use symb_solve::analysis::handle_integral;
/// use symb_solve::config::SolveLimits;
///
/// let out = handle_integral("x**2", &SolveLimits::default());
/// assert_eq!(out.get_str("result"), Some("x**3/3"));
/// assert_eq!(out.get_str("method"), Some("integrate_wrt_x"));
/// ```
pub fn handle_integral(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let Evaluated {
        value,
        technique,
        method,
    } = match evaluate(expr_str, limits) {
        Ok(out) => out,
        Err(failure) => return failure,
    };

    let mut fields = Fields::new();
    fields.insert("result".into(), value.to_string().into());
    fields.insert("srepr".into(), value.to_srepr().into());
    fields.insert("latex".into(), value.to_latex().into());
    fields.insert("method".into(), method.into());
    fields.insert(
        "technique".into(),
        technique.map_or(Value::Null, |t| t.as_str().into()),
    );
    AnalysisResult::Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    fn run(s: &str) -> AnalysisResult {
        handle_integral(s, &SolveLimits::default())
    }

    #[test]
    fn test_plain_integrand() {
        let out = run("x**2");
        assert_eq!(out.get_str("result"), Some("x**3/3"));
        assert_eq!(out.get_str("latex"), Some(r"\frac{x^{3}}{3}"));
        assert_eq!(out.get_str("technique"), Some("power_rule"));
    }

    #[test]
    fn test_construct_is_evaluated_directly() {
        let out = run("Integral(x, (x, 0, 2))");
        assert_eq!(out.get_str("result"), Some("2"));
        assert_eq!(out.get_str("method"), Some("Integral.doit"));
        assert_eq!(out.get_str("srepr"), Some("Integer(2)"));
    }

    #[test]
    fn test_keyword_strategies() {
        let out = run("Integral(cos(t), t) + 1");
        assert_eq!(out.get_str("method"), Some("parsed_integral"));
        assert_eq!(out.get_str("result"), Some("sin(t) + 1"));
        assert_eq!(out.get("technique"), Some(&Value::Null));
    }

    #[test]
    fn test_alphabetical_variable() {
        let out = run("y*x");
        assert_eq!(out.get_str("method"), Some("integrate_wrt_x"));
        let result = crate::parse(out.get_str("result").unwrap()).unwrap();
        assert_eq!(result, crate::parse("x**2*y/2").unwrap());
    }

    #[test]
    fn test_failures() {
        assert_eq!(
            run("5"),
            AnalysisResult::Error("Integral evaluation error: No free variable in expression".into())
        );
        assert!(run("exp(x**2)")
            .error_message()
            .unwrap()
            .starts_with("Integral evaluation error: Could not find an antiderivative"));
        assert!(run("x +").error_message().unwrap().starts_with("Integral parse error: "));
    }
}
