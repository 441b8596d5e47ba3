//! Systems given as comma-separated expressions, each equal to zero

use serde_json::{Map, Value};

use super::{AnalysisResult, Fields, latex_all, names};
use crate::ast::ExprKind;
use crate::config::SolveLimits;
use crate::display::latex_tuple;
use crate::error::SolveError;
use crate::parser::parse_with_limits;
use crate::solve::{Budget, LinearSolution, solve_linear_system, solve_nonlinear_system};
use crate::{Expr, Symbol};

const PARSE_PHASE: &str = "System parse error";
const SOLVE_PHASE: &str = "System solve error";

/// Split at commas outside parentheses and brackets. One pair of
/// brackets around the whole input is dropped first.
pub(crate) fn split_top_level(input: &str) -> Vec<&str> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Each member as an expression equal to zero; `a = b` becomes `a - b`.
pub(crate) fn parse_members(input: &str, limits: &SolveLimits) -> Result<Vec<Expr>, SolveError> {
    let parts = split_top_level(input);
    if parts.is_empty() {
        return Err(SolveError::failure("Empty system"));
    }
    parts
        .into_iter()
        .map(|p| {
            let e = parse_with_limits(p, limits)?;
            Ok(match e.kind() {
                ExprKind::Relation { lhs, rhs, .. } => Expr::sub_expr(lhs.clone(), rhs.clone()),
                _ => e,
            })
        })
        .collect()
}

fn variable_union(eqs: &[Expr]) -> Vec<Symbol> {
    let mut all = std::collections::BTreeSet::new();
    for e in eqs {
        all.extend(e.free_symbols());
    }
    all.into_iter().collect()
}

fn equations_latex(eqs: &[Expr]) -> Vec<String> {
    eqs.iter()
        .map(|e| Expr::equation(e.clone(), Expr::zero()).to_latex())
        .collect()
}

/// Gauss-Jordan solution over the union of variables, one mapping per
/// solution (so an inconsistent system yields an empty list).
///
/// # Example
/// ```
/// use symb_solve::analysis::solve_linear_system_str;
/// use symb_solve::config::SolveLimits;
///
/// let out = solve_linear_system_str("2*x + 3*y - 5, x - y - 1", &SolveLimits::default());
/// assert_eq!(out.get("solution").unwrap()[0]["x"], r"\frac{8}{5}");
/// ```
pub fn solve_linear_system_str(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let eqs = match parse_members(expr_str, limits) {
        Ok(eqs) => eqs,
        Err(e) => return AnalysisResult::failed(PARSE_PHASE, e),
    };
    let vars = variable_union(&eqs);
    let mut budget = Budget::new(*limits);
    let solution = match solve_linear_system(&eqs, &vars, &mut budget) {
        Ok(LinearSolution::Solved(pairs)) => {
            let mapping: Map<String, Value> = pairs
                .into_iter()
                .map(|(v, e)| (v.name().to_string(), Value::String(e.to_latex())))
                .collect();
            vec![Value::Object(mapping)]
        }
        Ok(LinearSolution::Inconsistent) => Vec::new(),
        Err(e) => return AnalysisResult::failed(SOLVE_PHASE, e),
    };

    let mut fields = Fields::new();
    fields.insert("equations".into(), equations_latex(&eqs).into());
    fields.insert("variables".into(), names(&vars).into());
    fields.insert("solution".into(), Value::Array(solution));
    AnalysisResult::Ok(fields)
}

/// Solution tuples by recursive elimination, in sorted variable order.
pub fn solve_nonlinear_system_str(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let eqs = match parse_members(expr_str, limits) {
        Ok(eqs) => eqs,
        Err(e) => return AnalysisResult::failed(PARSE_PHASE, e),
    };
    let vars = variable_union(&eqs);
    let mut budget = Budget::new(*limits);
    let tuples = match solve_nonlinear_system(&eqs, &vars, &mut budget) {
        Ok(tuples) => tuples,
        Err(e) => return AnalysisResult::failed(SOLVE_PHASE, e),
    };

    let var_exprs: Vec<Expr> = vars.iter().map(Symbol::to_expr).collect();
    let mut fields = Fields::new();
    fields.insert("equations".into(), equations_latex(&eqs).into());
    fields.insert("variables".into(), latex_all(&var_exprs).into());
    fields.insert(
        "solution".into(),
        tuples.iter().map(|t| latex_tuple(t)).collect::<Vec<_>>().into(),
    );
    AnalysisResult::Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_top_level() {
        assert_eq!(split_top_level("x + y, f(x, y) - 1"), vec!["x + y", "f(x, y) - 1"]);
        assert_eq!(split_top_level("[a, b]"), vec!["a", "b"]);
        assert_eq!(split_top_level("x,"), vec!["x"]);
    }

    #[test]
    fn test_linear_scenario() {
        let out = solve_linear_system_str("2*x + 3*y - 5, x - y - 1", &SolveLimits::default());
        // 2*x + 3*y = 5 and x - y = 1 meet at (8/5, 3/5)
        assert_eq!(
            out.get("solution"),
            Some(&json!([{"x": r"\frac{8}{5}", "y": r"\frac{3}{5}"}]))
        );
        let out = solve_linear_system_str("x + y - 3, x - y - 1", &SolveLimits::default());
        assert_eq!(out.get("solution"), Some(&json!([{"x": "2", "y": "1"}])));
        assert_eq!(out.get("variables"), Some(&json!(["x", "y"])));
        assert_eq!(
            out.get("equations"),
            Some(&json!(["2 x + 3 y - 5 = 0", "x - y - 1 = 0"]))
        );
    }

    #[test]
    fn test_linear_inconsistent_and_equals_signs() {
        let out = solve_linear_system_str("x + y = 1, x + y = 2", &SolveLimits::default());
        assert_eq!(out.get("solution"), Some(&json!([])));
    }

    #[test]
    fn test_linear_rejects_nonlinear_member() {
        let out = solve_linear_system_str("x*y - 1, x - 1", &SolveLimits::default());
        assert!(out.error_message().unwrap().starts_with("System solve error: "));
    }

    #[test]
    fn test_nonlinear_tuples() {
        let out = solve_nonlinear_system_str("x**2 - y, x - y", &SolveLimits::default());
        assert_eq!(
            out.get("solution"),
            Some(&json!([r"\left( 0, \  0\right)", r"\left( 1, \  1\right)"]))
        );
        assert_eq!(out.get("variables"), Some(&json!(["x", "y"])));
        let equations = out.get("equations").unwrap().as_array().unwrap();
        assert!(equations.iter().all(|e| e.as_str().unwrap().ends_with(" = 0")));
        assert_eq!(equations[1], "x - y = 0");
    }

    #[test]
    fn test_parse_failure() {
        let out = solve_nonlinear_system_str("x**2 - , y", &SolveLimits::default());
        assert!(out.error_message().unwrap().starts_with("System parse error: "));
    }
}
