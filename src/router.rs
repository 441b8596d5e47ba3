//! Dispatch of `(query_type, expression)` pairs to the analyzers
//!
//! The query type comes from an upstream classifier as free text and is
//! matched exactly against [`QueryType`]. Equations and systems are sent to
//! the linear or nonlinear solver according to a structural linearity
//! check.

use std::fmt;
use std::str::FromStr;

use crate::analysis::{
    AnalysisResult, analyze_expression, analyze_multivariable_convexity, handle_derivative,
    handle_integral, solve_convexity, solve_linear_equation, solve_linear_system_str,
    solve_nonlinear_equation, solve_nonlinear_system_str,
};
use crate::config::SolveLimits;
use crate::error::SolveError;
use crate::parser::parse_with_limits;
use crate::poly::{degree_in, total_degree};
use crate::simplification::expand;
use crate::simplification::helpers::terms;
use crate::Expr;

/// Coarse query kinds accepted by [`route_query`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Equation,
    Convexity,
    /// Routed like `Convexity`
    Expression,
    System,
    Derivative,
    Integral,
}

impl QueryType {
    pub const ALL: [QueryType; 6] = [
        QueryType::Equation,
        QueryType::Convexity,
        QueryType::Expression,
        QueryType::System,
        QueryType::Derivative,
        QueryType::Integral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::Equation => "equation",
            QueryType::Convexity => "convexity",
            QueryType::Expression => "expression",
            QueryType::System => "system",
            QueryType::Derivative => "derivative",
            QueryType::Integral => "integral",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryType::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| SolveError::UnsupportedQueryType(s.to_string()))
    }
}

/// Whether `lhs = rhs` is linear: polynomial in every variable, none of
/// them above degree one. Products of distinct variables still count as
/// linear here.
///
/// # Errors
/// Whatever splitting or parsing the equation reports.
pub fn is_linear_equation(expr_str: &str, limits: &SolveLimits) -> Result<bool, SolveError> {
    let (lhs, rhs) = crate::analysis::split_equation(expr_str, limits)?;
    let zero = Expr::sub_expr(lhs, rhs);
    Ok(zero
        .free_symbols()
        .iter()
        .all(|v| degree_in(&zero, v).is_some_and(|d| d <= 1)))
}

/// A term of degree at most one in all variables together, so neither a
/// power above one nor a product of two variables.
fn is_linear_term(term: &Expr) -> bool {
    total_degree(term).is_some_and(|d| d <= 1)
}

/// Whether every term of every member of a comma-separated system is
/// linear.
///
/// # Errors
/// Parse errors of any member.
pub fn is_linear_system(expr_str: &str, limits: &SolveLimits) -> Result<bool, SolveError> {
    for member in crate::analysis::parse_members(expr_str, limits)? {
        if let Some(term) = terms(&expand(&member)).into_iter().find(|t| !is_linear_term(t)) {
            tracing::debug!(%member, %term, "nonlinear term");
            return Ok(false);
        }
    }
    Ok(true)
}

fn route_convexity(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let expr = match parse_with_limits(expr_str, limits) {
        Ok(e) => e,
        Err(e) => return AnalysisResult::failed("Convexity parse error", e),
    };
    // A constant goes to the univariate analyzer, which reports it as such
    if expr.free_symbols().len() > 1 {
        analyze_multivariable_convexity(expr_str, limits)
    } else {
        solve_convexity(expr_str, limits)
    }
}

fn route_equation(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    match is_linear_equation(expr_str, limits) {
        Ok(true) => solve_linear_equation(expr_str, limits),
        Ok(false) => solve_nonlinear_equation(expr_str, limits),
        Err(e) => {
            // The solver reports the failure in its own terms
            tracing::debug!(error = %e, "linearity undecided");
            solve_nonlinear_equation(expr_str, limits)
        }
    }
}

fn route_system(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    match is_linear_system(expr_str, limits) {
        Ok(true) => solve_linear_system_str(expr_str, limits),
        Ok(false) => solve_nonlinear_system_str(expr_str, limits),
        Err(e) => AnalysisResult::failed("System parse error", e),
    }
}

/// Run the analyzer for an already-typed query.
pub fn route(query_type: QueryType, expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    tracing::info!(%query_type, input = %expr_str, "routing query");
    match query_type {
        QueryType::Convexity | QueryType::Expression => route_convexity(expr_str, limits),
        QueryType::Equation => route_equation(expr_str, limits),
        QueryType::System => route_system(expr_str, limits),
        QueryType::Derivative => handle_derivative(expr_str, limits),
        QueryType::Integral => handle_integral(expr_str, limits),
    }
}

/// Route a query whose type is still text.
///
/// # Example
/// ```
/// use symb_solve::config::SolveLimits;
/// use symb_solve::router::route_query;
///
/// let out = route_query("system", "2*x + 3*y - 5, x - y - 1", &SolveLimits::default());
/// assert_eq!(out.get("solution").unwrap()[0]["y"], r"\frac{3}{5}");
///
/// let out = route_query("limit", "x", &SolveLimits::default());
/// assert_eq!(out.error_message(), Some("Unsupported query type: limit"));
/// ```
pub fn route_query(query_type: &str, expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    match query_type.parse::<QueryType>() {
        Ok(q) => route(q, expr_str, limits),
        Err(e) => {
            tracing::warn!(%query_type, "unsupported query type");
            AnalysisResult::Error(e.to_string())
        }
    }
}

/// The inspector, which no query type reaches.
pub fn inspect(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    analyze_expression(expr_str, limits)
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
    fn test_query_type_is_exact() {
        assert_eq!("integral".parse::<QueryType>().unwrap(), QueryType::Integral);
        assert!("Integral".parse::<QueryType>().is_err());
        assert!(" system".parse::<QueryType>().is_err());
        for q in QueryType::ALL {
            assert_eq!(q.to_string().parse::<QueryType>().unwrap(), q);
        }
    }

    #[test]
    fn test_equation_detector() {
        assert!(is_linear_equation("2*x + 3 = 7", &limits()).unwrap());
        assert!(is_linear_equation("x*y = 1", &limits()).unwrap());
        assert!(!is_linear_equation("x**2 - 4 = 0", &limits()).unwrap());
        assert!(!is_linear_equation("sin(x) = 0", &limits()).unwrap());
        assert!(!is_linear_equation("1/x = 2", &limits()).unwrap());
        assert!(is_linear_equation("x + 1", &limits()).is_err());
    }

    #[test]
    fn test_system_detector() {
        assert!(is_linear_system("2*x + 3*y - 5, x - y - 1", &limits()).unwrap());
        assert!(!is_linear_system("x*y - 1, x - y", &limits()).unwrap());
        assert!(!is_linear_system("x**2 + y, x - y", &limits()).unwrap());
        assert!(!is_linear_system("exp(x) - y, x", &limits()).unwrap());
        assert!(is_linear_system("x + y = 3, x - y = 1", &limits()).unwrap());
    }

    #[test]
    fn test_equation_dispatch() {
        let out = route_query("equation", "x**2 - 4 = 0", &limits());
        assert_eq!(out.get_str("method"), Some("nonlinear"));
        assert_eq!(out.get("solution"), Some(&json!(["-2", "2"])));
        let out = route_query("equation", "3*x = 6", &limits());
        assert_eq!(out.get_str("method"), Some("linear"));
        let out = route_query("equation", "x**2 - 4", &limits());
        assert_eq!(out.error_message(), Some("Not an equation"));
    }

    #[test]
    fn test_convexity_dispatch() {
        let uni = route_query("convexity", "x**2", &limits());
        assert_eq!(uni.get_str("variable"), Some("x"));
        let multi = route_query("expression", "x**2 + y**2", &limits());
        assert!(multi.get("hessian").is_some());
        let constant = route_query("convexity", "7", &limits());
        assert_eq!(constant.get_str("verdict"), Some("constant_function"));
    }

    #[test]
    fn test_system_dispatch() {
        let out = route_query("system", "x**2 - y, x - y", &limits());
        assert_eq!(out.get("solution").unwrap().as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_calculus_dispatch() {
        let out = route_query("integral", "x**2", &limits());
        assert_eq!(out.get_str("result"), Some("x**3/3"));
        let out = route_query("derivative", "diff(x**3, x)", &limits());
        assert_eq!(out.get_str("first_derivative"), Some("3 x^{2}"));
    }
}
