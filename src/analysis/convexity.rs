//! Convexity of a function of one or several variables

use serde_json::Value;

use super::{AnalysisResult, Fields, latex_all, names, sorted_variables};
use crate::ast::RelOp;
use crate::config::SolveLimits;
use crate::display::latex_matrix;
use crate::eval::{is_nonnegative, numeric_sign};
use crate::helpers::{gradient, hessian, leading_principal_minors};
use crate::parser::parse_with_limits;
use crate::simplification::simplify;
use crate::solve::{Budget, reduce_inequality};
use crate::{Expr, Symbol};

const TRUE_LATEX: &str = r"\text{True}";
const FALSE_LATEX: &str = r"\text{False}";

/// Reported alongside every multivariate verdict.
pub const IS_CONVEX_NOTE: &str =
    "All leading principal minors should be ≥ 0 for convexity (symbolically).";

/// Gradient, Hessian and leading principal minors in a fixed variable order.
#[derive(Debug, Clone, PartialEq)]
pub struct HessianReport {
    pub variables: Vec<Symbol>,
    pub gradient: Vec<Expr>,
    pub hessian: Vec<Vec<Expr>>,
    pub leading_principal_minors: Vec<Expr>,
    /// `Some(true)` when every minor is provably `≥ 0`, `Some(false)` when
    /// one is a negative number, `None` otherwise
    pub convex_verdict: Option<bool>,
}

impl HessianReport {
    pub fn compute(expr: &Expr, variables: Vec<Symbol>) -> Self {
        let gradient = gradient(expr, &variables);
        let hessian = hessian(expr, &variables);
        let leading_principal_minors = leading_principal_minors(&hessian);
        let convex_verdict = if leading_principal_minors.iter().all(is_nonnegative) {
            Some(true)
        } else if leading_principal_minors
            .iter()
            .any(|m| numeric_sign(m) == Some(-1))
        {
            Some(false)
        } else {
            None
        };
        HessianReport {
            variables,
            gradient,
            hessian,
            leading_principal_minors,
            convex_verdict,
        }
    }

    pub(crate) fn write_fields(&self, fields: &mut Fields) {
        fields.insert("variables".into(), names(&self.variables).into());
        fields.insert("gradient".into(), latex_all(&self.gradient).into());
        fields.insert("hessian".into(), latex_matrix(&self.hessian).into());
        fields.insert(
            "leading_principal_minors".into(),
            latex_all(&self.leading_principal_minors).into(),
        );
    }
}

fn truth_latex(holds: bool) -> String {
    if holds { TRUE_LATEX } else { FALSE_LATEX }.to_string()
}

/// `f'' ≥ 0` as a truth value when it is decidable, the relation otherwise.
fn convexity_condition(f2: &Expr) -> String {
    if f2.free_symbols().is_empty()
        && let Some(sign) = numeric_sign(f2)
    {
        return truth_latex(sign >= 0);
    }
    if is_nonnegative(f2) {
        return truth_latex(true);
    }
    Expr::relation(RelOp::Ge, f2.clone(), Expr::zero()).to_latex()
}

/// Second-derivative convexity test in the alphabetically first variable.
///
/// # Example
/// ```
/// use symb_solve::analysis::solve_convexity;
/// use symb_solve::config::SolveLimits;
///
/// let out = solve_convexity("x**3", &SolveLimits::default());
/// assert_eq!(out.get_str("second_derivative"), Some("6 x"));
/// assert_eq!(out.get_str("convex_domain"), Some(r"0 \leq x \wedge x < \infty"));
/// ```
pub fn solve_convexity(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let expr = match parse_with_limits(expr_str, limits) {
        Ok(e) => e,
        Err(e) => return AnalysisResult::failed("Convexity parse error", e),
    };

    let mut fields = Fields::new();
    fields.insert("expression".into(), expr.to_latex().into());

    let Some(x) = sorted_variables(&expr).into_iter().next() else {
        fields.insert("variable".into(), Value::Null);
        fields.insert("first_derivative".into(), "0".into());
        fields.insert("second_derivative".into(), "0".into());
        fields.insert("is_convex".into(), TRUE_LATEX.into());
        fields.insert("convex_domain".into(), TRUE_LATEX.into());
        fields.insert("verdict".into(), "constant_function".into());
        return AnalysisResult::Ok(fields);
    };

    let f1 = simplify(&expr.diff(&x));
    let f2 = simplify(&f1.diff(&x));
    let mut budget = Budget::new(*limits);
    let domain = match reduce_inequality(&f2, RelOp::Ge, &x, &mut budget) {
        Ok(set) => Value::String(set.to_latex()),
        Err(e) => {
            tracing::debug!(error = %e, "convex domain not reduced");
            Value::Null
        }
    };

    fields.insert("variable".into(), x.name().into());
    fields.insert("first_derivative".into(), f1.to_latex().into());
    fields.insert("second_derivative".into(), f2.to_latex().into());
    fields.insert("is_convex".into(), convexity_condition(&f2).into());
    fields.insert("convex_domain".into(), domain);
    AnalysisResult::Ok(fields)
}

/// Hessian test over all free variables, sorted by name.
///
/// # Example
/// ```
/// use symb_solve::analysis::analyze_multivariable_convexity;
/// use symb_solve::config::SolveLimits;
///
/// let out = analyze_multivariable_convexity("x**2 + y**2", &SolveLimits::default());
/// assert_eq!(out.get("leading_principal_minors").unwrap(), &serde_json::json!(["2", "4"]));
/// assert_eq!(out.get("convex_verdict").unwrap(), &serde_json::json!(true));
/// ```
pub fn analyze_multivariable_convexity(expr_str: &str, limits: &SolveLimits) -> AnalysisResult {
    let expr = match parse_with_limits(expr_str, limits) {
        Ok(e) => e,
        Err(e) => return AnalysisResult::failed("Multivariable convexity parse error", e),
    };
    if let Err(e) = Budget::new(*limits).check_size(&expr) {
        return AnalysisResult::failed("Multivariable convexity error", e);
    }

    let report = HessianReport::compute(&expr, sorted_variables(&expr));
    let mut fields = Fields::new();
    fields.insert("expression".into(), expr.to_latex().into());
    report.write_fields(&mut fields);
    fields.insert("is_convex_note".into(), IS_CONVEX_NOTE.into());
    fields.insert(
        "convex_verdict".into(),
        report.convex_verdict.map_or(Value::Null, Value::Bool),
    );
    AnalysisResult::Ok(fields)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};
    use serde_json::json;

    #[test]
    fn test_univariate_fields() {
        let out = solve_convexity("x**2", &SolveLimits::default());
        assert_eq!(out.get_str("first_derivative"), Some("2 x"));
        assert_eq!(out.get_str("second_derivative"), Some("2"));
        assert_eq!(out.get_str("is_convex"), Some(TRUE_LATEX));
        assert_eq!(out.get_str("convex_domain"), Some(TRUE_LATEX));
    }

    #[test]
    fn test_conditional_convexity() {
        let out = solve_convexity("x**3", &SolveLimits::default());
        assert_eq!(out.get_str("is_convex"), Some(r"6 x \geq 0"));
        let out = solve_convexity("-x**2", &SolveLimits::default());
        assert_eq!(out.get_str("is_convex"), Some(FALSE_LATEX));
        assert_eq!(out.get_str("convex_domain"), Some(FALSE_LATEX));
    }

    #[test]
    fn test_unreducible_domain_is_null() {
        let out = solve_convexity("sin(x)", &SolveLimits::default());
        assert_eq!(out.get("convex_domain"), Some(&Value::Null));
        assert!(out.is_ok());
    }

    #[test]
    fn test_constant_policy() {
        let out = solve_convexity("5", &SolveLimits::default());
        assert_eq!(out.get_str("verdict"), Some("constant_function"));
        assert_eq!(out.get_str("is_convex"), Some(TRUE_LATEX));
    }

    #[test]
    fn test_multivariate_scenario() {
        let out = analyze_multivariable_convexity("x**2 + y**2", &SolveLimits::default());
        assert_eq!(out.get("gradient"), Some(&json!(["2 x", "2 y"])));
        assert_eq!(
            out.get_str("hessian"),
            Some(r"\left[\begin{matrix}2 & 0\\0 & 2\end{matrix}\right]")
        );
        assert_eq!(out.get_str("is_convex_note"), Some(IS_CONVEX_NOTE));
    }

    #[test]
    fn test_report_verdicts() {
        let vars = vec![sym("x"), sym("y")];
        let saddle = HessianReport::compute(&parse("x**2 - y**2").unwrap(), vars.clone());
        assert_eq!(saddle.convex_verdict, Some(false));
        let unknown = HessianReport::compute(&parse("x**3 + y**2").unwrap(), vars);
        assert_eq!(unknown.convex_verdict, None);
    }

    #[test]
    fn test_parse_error_prefix() {
        let out = analyze_multivariable_convexity("x +* y", &SolveLimits::default());
        assert!(out
            .error_message()
            .unwrap()
            .starts_with("Multivariable convexity parse error: "));
    }
}
