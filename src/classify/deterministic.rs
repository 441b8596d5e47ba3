//! Structural classification rules
//!
//! First match wins: a derivative construct, an integral construct, a single
//! relation, a tuple of relations or expressions. Linearity here means total
//! degree at most one, so `x*y = 1` is nonlinear.

use super::UnifiedLabel;
use crate::ast::ExprKind;
use crate::parser::parse;
use crate::poly::total_degree;
use crate::Expr;

/// `lhs - rhs` of a relation, the expression itself otherwise.
fn as_zero_form(e: &Expr) -> Expr {
    match e.kind() {
        ExprKind::Relation { lhs, rhs, .. } => Expr::sub_expr(lhs.clone(), rhs.clone()),
        _ => e.clone(),
    }
}

fn is_linear_member(e: &Expr) -> bool {
    total_degree(&as_zero_form(e)).is_some_and(|d| d <= 1)
}

/// Label of `expr_str` with confidence `1.0`, or `None` when no rule applies
/// or the string does not parse.
///
/// # Example
/// ```
/// use symb_solve::classify::{UnifiedLabel, deterministic_classify};
///
/// assert_eq!(
///     deterministic_classify("x**2 - 4 = 0"),
///     Some((UnifiedLabel::EquationNonlinear, 1.0))
/// );
/// assert_eq!(deterministic_classify("x**2"), None);
/// ```
pub fn deterministic_classify(expr_str: &str) -> Option<(UnifiedLabel, f64)> {
    let obj = match parse(expr_str) {
        Ok(obj) => obj,
        Err(e) => {
            tracing::debug!(error = %e, "deterministic tier could not parse input");
            return None;
        }
    };

    let label = if obj.contains_derivative() {
        UnifiedLabel::Derivative
    } else if obj.contains_integral() {
        UnifiedLabel::Integral
    } else if obj.is_relational() {
        let zero_form = as_zero_form(&obj);
        if !zero_form.free_symbols().is_empty() && is_linear_member(&obj) {
            UnifiedLabel::EquationLinear
        } else {
            UnifiedLabel::EquationNonlinear
        }
    } else if let ExprKind::Tuple(members) = obj.kind() {
        if members.iter().all(is_linear_member) {
            UnifiedLabel::SystemLinear
        } else {
            UnifiedLabel::SystemNonlinear
        }
    } else {
        return None;
    };
    Some((label, 1.0))
}
