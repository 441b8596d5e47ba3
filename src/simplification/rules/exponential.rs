use std::sync::Arc;

use crate::Expr;
use crate::ast::{Constant, ExprKind};
use crate::simplification::helpers::{terms, unary_arg};
use crate::simplification::rules::{NodeKind, Rule, RuleContext};

/// `c * log(u)` with rational `c`, as `(c, u)`.
fn scaled_log(e: &Expr) -> Option<(Expr, Expr)> {
    let (c, rest) = e.as_coeff_mul();
    let u = unary_arg(&rest, "log")?;
    match c {
        crate::number::Numeric::Exact(r) => Some((Expr::rational(r), u.clone())),
        crate::number::Numeric::Approx(_) => None,
    }
}

rule!(
    ExpOfLogRule,
    "exp_of_log",
    90,
    Exponential,
    &[NodeKind::Pow],
    |expr: &Expr, _context: &RuleContext| {
        // E**(c*log(u) + v) = u**c * E**v
        let ExprKind::Pow(base, exp) = expr.kind() else {
            return None;
        };
        if !base.is_constant(Constant::E) {
            return None;
        }
        let mut powers = Vec::new();
        let mut rest = Vec::new();
        for t in terms(exp) {
            match scaled_log(&t) {
                Some((c, u)) => powers.push(Expr::pow(u, c)),
                None => rest.push(t),
            }
        }
        if powers.is_empty() {
            return None;
        }
        powers.push(Expr::exp(Expr::sum(rest)));
        Some(Expr::product(powers))
    }
);

rule!(
    LogOfExpRule,
    "log_of_exp",
    90,
    Exponential,
    &[NodeKind::Function],
    |expr: &Expr, _context: &RuleContext| {
        // log(E**u) = u for real u
        let u = unary_arg(expr, "log")?;
        match u.kind() {
            ExprKind::Pow(b, e) if b.is_constant(Constant::E) && !e.has_imaginary() => {
                Some(e.clone())
            }
            _ => None,
        }
    }
);

pub(crate) fn get_exponential_rules() -> Vec<Arc<dyn Rule>> {
    vec![Arc::new(ExpOfLogRule), Arc::new(LogOfExpRule)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_exp_of_scaled_log() {
        let x = sym("x").to_expr();
        let e = Expr::new(ExprKind::Pow(
            Expr::e(),
            Expr::product(vec![Expr::integer(3), Expr::func1("log", x.clone())]),
        ));
        assert_eq!(
            ExpOfLogRule.apply(&e, &RuleContext::default()),
            Some(Expr::pow(x, Expr::integer(3)))
        );
    }

    #[test]
    fn test_log_of_exp() {
        let x = sym("x").to_expr();
        let e = Expr::func_raw("log", vec![Expr::exp(x.clone())]);
        assert_eq!(LogOfExpRule.apply(&e, &RuleContext::default()), Some(x));
    }
}
