use std::sync::Arc;

use crate::Expr;
use crate::ast::ExprKind;
use crate::simplification::helpers::{cofactor, factors, replace_terms, squared_call};
use crate::simplification::rules::{NodeKind, Rule, RuleContext};

rule!(
    HyperbolicIdentityRule,
    "hyperbolic_identity",
    80,
    Hyperbolic,
    &[NodeKind::Sum],
    |expr: &Expr, _context: &RuleContext| {
        // k*cosh(u)^2 - k*sinh(u)^2 = k
        let ExprKind::Sum(terms) = expr.kind() else {
            return None;
        };
        for (i, term) in terms.iter().enumerate() {
            for f in factors(term) {
                let Some(u) = squared_call(&f, "cosh") else {
                    continue;
                };
                let k = cofactor(term, &f);
                let partner = Expr::product(vec![
                    Expr::negate(k.clone()),
                    Expr::pow(Expr::func1("sinh", u.clone()), Expr::integer(2)),
                ]);
                if let Some(j) = terms.iter().position(|t| *t == partner) {
                    return Some(replace_terms(terms, &[i, j], k));
                }
            }
        }
        None
    }
);

rule!(
    HyperbolicRatioRule,
    "hyperbolic_ratio",
    60,
    Hyperbolic,
    &[NodeKind::Product],
    |expr: &Expr, _context: &RuleContext| {
        // sinh(u) / cosh(u) = tanh(u)
        let ExprKind::Product(fs) = expr.kind() else {
            return None;
        };
        for (i, f) in fs.iter().enumerate() {
            let Some(u) = crate::simplification::helpers::unary_arg(f, "sinh") else {
                continue;
            };
            let wanted = Expr::recip(Expr::func1("cosh", u.clone()));
            if let Some(j) = fs.iter().position(|g| *g == wanted) {
                let mut rest: Vec<Expr> = fs
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != i && *k != j)
                    .map(|(_, g)| g.clone())
                    .collect();
                rest.push(Expr::func1("tanh", u.clone()));
                return Some(Expr::product(rest));
            }
        }
        None
    }
);

pub(crate) fn get_hyperbolic_rules() -> Vec<Arc<dyn Rule>> {
    vec![Arc::new(HyperbolicIdentityRule), Arc::new(HyperbolicRatioRule)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_cosh_squared_minus_sinh_squared() {
        let x = sym("x").to_expr();
        let e = Expr::sub_expr(
            Expr::pow(Expr::func1("cosh", x.clone()), Expr::integer(2)),
            Expr::pow(Expr::func1("sinh", x), Expr::integer(2)),
        );
        assert_eq!(
            HyperbolicIdentityRule.apply(&e, &RuleContext::default()),
            Some(Expr::one())
        );
    }

    #[test]
    fn test_sinh_over_cosh() {
        let x = sym("x").to_expr();
        let e = Expr::div_expr(Expr::func1("sinh", x.clone()), Expr::func1("cosh", x.clone()));
        assert_eq!(
            HyperbolicRatioRule.apply(&e, &RuleContext::default()),
            Some(Expr::func1("tanh", x))
        );
    }
}
