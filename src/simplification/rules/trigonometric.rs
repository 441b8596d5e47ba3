use std::sync::Arc;

use crate::Expr;
use crate::ast::ExprKind;
use crate::simplification::helpers::{cofactor, factors, replace_terms, squared_call, unary_arg};
use crate::simplification::rules::{NodeKind, Rule, RuleContext};

rule!(
    PythagoreanIdentityRule,
    "pythagorean_identity",
    80,
    Trigonometric,
    &[NodeKind::Sum],
    |expr: &Expr, _context: &RuleContext| {
        // k*sin(u)^2 + k*cos(u)^2 = k
        let ExprKind::Sum(terms) = expr.kind() else {
            return None;
        };
        for (i, term) in terms.iter().enumerate() {
            for f in factors(term) {
                let Some(u) = squared_call(&f, "sin") else {
                    continue;
                };
                let k = cofactor(term, &f);
                let partner = Expr::product(vec![
                    k.clone(),
                    Expr::pow(Expr::func1("cos", u.clone()), Expr::integer(2)),
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
    SinCosRatioRule,
    "sin_cos_ratio",
    60,
    Trigonometric,
    &[NodeKind::Product],
    |expr: &Expr, _context: &RuleContext| {
        // sin(u)^a * cos(u)^-a = tan(u)^a
        let ExprKind::Product(fs) = expr.kind() else {
            return None;
        };
        for (i, f) in fs.iter().enumerate() {
            let (base, exp) = f.as_base_exp();
            let Some(u) = unary_arg(&base, "sin") else {
                continue;
            };
            let wanted = Expr::pow(Expr::func1("cos", u.clone()), Expr::negate(exp.clone()));
            if let Some(j) = fs.iter().position(|g| *g == wanted) {
                let mut rest: Vec<Expr> = fs
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != i && *k != j)
                    .map(|(_, g)| g.clone())
                    .collect();
                rest.push(Expr::pow(Expr::func1("tan", u.clone()), exp));
                return Some(Expr::product(rest));
            }
        }
        None
    }
);

rule!(
    DoubleAngleSineRule,
    "double_angle_sine",
    50,
    Trigonometric,
    &[NodeKind::Product],
    |expr: &Expr, _context: &RuleContext| {
        // sin(u) * cos(u) = sin(2u) / 2
        let ExprKind::Product(fs) = expr.kind() else {
            return None;
        };
        let coeff = expr.as_coeff_mul().0;
        // Only when it absorbs an even coefficient, otherwise the result is not simpler
        let even = match &coeff {
            crate::number::Numeric::Exact(r) => {
                r.is_integer() && r.to_i64().is_some_and(|n| n % 2 == 0)
            }
            crate::number::Numeric::Approx(_) => false,
        };
        if !even {
            return None;
        }
        for (i, f) in fs.iter().enumerate() {
            let Some(u) = unary_arg(f, "sin") else {
                continue;
            };
            let cos = Expr::func1("cos", u.clone());
            if let Some(j) = fs.iter().position(|g| *g == cos) {
                let mut rest: Vec<Expr> = fs
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| *k != i && *k != j)
                    .map(|(_, g)| g.clone())
                    .collect();
                rest.push(Expr::half());
                rest.push(Expr::func1("sin", Expr::product(vec![Expr::integer(2), u.clone()])));
                return Some(Expr::product(rest));
            }
        }
        None
    }
);

pub(crate) fn get_trigonometric_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(PythagoreanIdentityRule),
        Arc::new(SinCosRatioRule),
        Arc::new(DoubleAngleSineRule),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym;

    fn sq(name: &str, u: Expr) -> Expr {
        Expr::pow(Expr::func1(name, u), Expr::integer(2))
    }

    #[test]
    fn test_pythagorean_with_cofactor() {
        let x = sym("x");
        let y = sym("y").to_expr();
        let e = Expr::sum(vec![
            Expr::product(vec![y.clone(), sq("sin", x.to_expr())]),
            Expr::product(vec![y.clone(), sq("cos", x.to_expr())]),
            Expr::integer(1),
        ]);
        let out = PythagoreanIdentityRule.apply(&e, &RuleContext::default());
        assert_eq!(out, Some(Expr::sum(vec![y, Expr::one()])));
    }

    #[test]
    fn test_sin_over_cos() {
        let x = sym("x").to_expr();
        let e = Expr::div_expr(Expr::func1("sin", x.clone()), Expr::func1("cos", x.clone()));
        let out = SinCosRatioRule.apply(&e, &RuleContext::default());
        assert_eq!(out, Some(Expr::func1("tan", x)));
    }

    #[test]
    fn test_double_angle_needs_even_coefficient() {
        let x = sym("x").to_expr();
        let sc = Expr::product(vec![Expr::func1("sin", x.clone()), Expr::func1("cos", x.clone())]);
        assert!(DoubleAngleSineRule.apply(&sc, &RuleContext::default()).is_none());
        let two_sc = Expr::product(vec![Expr::integer(2), sc]);
        assert_eq!(
            DoubleAngleSineRule.apply(&two_sc, &RuleContext::default()),
            Some(Expr::func1("sin", x * 2))
        );
    }
}
