//! Canonical ordering for expressions.
//!
//! Provides the total order used to sort the children of sums and products.
//! Powers compare by base first and exponent second, so `x < x**2 < y`.

use std::cmp::Ordering as CmpOrdering;

use super::{Expr, ExprKind};

/// Compare expressions for canonical ordering.
/// Order: Numbers < Constants < Symbols (by power) < Functions < Products < Sums < constructs
pub fn expr_cmp(a: &Expr, b: &Expr) -> CmpOrdering {
    if a == b {
        return CmpOrdering::Equal;
    }
    let a_pow = matches!(a.kind(), ExprKind::Pow(..));
    let b_pow = matches!(b.kind(), ExprKind::Pow(..));
    if (a_pow || b_pow) && !a.is_number() && !b.is_number() {
        let (base_a, exp_a) = a.as_base_exp();
        let (base_b, exp_b) = b.as_base_exp();
        let by_base = expr_cmp(&base_a, &base_b).then_with(|| expr_cmp(&exp_a, &exp_b));
        if by_base != CmpOrdering::Equal {
            return by_base;
        }
    }
    rank(a).cmp(&rank(b)).then_with(|| cmp_same_kind(a, b))
}

fn rank(e: &Expr) -> u8 {
    match e.kind() {
        ExprKind::Number(_) | ExprKind::Float(_) => 0,
        ExprKind::Constant(_) => 1,
        ExprKind::Symbol(_) => 2,
        ExprKind::Pow(..) => 3,
        ExprKind::Function { .. } => 4,
        ExprKind::Product(_) => 5,
        ExprKind::Sum(_) => 6,
        ExprKind::Derivative { .. } => 7,
        ExprKind::Integral { .. } => 8,
        ExprKind::Relation { .. } => 9,
        ExprKind::Tuple(_) => 10,
    }
}

fn cmp_slices(a: &[Expr], b: &[Expr]) -> CmpOrdering {
    for (x, y) in a.iter().rev().zip(b.iter().rev()) {
        match expr_cmp(x, y) {
            CmpOrdering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

fn cmp_same_kind(a: &Expr, b: &Expr) -> CmpOrdering {
    use ExprKind::{
        Constant, Derivative, Float, Function, Integral, Number, Pow, Product, Relation, Sum,
        Symbol, Tuple,
    };
    match (a.kind(), b.kind()) {
        (Number(x), Number(y)) => x.cmp(y),
        (Float(x), Float(y)) => x.0.total_cmp(&y.0),
        (Number(_) | Float(_), Number(_) | Float(_)) => {
            let (x, y) = (
                a.as_numeric().map_or(0.0, |n| n.to_f64()),
                b.as_numeric().map_or(0.0, |n| n.to_f64()),
            );
            x.total_cmp(&y)
                .then_with(|| matches!(a.kind(), Float(_)).cmp(&matches!(b.kind(), Float(_))))
        }
        (Constant(x), Constant(y)) => x.cmp(y),
        (Symbol(x), Symbol(y)) => x.cmp(y),
        (Pow(b1, e1), Pow(b2, e2)) => expr_cmp(b1, b2).then_with(|| expr_cmp(e1, e2)),
        (Function { name: n1, args: a1 }, Function { name: n2, args: a2 }) => {
            n1.cmp(n2).then_with(|| cmp_slices(a1, a2))
        }
        (Product(f1), Product(f2)) => cmp_slices(f1, f2),
        (Sum(t1), Sum(t2)) => cmp_slices(t1, t2),
        (Tuple(t1), Tuple(t2)) => cmp_slices(t1, t2),
        (
            Derivative {
                inner: i1,
                vars: v1,
            },
            Derivative {
                inner: i2,
                vars: v2,
            },
        ) => v1.cmp(v2).then_with(|| expr_cmp(i1, i2)),
        (
            Integral {
                integrand: f1,
                var: v1,
                bounds: b1,
            },
            Integral {
                integrand: f2,
                var: v2,
                bounds: b2,
            },
        ) => v1
            .cmp(v2)
            .then_with(|| expr_cmp(f1, f2))
            .then_with(|| match (b1, b2) {
                (None, None) => CmpOrdering::Equal,
                (None, Some(_)) => CmpOrdering::Less,
                (Some(_), None) => CmpOrdering::Greater,
                (Some((l1, h1)), Some((l2, h2))) => {
                    expr_cmp(l1, l2).then_with(|| expr_cmp(h1, h2))
                }
            }),
        (
            Relation {
                op: o1,
                lhs: l1,
                rhs: r1,
            },
            Relation {
                op: o2,
                lhs: l2,
                rhs: r2,
            },
        ) => o1
            .cmp(o2)
            .then_with(|| expr_cmp(l1, l2))
            .then_with(|| expr_cmp(r1, r2)),
        _ => CmpOrdering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_numbers_first_then_symbols_by_power() {
        let x = sym("x");
        let mut v = vec![x.pow(2), Expr::integer(3), sym("y").to_expr(), x.to_expr()];
        v.sort_by(expr_cmp);
        assert_eq!(
            v,
            vec![Expr::integer(3), x.to_expr(), x.pow(2), sym("y").to_expr()]
        );
    }

    #[test]
    fn test_order_is_antisymmetric() {
        let x = sym("x");
        let pairs = [
            (x.pow(2), Expr::func1("sin", x.to_expr())),
            (x.to_expr() * sym("y"), x.pow(3)),
            (Expr::float(1.5), Expr::frac(3, 2)),
        ];
        for (a, b) in pairs {
            assert_eq!(expr_cmp(&a, &b), expr_cmp(&b, &a).reverse());
        }
    }
}
