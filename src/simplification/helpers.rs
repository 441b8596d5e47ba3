//! Pattern helpers shared by the simplification rules

use crate::Expr;
use crate::ast::ExprKind;

/// The argument of `name(arg)`, if `e` is that call.
pub(crate) fn unary_arg<'a>(e: &'a Expr, name: &str) -> Option<&'a Expr> {
    match e.kind() {
        ExprKind::Function { name: n, args } if n.name() == name && args.len() == 1 => {
            Some(&args[0])
        }
        _ => None,
    }
}

/// The argument of `name(arg)**2`.
pub(crate) fn squared_call<'a>(e: &'a Expr, name: &str) -> Option<&'a Expr> {
    match e.kind() {
        ExprKind::Pow(base, exp) if exp.as_rational().and_then(|r| r.to_i64()) == Some(2) => {
            unary_arg(base, name)
        }
        _ => None,
    }
}

/// Factors of a product, or the expression itself.
pub(crate) fn factors(e: &Expr) -> Vec<Expr> {
    match e.kind() {
        ExprKind::Product(fs) => fs.clone(),
        _ => vec![e.clone()],
    }
}

/// Terms of a sum, or the expression itself.
pub(crate) fn terms(e: &Expr) -> Vec<Expr> {
    match e.kind() {
        ExprKind::Sum(ts) => ts.clone(),
        _ => vec![e.clone()],
    }
}

/// `e / f` for a factor `f` of `e`; the canonical product cancels the base.
pub(crate) fn cofactor(e: &Expr, f: &Expr) -> Expr {
    Expr::product(vec![e.clone(), Expr::recip(f.clone())])
}

/// Sum of `terms` with the entries at `skip` removed and `extra` added.
pub(crate) fn replace_terms(terms: &[Expr], skip: &[usize], extra: Expr) -> Expr {
    let mut out: Vec<Expr> = terms
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .map(|(_, t)| t.clone())
        .collect();
    out.push(extra);
    Expr::sum(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_squared_call() {
        let x = sym("x");
        let s2 = Expr::pow(Expr::func1("sin", x.to_expr()), Expr::integer(2));
        assert_eq!(squared_call(&s2, "sin"), Some(&x.to_expr()));
        assert_eq!(squared_call(&s2, "cos"), None);
    }

    #[test]
    fn test_cofactor_cancels() {
        let x = sym("x");
        let s = Expr::func1("sin", x.to_expr());
        let e = Expr::product(vec![Expr::integer(3), x.to_expr(), s.clone()]);
        assert_eq!(cofactor(&e, &s), x.to_expr() * 3);
    }
}
