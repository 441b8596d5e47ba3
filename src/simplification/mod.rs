//! Simplification framework - reduces expressions
//!
//! [`simplify`] runs the rule engine and then keeps whichever of the result,
//! its cancelled fraction and its expansion is smallest. [`expand`] and
//! [`cancel`] are also used directly by the solvers.
pub(crate) mod engine;
pub(crate) mod helpers;
mod rules;

use dashu::integer::IBig;

use crate::ast::ExprKind;
use crate::config::DEFAULT_MAX_TERMS;
use crate::error::SolveError;
use crate::number::Rational;
use crate::poly::UniPoly;
use crate::Expr;
use helpers::terms;

/// Simplify an expression.
///
/// # Example
/// ```
/// use symb_solve::{parse, simplify};
///
/// let e = parse("(x**2 - 1)/(x - 1) + sin(x)**2 + cos(x)**2").unwrap();
/// assert_eq!(simplify(&e).to_string(), "x + 2");
/// ```
pub fn simplify(expr: &Expr) -> Expr {
    match expr.kind() {
        ExprKind::Relation { .. } | ExprKind::Tuple(_) => expr.map_children(&mut |c| simplify(c)),
        _ => {
            let mut simplifier = engine::Simplifier::new();
            let ruled = simplifier.simplify(expr.clone());
            let mut best = ruled.clone();
            for candidate in [cancel(&ruled), expand(&ruled)] {
                let candidate = simplifier.simplify(candidate);
                if candidate.node_count() < best.node_count() {
                    best = candidate;
                }
            }
            best
        }
    }
}

/// Distribute products over sums and expand integer powers of sums.
/// Gives up and returns the input when the result would exceed the
/// default term limit.
pub fn expand(expr: &Expr) -> Expr {
    match expand_limited(expr, DEFAULT_MAX_TERMS) {
        Ok(e) => e,
        Err(err) => {
            tracing::warn!(%expr, error = %err, "expansion abandoned");
            expr.clone()
        }
    }
}

/// [`expand`] with an explicit term limit.
///
/// # Errors
/// `SolveError::BudgetExceeded` when an intermediate sum has more than
/// `max_terms` terms.
pub fn expand_limited(expr: &Expr, max_terms: usize) -> Result<Expr, SolveError> {
    match expr.kind() {
        ExprKind::Number(_) | ExprKind::Float(_) | ExprKind::Constant(_) | ExprKind::Symbol(_) => {
            Ok(expr.clone())
        }
        ExprKind::Sum(ts) => {
            let expanded = ts
                .iter()
                .map(|t| expand_limited(t, max_terms))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::sum(expanded))
        }
        ExprKind::Product(fs) => {
            let expanded = fs
                .iter()
                .map(|f| expand_limited(f, max_terms))
                .collect::<Result<Vec<_>, _>>()?;
            distribute(&expanded, max_terms)
        }
        ExprKind::Pow(base, exp) => {
            let base = expand_limited(base, max_terms)?;
            let exp = expand_limited(exp, max_terms)?;
            let n = exp.as_rational().and_then(Rational::to_i64);
            match (base.kind(), n) {
                (ExprKind::Sum(_), Some(n)) if n != 0 => {
                    let copies = vec![base.clone(); n.unsigned_abs() as usize];
                    let expanded = distribute(&copies, max_terms)?;
                    Ok(if n > 0 {
                        expanded
                    } else {
                        Expr::recip(expanded)
                    })
                }
                _ => Ok(Expr::pow(base, exp)),
            }
        }
        _ => {
            let children = expr
                .children()
                .iter()
                .map(|c| expand_limited(c, max_terms))
                .collect::<Result<Vec<_>, _>>()?;
            let mut next = children.into_iter();
            Ok(expr.map_children(&mut |c| next.next().unwrap_or_else(|| c.clone())))
        }
    }
}

fn distribute(factors: &[Expr], max_terms: usize) -> Result<Expr, SolveError> {
    let mut acc = vec![Expr::one()];
    for f in factors {
        let f_terms = terms(f);
        if acc.len().saturating_mul(f_terms.len()) > max_terms {
            return Err(SolveError::BudgetExceeded {
                resource: "expansion terms",
                limit: max_terms,
            });
        }
        // collect like terms after every factor
        let products = acc
            .iter()
            .flat_map(|a| f_terms.iter().map(move |b| Expr::product(vec![a.clone(), b.clone()])))
            .collect();
        acc = terms(&Expr::sum(products));
    }
    Ok(Expr::sum(acc))
}

/// Split into numerator and denominator over a common denominator.
pub fn numer_denom(expr: &Expr) -> (Expr, Expr) {
    match expr.kind() {
        ExprKind::Number(r) => (
            Expr::rational(Rational::from_ibig(r.numer().clone())),
            Expr::rational(Rational::from_ibig(IBig::from(r.denom().clone()))),
        ),
        ExprKind::Pow(base, exp) if exp.has_negative_coefficient() => {
            (Expr::one(), Expr::pow(base.clone(), Expr::negate(exp.clone())))
        }
        ExprKind::Product(fs) => {
            let (nums, dens): (Vec<Expr>, Vec<Expr>) = fs.iter().map(numer_denom).unzip();
            (Expr::product(nums), Expr::product(dens))
        }
        ExprKind::Sum(ts) => ts.iter().map(numer_denom).fold(
            (Expr::zero(), Expr::one()),
            |(n1, d1), (n2, d2)| {
                if d1 == d2 {
                    (Expr::sum(vec![n1, n2]), d1)
                } else {
                    (
                        Expr::sum(vec![
                            Expr::product(vec![n1, d2.clone()]),
                            Expr::product(vec![n2, d1.clone()]),
                        ]),
                        Expr::product(vec![d1, d2]),
                    )
                }
            },
        ),
        _ => (expr.clone(), Expr::one()),
    }
}

/// Put a rational function in lowest terms: expanded numerator over
/// expanded denominator, with the polynomial gcd divided out when the
/// expression has a single variable and rational coefficients.
pub fn cancel(expr: &Expr) -> Expr {
    let (n, d) = numer_denom(expr);
    let (n, d) = (expand(&n), expand(&d));
    if d.is_one() {
        return n;
    }
    let vars = Expr::sum(vec![n.clone(), d.clone()]).free_symbols();
    if vars.len() == 1
        && let Some(var) = vars.first()
        && let (Some(pn), Some(pd)) = (UniPoly::from_expr(&n, var), UniPoly::from_expr(&d, var))
    {
        let g = pn.gcd(&pd);
        if let (Some((qn, _)), Some((qd, _))) = (pn.divrem(&g), pd.divrem(&g)) {
            let norm = qd.leading().checked_recip().unwrap_or_else(|| Rational::from_i64(1));
            let (qn, qd) = (qn.scale(&norm), qd.scale(&norm));
            return Expr::div_expr(qn.to_expr(var), qd.to_expr(var));
        }
    }
    Expr::div_expr(n, d)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    fn p(s: &str) -> Expr {
        parse(s).unwrap()
    }

    #[test]
    fn test_expand_products_and_powers() {
        assert_eq!(expand(&p("(x + 1)*(x - 1)")), p("x**2 - 1"));
        assert_eq!(expand(&p("(x + y)**2")), p("x**2 + 2*x*y + y**2"));
        assert_eq!(expand(&p("sin((x + 1)**2)")), p("sin(x**2 + 2*x + 1)"));
        assert_eq!(expand(&p("1/(x + 1)**2")), p("1/(x**2 + 2*x + 1)"));
    }

    #[test]
    fn test_expand_term_limit() {
        let e = p("(a + b + c + d)**6");
        assert!(matches!(
            expand_limited(&e, 100),
            Err(SolveError::BudgetExceeded { .. })
        ));
        let big = expand(&p("(x+1)**40"));
        assert!(matches!(big.kind(), ExprKind::Sum(ts) if ts.len() == 41));
        assert_eq!(UniPoly::from_expr(&big, &sym("x")).unwrap().degree(), 40);
    }

    #[test]
    fn test_numer_denom_of_sum() {
        let (n, d) = numer_denom(&p("1/x + 1/y"));
        assert_eq!(expand(&n), p("x + y"));
        assert_eq!(d, p("x*y"));
        let (n, d) = numer_denom(&p("3/4*x"));
        assert_eq!((n, d), (p("3*x"), Expr::integer(4)));
    }

    #[test]
    fn test_cancel_common_factor() {
        assert_eq!(cancel(&p("(x**2 - 1)/(x + 1)")), p("x - 1"));
        assert_eq!(cancel(&p("(2*x + 2)/(4*x**2 - 4)")), p("1/2/(x - 1)"));
        let x = sym("x");
        assert_eq!(cancel(&p("x/x**2 + 1")), (x.to_expr() + 1) / x);
    }

    #[test]
    fn test_simplify_picks_smallest() {
        assert_eq!(simplify(&p("(x + 1)**2 - x**2")), p("2*x + 1"));
        assert_eq!(simplify(&p("sin(x)**2 + cos(x)**2 = y")), p("Eq(1, y)"));
        assert_eq!(simplify(&p("(x + 1)**2")), p("(x + 1)**2"));
    }
}
