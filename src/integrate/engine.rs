//! Antiderivative search
//!
//! Tried in order: constants, linearity over sums and constant factors,
//! power rule, table entries of linear arguments, rational functions,
//! expansion, derivative-divides substitution and tabular integration by
//! parts.

use super::Technique;
use super::rational::integrate_rational;
use crate::ast::{Constant, ExprKind};
use crate::error::SolveError;
use crate::poly::{coefficients, degree_in};
use crate::simplification::{cancel, expand_limited, simplify};
use crate::solve::Budget;
use crate::{Expr, Symbol};

/// Nesting depth for substitution and by-parts recursion.
const MAX_RECURSION: usize = 8;

pub(super) fn antiderivative(
    f: &Expr,
    x: &Symbol,
    budget: &mut Budget,
) -> Result<(Expr, Technique), SolveError> {
    search(f, x, budget, 0)
}

fn not_integrable(f: &Expr) -> SolveError {
    SolveError::NotIntegrable(f.to_string())
}

/// `d(u)/dx` when it is a nonzero constant, i.e. `u` is linear in `x`.
pub(super) fn linear_slope(u: &Expr, x: &Symbol) -> Option<Expr> {
    let d = simplify(&u.diff(x));
    (!d.is_zero() && d.is_free_of(x)).then_some(d)
}

fn search(
    f: &Expr,
    x: &Symbol,
    budget: &mut Budget,
    depth: usize,
) -> Result<(Expr, Technique), SolveError> {
    budget.tick()?;
    budget.check_size(f)?;
    if depth > MAX_RECURSION {
        return Err(not_integrable(f));
    }
    if f.is_free_of(x) {
        return Ok((Expr::product(vec![f.clone(), x.to_expr()]), Technique::Constant));
    }

    match f.kind() {
        ExprKind::Sum(terms) => {
            let mut parts = Vec::with_capacity(terms.len());
            let mut techniques = Vec::with_capacity(terms.len());
            for t in terms {
                let (r, tech) = search(t, x, budget, depth)?;
                parts.push(r);
                techniques.push(tech);
            }
            techniques.retain(|t| *t != Technique::Constant);
            let technique = match techniques.as_slice() {
                [] => Technique::Constant,
                [first, rest @ ..] if rest.iter().all(|t| t == first) => *first,
                _ => Technique::Linearity,
            };
            return Ok((Expr::sum(parts), technique));
        }
        ExprKind::Product(fs) => {
            let (dep, indep): (Vec<Expr>, Vec<Expr>) =
                fs.iter().cloned().partition(|g| !g.is_free_of(x));
            if !indep.is_empty() {
                let (r, tech) = search(&Expr::product(dep), x, budget, depth)?;
                let mut out = indep;
                out.push(r);
                return Ok((Expr::product(out), tech));
            }
        }
        _ => {}
    }

    if let Some(found) = table(f, x) {
        return Ok(found);
    }

    match integrate_rational(f, x) {
        Ok(Some(r)) => return Ok((r, Technique::PartialFractions)),
        Ok(None) => {}
        Err(e) => tracing::debug!(error = %e, "rational integration declined"),
    }

    let expanded = expand_limited(f, budget.max_terms())?;
    if expanded != *f && matches!(expanded.kind(), ExprKind::Sum(_)) {
        let (r, tech) = search(&expanded, x, budget, depth + 1)?;
        let technique = if matches!(tech, Technique::PowerRule | Technique::Constant) {
            Technique::PowerRule
        } else {
            Technique::Expansion
        };
        return Ok((r, technique));
    }

    if let Some(r) = derivative_divides(f, x, budget, depth)? {
        return Ok((r, Technique::DerivativeDivides));
    }

    if let Some(r) = by_parts(f, x, budget, depth)? {
        return Ok((r, Technique::ByParts));
    }

    Err(not_integrable(f))
}

/// Power rule and table entries, directly or through a linear argument.
fn table(f: &Expr, x: &Symbol) -> Option<(Expr, Technique)> {
    let tag = |u: &Expr| {
        if u.as_symbol() == Some(x) {
            Technique::Table
        } else {
            Technique::LinearSubstitution
        }
    };
    match f.kind() {
        ExprKind::Symbol(_) => Some((
            Expr::product(vec![Expr::half(), x.pow(2)]),
            Technique::PowerRule,
        )),
        ExprKind::Pow(base, exp) if exp.is_free_of(x) => {
            let a = linear_slope(base, x)?;
            let technique = if base.as_symbol() == Some(x) {
                Technique::PowerRule
            } else {
                Technique::LinearSubstitution
            };
            let r = if exp.as_rational().and_then(|r| r.to_i64()) == Some(-1) {
                Expr::func1("log", base.clone())
            } else {
                let e1 = Expr::sum(vec![exp.clone(), Expr::one()]);
                Expr::div_expr(Expr::pow(base.clone(), e1.clone()), e1)
            };
            Some((Expr::div_expr(r, a), technique))
        }
        ExprKind::Pow(base, exp) if base.is_free_of(x) => {
            // b**(a*x + c) = b**(a*x + c) / (a*log(b))
            let a = linear_slope(exp, x)?;
            let scale = if base.is_constant(Constant::E) {
                a
            } else {
                Expr::product(vec![a, Expr::func1("log", base.clone())])
            };
            Some((Expr::div_expr(f.clone(), scale), tag(exp)))
        }
        ExprKind::Function { name, args } if args.len() == 1 => {
            let u = &args[0];
            let a = linear_slope(u, x)?;
            let u = u.clone();
            let r = match name.name() {
                "sin" => Expr::negate(Expr::func1("cos", u)),
                "cos" => Expr::func1("sin", u),
                "tan" => Expr::negate(Expr::func1("log", Expr::func1("cos", u))),
                "sinh" => Expr::func1("cosh", u),
                "cosh" => Expr::func1("sinh", u),
                "tanh" => Expr::func1("log", Expr::func1("cosh", u)),
                "log" => Expr::sub_expr(
                    Expr::product(vec![u.clone(), Expr::func1("log", u.clone())]),
                    u,
                ),
                "atan" => Expr::sub_expr(
                    Expr::product(vec![u.clone(), Expr::func1("atan", u.clone())]),
                    Expr::product(vec![
                        Expr::half(),
                        Expr::func1("log", Expr::sum(vec![Expr::pow(u, Expr::integer(2)), Expr::one()])),
                    ]),
                ),
                _ => return None,
            };
            Some((Expr::div_expr(r, a), tag(&args[0])))
        }
        _ => None,
    }
}

/// Inner expressions `u` for which `f = g(u) * u'` might hold.
fn substitution_candidates(f: &Expr, x: &Symbol, out: &mut Vec<Expr>) {
    match f.kind() {
        ExprKind::Function { args, .. } => {
            for a in args.iter().filter(|a| !a.is_free_of(x)) {
                if linear_slope(a, x).is_none() && !out.contains(a) {
                    out.push(a.clone());
                }
            }
        }
        ExprKind::Pow(b, e) => {
            for inner in [b, e] {
                if !inner.is_free_of(x)
                    && inner.as_symbol().is_none()
                    && linear_slope(inner, x).is_none()
                    && !out.contains(inner)
                {
                    out.push(inner.clone());
                }
            }
        }
        _ => {}
    }
    for c in f.children() {
        substitution_candidates(&c, x, out);
    }
}

fn derivative_divides(
    f: &Expr,
    x: &Symbol,
    budget: &mut Budget,
    depth: usize,
) -> Result<Option<Expr>, SolveError> {
    let mut candidates = Vec::new();
    substitution_candidates(f, x, &mut candidates);
    let t = Symbol::new("_u");
    for u in candidates {
        budget.tick()?;
        let du = simplify(&u.diff(x));
        if du.is_zero() {
            continue;
        }
        let quotient = simplify(&cancel(&Expr::div_expr(f.clone(), du)));
        let h = quotient.replace(&u, &t.to_expr());
        if !h.is_free_of(x) {
            continue;
        }
        match search(&h, &t, budget, depth + 1) {
            Ok((r, _)) => {
                tracing::trace!(substitution = %u, "derivative divides");
                return Ok(Some(r.subs(&t, &u)));
            }
            Err(e @ SolveError::BudgetExceeded { .. }) => return Err(e),
            Err(_) => {}
        }
    }
    Ok(None)
}

/// `P(x) * g(x)` with polynomial `P` and `g` in `E**(a*x+b)`, `sin`, `cos`
/// of a linear argument (tabular method), or `log` of a linear argument.
fn by_parts(
    f: &Expr,
    x: &Symbol,
    budget: &mut Budget,
    depth: usize,
) -> Result<Option<Expr>, SolveError> {
    let ExprKind::Product(fs) = f.kind() else {
        return Ok(None);
    };
    for (i, g) in fs.iter().enumerate() {
        let rest = Expr::product(
            fs.iter()
                .enumerate()
                .filter(|(k, _)| *k != i)
                .map(|(_, e)| e.clone())
                .collect(),
        );
        let Some(degree) = degree_in(&rest, x) else {
            continue;
        };
        if degree == 0 || coefficients(&rest, x).is_none() {
            continue;
        }

        if let Some(u) = crate::simplification::helpers::unary_arg(g, "log")
            && linear_slope(u, x).is_some()
        {
            // ∫ P log(u) = Q log(u) - ∫ Q u'/u, Q = ∫ P
            let (q, _) = search(&rest, x, budget, depth + 1)?;
            let remainder = Expr::div_expr(
                Expr::product(vec![q.clone(), u.diff(x)]),
                u.clone(),
            );
            let (r, _) = search(&remainder, x, budget, depth + 1)?;
            return Ok(Some(Expr::sub_expr(
                Expr::product(vec![q, g.clone()]),
                r,
            )));
        }

        if table(g, x).is_none() || !is_periodic_or_exp(g) {
            continue;
        }
        // Tabular: P*G1 - P'*G2 + P''*G3 - ...
        let mut terms = Vec::new();
        let mut p = rest.clone();
        let mut antideriv = g.clone();
        let mut sign = 1;
        for _ in 0..=degree {
            budget.tick()?;
            let Some(next) = scaled_table(&antideriv, x) else {
                return Ok(None);
            };
            antideriv = simplify(&next);
            terms.push(Expr::product(vec![Expr::integer(sign), p.clone(), antideriv.clone()]));
            p = simplify(&p.diff(x));
            sign = -sign;
            if p.is_zero() {
                break;
            }
        }
        return Ok(Some(Expr::sum(terms)));
    }
    Ok(None)
}

/// [`table`] of `c * g` for a numeric coefficient `c`.
fn scaled_table(f: &Expr, x: &Symbol) -> Option<Expr> {
    let (c, rest) = f.as_coeff_mul();
    table(&rest, x).map(|(r, _)| Expr::product(vec![Expr::numeric(c), r]))
}

fn is_periodic_or_exp(g: &Expr) -> bool {
    match g.kind() {
        ExprKind::Pow(b, _) => b.is_constant(Constant::E),
        ExprKind::Function { name, .. } => matches!(name.name(), "sin" | "cos"),
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    fn run(f: &str) -> (Expr, Technique) {
        let (r, t) = antiderivative(&parse(f).unwrap(), &sym("x"), &mut Budget::default()).unwrap();
        (simplify(&r), t)
    }

    fn check_derivative(f: &str) {
        let x = sym("x");
        let (r, _) = run(f);
        let back = simplify(&cancel(&Expr::sub_expr(r.diff(&x), parse(f).unwrap())));
        assert!(back.is_zero(), "d/dx of {} gave {}", r, back);
    }

    #[test]
    fn test_power_rule_and_constants() {
        assert_eq!(run("x**2"), (parse("x**3/3").unwrap(), Technique::PowerRule));
        assert_eq!(run("5").0, parse("5*x").unwrap());
        assert_eq!(run("1/x").0, parse("log(x)").unwrap());
        assert_eq!(run("3*x**2 + 2*x + 1").0, parse("x**3 + x**2 + x").unwrap());
    }

    #[test]
    fn test_linear_arguments() {
        assert_eq!(run("cos(2*x)"), (parse("sin(2*x)/2").unwrap(), Technique::LinearSubstitution));
        assert_eq!(run("exp(3*x)").0, parse("exp(3*x)/3").unwrap());
        assert_eq!(run("sin(x)"), (parse("-cos(x)").unwrap(), Technique::Table));
        check_derivative("(2*x + 1)**5");
        check_derivative("log(x)");
    }

    #[test]
    fn test_derivative_divides() {
        let (_, t) = run("2*x*cos(x**2)");
        assert_eq!(t, Technique::DerivativeDivides);
        check_derivative("2*x*cos(x**2)");
        check_derivative("x*exp(x**2)");
        check_derivative("cos(x)*sin(x)**3");
    }

    #[test]
    fn test_by_parts() {
        assert_eq!(run("x*exp(x)").1, Technique::ByParts);
        check_derivative("x*exp(x)");
        check_derivative("x**2*sin(x)");
        check_derivative("x*log(x)");
    }

    #[test]
    fn test_expansion() {
        check_derivative("x*(x + 1)**2");
    }
}
