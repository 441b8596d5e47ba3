//! Solving `f = 0` for a single variable
//!
//! Strategy order: clear denominators, split factored numerators, solve
//! polynomials exactly (rational roots, then linear/quadratic/biquadratic
//! formulas, then numerically refined roots), invert a single occurrence of
//! the variable, and finally substitute a repeated kernel such as `sin(x)`
//! or `E**x` and solve the resulting polynomial.

use num_complex::Complex64;
use num_traits::Zero;

use super::Budget;
use crate::ast::{Constant, ExprKind};
use crate::error::SolveError;
use crate::eval::eval_complex;
use crate::number::Rational;
use crate::poly::{UniPoly, coefficients};
use crate::simplification::{expand_limited, numer_denom, simplify};
use crate::{Expr, Symbol};

/// Residual above which an inverted candidate is discarded.
const CHECK_TOLERANCE: f64 = 1e-8;

/// Roots of `f = 0` in `var`, deduplicated and ordered by value where
/// they evaluate. Other free symbols are treated as parameters.
///
/// # Example
/// ```
/// use symb_solve::solve::{Budget, solve_for};
/// use symb_solve::{parse, sym};
///
/// let roots = solve_for(&parse("x**2 - 4").unwrap(), &sym("x"), &mut Budget::default()).unwrap();
/// assert_eq!(roots, vec![parse("-2").unwrap(), parse("2").unwrap()]);
/// ```
///
/// # Errors
/// `SolveFailure` when no strategy applies, `BudgetExceeded` when the
/// search outgrows the request limits.
pub fn solve_for(f: &Expr, var: &Symbol, budget: &mut Budget) -> Result<Vec<Expr>, SolveError> {
    budget.tick()?;
    budget.check_size(f)?;
    if f.is_free_of(var) {
        return Ok(Vec::new());
    }

    let (num, den) = numer_denom(f);
    let candidates = solve_numerator(&num, var, budget)?;

    let mut roots: Vec<Expr> = Vec::new();
    for candidate in candidates {
        let candidate = simplify(&candidate);
        if !den.is_free_of(var) && vanishes(&den, var, &candidate) {
            tracing::debug!(root = %candidate, "discarding root of the denominator");
            continue;
        }
        if !roots.contains(&candidate) {
            roots.push(candidate);
        }
    }
    budget.check_branches(roots.len())?;
    sort_roots(&mut roots);
    Ok(roots)
}

/// Whether `e` is zero or undefined at `var = value`.
fn vanishes(e: &Expr, var: &Symbol, value: &Expr) -> bool {
    let at = simplify(&e.subs(var, value));
    if at.is_zero() || at.is_constant(Constant::ComplexInfinity) {
        return true;
    }
    eval_complex(&at, &[]).is_some_and(|z| z.norm() <= CHECK_TOLERANCE)
}

/// Order by (real, imaginary) value; expressions that do not evaluate go last.
fn sort_roots(roots: &mut [Expr]) {
    roots.sort_by(|a, b| {
        match (eval_complex(a, &[]), eval_complex(b, &[])) {
            (Some(x), Some(y)) => x.re.total_cmp(&y.re).then(x.im.total_cmp(&y.im)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

fn solve_numerator(g: &Expr, var: &Symbol, budget: &mut Budget) -> Result<Vec<Expr>, SolveError> {
    budget.tick()?;
    match g.kind() {
        ExprKind::Product(fs) => {
            let mut out = Vec::new();
            for f in fs.iter().filter(|f| !f.is_free_of(var)) {
                out.extend(solve_numerator(f, var, budget)?);
            }
            return Ok(out);
        }
        ExprKind::Pow(b, e)
            if e.is_free_of(var) && e.as_rational().is_some_and(Rational::is_positive) =>
        {
            return solve_numerator(b, var, budget);
        }
        _ => {}
    }

    let expanded = expand_limited(g, budget.max_terms())?;
    if let Some(coeffs) = coefficients(&expanded, var) {
        return solve_polynomial(coeffs, var, budget);
    }

    match invert(g, Expr::zero(), var, budget) {
        Ok(candidates) => return Ok(verified(g, var, candidates)),
        Err(e @ SolveError::BudgetExceeded { .. }) => return Err(e),
        Err(e) => tracing::debug!(expr = %g, error = %e, "inversion failed, trying kernels"),
    }

    if let Some(candidates) = solve_by_kernel(g, var, budget)? {
        return Ok(verified(g, var, candidates));
    }

    Err(SolveError::failure(format!(
        "Could not solve {} = 0 for {}",
        g, var
    )))
}

/// Drop candidates that evaluate to a clearly nonzero residual.
fn verified(g: &Expr, var: &Symbol, candidates: Vec<Expr>) -> Vec<Expr> {
    candidates
        .into_iter()
        .filter(|c| {
            let residual = g.subs(var, c);
            match eval_complex(&residual, &[]) {
                Some(z) => z.norm() <= CHECK_TOLERANCE * (1.0 + c_norm(c)),
                None => true,
            }
        })
        .collect()
}

fn c_norm(c: &Expr) -> f64 {
    eval_complex(c, &[]).map_or(0.0, |z| z.norm())
}

fn solve_polynomial(
    coeffs: Vec<Expr>,
    var: &Symbol,
    budget: &mut Budget,
) -> Result<Vec<Expr>, SolveError> {
    let mut coeffs: Vec<Expr> = coeffs.iter().map(simplify).collect();
    while coeffs.last().is_some_and(Expr::is_zero) {
        coeffs.pop();
    }
    if let Some(rationals) = coeffs
        .iter()
        .map(|c| c.as_rational().cloned())
        .collect::<Option<Vec<_>>>()
    {
        return rational_poly_roots(&UniPoly::new(rationals), budget);
    }
    match coeffs.as_slice() {
        [] | [_] => Ok(Vec::new()),
        [c0, c1] => Ok(vec![Expr::negate(Expr::div_expr(c0.clone(), c1.clone()))]),
        [c0, c1, c2] => Ok(quadratic(c2, c1, c0)),
        _ => Err(SolveError::failure(format!(
            "Polynomial in {} of degree {} has symbolic coefficients",
            var,
            coeffs.len() - 1
        ))),
    }
}

/// Roots of `a*x**2 + b*x + c`.
fn quadratic(a: &Expr, b: &Expr, c: &Expr) -> Vec<Expr> {
    let disc = simplify(&Expr::sub_expr(
        Expr::pow(b.clone(), Expr::integer(2)),
        Expr::product(vec![Expr::integer(4), a.clone(), c.clone()]),
    ));
    let two_a = Expr::product(vec![Expr::integer(2), a.clone()]);
    let minus_b = Expr::negate(b.clone());
    if disc.is_zero() {
        return vec![Expr::div_expr(minus_b, two_a)];
    }
    let root = Expr::sqrt(disc);
    vec![
        Expr::div_expr(Expr::sub_expr(minus_b.clone(), root.clone()), two_a.clone()),
        Expr::div_expr(Expr::sum(vec![minus_b, root]), two_a),
    ]
}

fn rational_poly_roots(p: &UniPoly, budget: &mut Budget) -> Result<Vec<Expr>, SolveError> {
    if let Some(roots) = binomial_roots(p, budget)? {
        return Ok(roots);
    }
    let (rationals, rest) = p.extract_rational_roots();
    let mut out: Vec<Expr> = rationals.into_iter().map(Expr::rational).collect();
    let c: Vec<Expr> = rest.coeffs().iter().cloned().map(Expr::rational).collect();
    match c.as_slice() {
        [] | [_] => {}
        [c0, c1] => out.push(Expr::negate(Expr::div_expr(c0.clone(), c1.clone()))),
        [c0, c1, c2] => out.extend(quadratic(c2, c1, c0)),
        [c0, c1, c2, c3, c4] if c1.is_zero() && c3.is_zero() => {
            for y in quadratic(c4, c2, c0) {
                let r = Expr::sqrt(y);
                out.push(Expr::negate(r.clone()));
                out.push(r);
            }
        }
        _ => {
            tracing::debug!(degree = rest.degree(), "falling back to numeric roots");
            out.extend(rest.numeric_roots()?.into_iter().map(complex_to_expr));
        }
    }
    Ok(out)
}

/// Exact roots of `c*x**k*(x**n - a)` with `n >= 3`: zero when `k > 0`,
/// then `|a|**(1/n)` times each n-th root of `sign(a)`. `None` when `p`
/// has more than two terms.
fn binomial_roots(p: &UniPoly, budget: &mut Budget) -> Result<Option<Vec<Expr>>, SolveError> {
    let c = p.coeffs();
    let Some(low) = c.iter().position(|r| !r.is_zero()) else {
        return Ok(None);
    };
    let n = p.degree() - low;
    if n < 3 || c[low + 1..p.degree()].iter().any(|r| !r.is_zero()) {
        return Ok(None);
    }
    budget.check_branches(n + 1)?;
    let Some(a) = c[low].checked_div(&c[p.degree()]).map(|q| -q) else {
        return Ok(None);
    };
    let Ok(n_i64) = i64::try_from(n) else {
        return Ok(None);
    };
    let radius = Expr::pow(Expr::rational(a.abs()), Expr::frac(1, n_i64));
    let offset = i64::from(a.is_negative());

    let mut out = Vec::with_capacity(n + 1);
    if low > 0 {
        out.push(Expr::zero());
    }
    for k in 0..n_i64 {
        let Some(turn) = Rational::frac(2 * k + offset, n_i64) else {
            return Ok(None);
        };
        let unit = match turn.to_i128_parts() {
            Some((0, _)) => Expr::one(),
            Some((1, 1)) => Expr::neg_one(),
            Some((1, 2)) => Expr::imaginary_unit(),
            Some((3, 2)) => Expr::negate(Expr::imaginary_unit()),
            _ => {
                let angle = Expr::product(vec![Expr::rational(turn), Expr::pi()]);
                Expr::sum(vec![
                    Expr::func1("cos", angle.clone()),
                    Expr::product(vec![Expr::func1("sin", angle), Expr::imaginary_unit()]),
                ])
            }
        };
        out.push(Expr::product(vec![radius.clone(), unit]));
    }
    tracing::debug!(degree = n, "solved binomial exactly");
    Ok(Some(out))
}

fn complex_to_expr(z: Complex64) -> Expr {
    if z.im.is_zero() {
        return Expr::float(z.re);
    }
    let imag = Expr::product(vec![Expr::float(z.im), Expr::imaginary_unit()]);
    if z.re.is_zero() {
        imag
    } else {
        Expr::sum(vec![Expr::float(z.re), imag])
    }
}

/// Solve `lhs = rhs` where `var` occurs once along the path to it.
fn invert(lhs: &Expr, rhs: Expr, var: &Symbol, budget: &mut Budget) -> Result<Vec<Expr>, SolveError> {
    budget.tick()?;
    if lhs.as_symbol() == Some(var) {
        return Ok(vec![rhs]);
    }
    let not_invertible = || SolveError::failure(format!("Cannot isolate {} in {}", var, lhs));
    match lhs.kind() {
        ExprKind::Sum(ts) => {
            let (dep, indep): (Vec<Expr>, Vec<Expr>) =
                ts.iter().cloned().partition(|t| !t.is_free_of(var));
            let [single] = dep.as_slice() else {
                return Err(not_invertible());
            };
            invert(single, Expr::sub_expr(rhs, Expr::sum(indep)), var, budget)
        }
        ExprKind::Product(fs) => {
            let (dep, indep): (Vec<Expr>, Vec<Expr>) =
                fs.iter().cloned().partition(|f| !f.is_free_of(var));
            let [single] = dep.as_slice() else {
                return Err(not_invertible());
            };
            invert(single, Expr::div_expr(rhs, Expr::product(indep)), var, budget)
        }
        ExprKind::Pow(b, e) if e.is_free_of(var) => {
            let mut out = Vec::new();
            for target in invert_power(e, &rhs, budget)? {
                out.extend(invert(b, target, var, budget)?);
            }
            Ok(out)
        }
        ExprKind::Pow(b, e) if b.is_free_of(var) => {
            if rhs.is_zero() {
                return Ok(Vec::new());
            }
            let log_rhs = Expr::func1("log", rhs);
            let target = if b.is_constant(Constant::E) {
                log_rhs
            } else {
                Expr::div_expr(log_rhs, Expr::func1("log", b.clone()))
            };
            invert(e, target, var, budget)
        }
        ExprKind::Function { name, args } if args.len() == 1 => {
            let targets = match name.name() {
                "log" => vec![Expr::exp(rhs)],
                "sin" => {
                    let a = Expr::func1("asin", rhs);
                    branch_pair(a.clone(), Expr::sub_expr(Expr::pi(), a))
                }
                "cos" => {
                    let a = Expr::func1("acos", rhs);
                    branch_pair(a.clone(), Expr::sub_expr(two_pi(), a))
                }
                "tan" => vec![Expr::func1("atan", rhs)],
                "asin" => vec![Expr::func1("sin", rhs)],
                "acos" => vec![Expr::func1("cos", rhs)],
                "atan" => vec![Expr::func1("tan", rhs)],
                _ => return Err(not_invertible()),
            };
            let mut out = Vec::new();
            for target in targets {
                out.extend(invert(&args[0], target, var, budget)?);
            }
            Ok(out)
        }
        _ => Err(not_invertible()),
    }
}

fn two_pi() -> Expr {
    Expr::product(vec![Expr::integer(2), Expr::pi()])
}

/// The principal value and its partner branch, or the principal value
/// alone when the two differ by a whole number of turns.
fn branch_pair(principal: Expr, partner: Expr) -> Vec<Expr> {
    let turns = simplify(&Expr::div_expr(
        Expr::sub_expr(partner.clone(), principal.clone()),
        two_pi(),
    ));
    if turns.as_rational().is_some_and(Rational::is_integer) {
        vec![principal]
    } else {
        vec![principal, partner]
    }
}

/// Values of `b` with `b**e = rhs`.
fn invert_power(e: &Expr, rhs: &Expr, budget: &mut Budget) -> Result<Vec<Expr>, SolveError> {
    let Some(n) = e.as_rational().and_then(Rational::to_i64) else {
        // Principal branch for fractional and symbolic exponents
        return Ok(vec![Expr::pow(rhs.clone(), Expr::recip(e.clone()))]);
    };
    if n < 0 {
        if rhs.is_zero() {
            return Ok(Vec::new());
        }
        return invert_power(&Expr::integer(-n), &Expr::recip(rhs.clone()), budget);
    }
    match n {
        1 => Ok(vec![rhs.clone()]),
        2 => {
            let r = Expr::sqrt(rhs.clone());
            Ok(vec![Expr::negate(r.clone()), r])
        }
        _ => match (rhs.as_rational(), usize::try_from(n)) {
            (Some(value), Ok(degree)) => {
                budget.check_branches(degree)?;
                let mut coeffs = vec![Rational::zero(); degree + 1];
                coeffs[0] = -value;
                coeffs[degree] = Rational::from_i64(1);
                rational_poly_roots(&UniPoly::new(coeffs), budget)
            }
            _ => Ok(vec![Expr::pow(rhs.clone(), Expr::frac(1, n))]),
        },
    }
}

/// Subexpressions that could stand for a fresh unknown.
fn kernels(g: &Expr, var: &Symbol, out: &mut Vec<Expr>) {
    if g.is_free_of(var) {
        return;
    }
    let is_kernel = match g.kind() {
        ExprKind::Function { .. } => true,
        ExprKind::Pow(b, e) => {
            b.is_free_of(var) || e.as_rational().is_some_and(|r| !r.is_integer())
        }
        _ => false,
    };
    if is_kernel {
        // E**(n*u) is reached through E**u
        let k = match g.kind() {
            ExprKind::Pow(b, e) if b.is_free_of(var) => {
                let (_, rest) = e.as_coeff_mul();
                Expr::pow(b.clone(), rest)
            }
            _ => g.clone(),
        };
        if !out.contains(&k) {
            out.push(k);
        }
    }
    for c in g.children() {
        kernels(&c, var, out);
    }
}

/// Replace `kernel` by `t`, including integer powers `b**(n*u)` of a
/// `b**u` kernel.
fn substitute_kernel(e: &Expr, kernel: &Expr, t: &Expr) -> Expr {
    if e == kernel {
        return t.clone();
    }
    if let (ExprKind::Pow(kb, ku), ExprKind::Pow(b, a)) = (kernel.kind(), e.kind())
        && b == kb
        && let Some(n) = simplify(&Expr::div_expr(a.clone(), ku.clone())).as_rational()
        && n.is_integer()
    {
        return Expr::pow(t.clone(), Expr::rational(n.clone()));
    }
    e.map_children(&mut |c| substitute_kernel(c, kernel, t))
}

fn solve_by_kernel(
    g: &Expr,
    var: &Symbol,
    budget: &mut Budget,
) -> Result<Option<Vec<Expr>>, SolveError> {
    let mut found = Vec::new();
    kernels(g, var, &mut found);
    let t = Symbol::new("_kernel");
    for k in found {
        let h = substitute_kernel(g, &k, &t.to_expr());
        if !h.is_free_of(var) {
            continue;
        }
        let values = match solve_for(&h, &t, budget) {
            Ok(values) => values,
            Err(e @ SolveError::BudgetExceeded { .. }) => return Err(e),
            Err(_) => continue,
        };
        tracing::debug!(kernel = %k, count = values.len(), "solved through kernel");
        let mut out = Vec::new();
        for v in values {
            match invert(&k, v, var, budget) {
                Ok(xs) => out.extend(xs),
                Err(e @ SolveError::BudgetExceeded { .. }) => return Err(e),
                Err(_) => {}
            }
        }
        return Ok(Some(out));
    }
    Ok(None)
}
