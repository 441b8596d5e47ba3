//! Reduction of one-variable rational inequalities to sets of reals
//!
//! The real roots of numerator and denominator split the line into open
//! pieces; one sample per piece decides the sign there and the roots
//! themselves are decided by the operator's strictness.

use std::fmt;

use super::Budget;
use super::univariate::solve_for;
use crate::ast::RelOp;
use crate::error::SolveError;
use crate::eval::{eval_real, is_real_constant};
use crate::poly::degree_in;
use crate::simplification::{numer_denom, simplify};
use crate::traits::approx_eq;
use crate::{Expr, Symbol};

/// Connected piece of the real line. `None` bounds are infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub lo: Option<Expr>,
    pub hi: Option<Expr>,
    pub lo_closed: bool,
    pub hi_closed: bool,
}

impl Interval {
    fn is_point(&self) -> bool {
        self.lo.is_some() && self.lo == self.hi
    }

    fn conditions(&self, var: &str, latex: bool) -> Vec<String> {
        let render = |e: &Expr| if latex { e.to_latex() } else { e.to_string() };
        let (le, lt, inf) = if latex {
            ("\\leq", "<", "\\infty")
        } else {
            ("<=", "<", "oo")
        };
        if self.is_point()
            && let Some(p) = &self.lo
        {
            return vec![format!("{} = {}", var, render(p))];
        }
        let lo = match &self.lo {
            Some(e) => format!("{} {} {}", render(e), if self.lo_closed { le } else { lt }, var),
            None => format!("-{} < {}", inf, var),
        };
        let hi = match &self.hi {
            Some(e) => format!("{} {} {}", var, if self.hi_closed { le } else { lt }, render(e)),
            None => format!("{} < {}", var, inf),
        };
        vec![lo, hi]
    }
}

/// Finite union of disjoint intervals, in increasing order.
#[derive(Debug, Clone, PartialEq)]
pub struct RealSet {
    pub var: Symbol,
    pub intervals: Vec<Interval>,
}

impl RealSet {
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// The whole real line.
    pub fn is_all(&self) -> bool {
        matches!(self.intervals.as_slice(), [Interval { lo: None, hi: None, .. }])
    }

    fn render(&self, latex: bool) -> String {
        let (t, f, and, or) = if latex {
            ("\\text{True}", "\\text{False}", " \\wedge ", " \\vee ")
        } else {
            ("True", "False", " & ", " | ")
        };
        if self.is_empty() {
            return f.to_string();
        }
        if self.is_all() {
            return t.to_string();
        }
        let var = if latex {
            self.var.to_expr().to_latex()
        } else {
            self.var.to_string()
        };
        let parts: Vec<String> = self
            .intervals
            .iter()
            .map(|iv| iv.conditions(&var, latex).join(and))
            .collect();
        if parts.len() == 1 {
            return parts.into_iter().collect();
        }
        let wrap = |p: &String| {
            if latex {
                format!("\\left({}\\right)", p)
            } else {
                format!("({})", p)
            }
        };
        parts.iter().map(wrap).collect::<Vec<_>>().join(or)
    }

    pub fn to_latex(&self) -> String {
        self.render(true)
    }
}

impl fmt::Display for RealSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// A boundary point together with whether the expression is undefined there.
struct Critical {
    value: Expr,
    at: f64,
    pole: bool,
}

fn real_roots(e: &Expr, var: &Symbol, pole: bool, budget: &mut Budget) -> Result<Vec<Critical>, SolveError> {
    if e.is_free_of(var) {
        return Ok(Vec::new());
    }
    if degree_in(e, var).is_none() {
        return Err(SolveError::failure(format!(
            "Cannot reduce inequality: {} is not polynomial in {}",
            e, var
        )));
    }
    let mut out = Vec::new();
    for root in solve_for(e, var, budget)? {
        if !root.free_symbols().is_empty() {
            return Err(SolveError::failure(format!(
                "Cannot order symbolic root {}",
                root
            )));
        }
        if !is_real_constant(&root) {
            continue;
        }
        if let Some(at) = eval_real(&root, &[]) {
            out.push(Critical { value: root, at, pole });
        }
    }
    Ok(out)
}

/// Set of real `var` where `f op 0` holds, for `op` one of `<`, `<=`, `>`, `>=`.
///
/// # Example
/// ```
/// use symb_solve::RelOp;
/// use symb_solve::solve::{Budget, reduce_inequality};
/// use symb_solve::{parse, sym};
///
/// let set = reduce_inequality(&parse("x - 1").unwrap(), RelOp::Ge, &sym("x"), &mut Budget::default()).unwrap();
/// assert_eq!(set.to_string(), "1 <= x & x < oo");
/// ```
///
/// # Errors
/// `SolveFailure` when `f` is not a rational function of `var` with
/// numeric coefficients.
pub fn reduce_inequality(
    f: &Expr,
    op: RelOp,
    var: &Symbol,
    budget: &mut Budget,
) -> Result<RealSet, SolveError> {
    budget.tick()?;
    let holds = |v: f64| match op {
        RelOp::Lt => v < 0.0,
        RelOp::Le => v <= 0.0,
        RelOp::Gt => v > 0.0,
        RelOp::Ge => v >= 0.0,
        RelOp::Eq | RelOp::Ne => false,
    };
    if matches!(op, RelOp::Eq | RelOp::Ne) {
        return Err(SolveError::failure("Not an inequality"));
    }
    let strict = matches!(op, RelOp::Lt | RelOp::Gt);

    let f = simplify(f);
    let vars = f.free_symbols();
    if vars.iter().any(|v| v != var) {
        return Err(SolveError::failure(format!(
            "Cannot reduce inequality with parameters: {}",
            f
        )));
    }
    let (num, den) = numer_denom(&f);

    let mut critical = real_roots(&num, var, false, budget)?;
    critical.extend(real_roots(&den, var, true, budget)?);
    critical.sort_by(|a, b| a.at.total_cmp(&b.at));
    // Merge coincident points; a pole wins over a zero
    let mut points: Vec<Critical> = Vec::new();
    for c in critical {
        match points.last_mut() {
            Some(last) if approx_eq(last.at, c.at) => last.pole |= c.pole,
            _ => points.push(c),
        }
    }

    let sample = |x: f64| -> Result<bool, SolveError> {
        let v = eval_real(&f, &[(var.clone(), x)]).ok_or_else(|| {
            SolveError::failure(format!("Cannot evaluate {} at {} = {}", f, var, x))
        })?;
        Ok(holds(v))
    };

    // pieces: open interval, point, open interval, ..., open interval
    let mut open_ok = Vec::with_capacity(points.len() + 1);
    if points.is_empty() {
        open_ok.push(sample(0.0)?);
    } else {
        open_ok.push(sample(points[0].at - 1.0)?);
        for w in points.windows(2) {
            open_ok.push(sample((w[0].at + w[1].at) / 2.0)?);
        }
        open_ok.push(sample(points[points.len() - 1].at + 1.0)?);
    }
    let point_ok: Vec<bool> = points.iter().map(|p| !p.pole && !strict).collect();

    let mut intervals: Vec<Interval> = Vec::new();
    let mut current: Option<Interval> = None;
    for (k, &ok) in open_ok.iter().enumerate() {
        let lo = if k == 0 { None } else { Some(&points[k - 1]) };
        let hi = points.get(k);
        if ok {
            let iv = current.get_or_insert_with(|| Interval {
                lo: lo.map(|p| p.value.clone()),
                hi: None,
                lo_closed: false,
                hi_closed: false,
            });
            iv.hi = hi.map(|p| p.value.clone());
            iv.hi_closed = false;
        }
        let Some(point) = hi else { continue };
        if point_ok[k] {
            match current.as_mut() {
                Some(iv) => {
                    iv.hi = Some(point.value.clone());
                    iv.hi_closed = true;
                }
                None => {
                    current = Some(Interval {
                        lo: Some(point.value.clone()),
                        hi: Some(point.value.clone()),
                        lo_closed: true,
                        hi_closed: true,
                    });
                }
            }
            // Continue only if the next open piece also holds
            if !open_ok[k + 1]
                && let Some(iv) = current.take()
            {
                intervals.push(iv);
            }
        } else if let Some(iv) = current.take() {
            intervals.push(iv);
        }
    }
    if let Some(iv) = current.take() {
        intervals.push(iv);
    }

    Ok(RealSet {
        var: var.clone(),
        intervals,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    fn reduce(f: &str, op: RelOp) -> RealSet {
        reduce_inequality(&parse(f).unwrap(), op, &sym("x"), &mut Budget::default()).unwrap()
    }

    #[test]
    fn test_half_lines() {
        assert_eq!(reduce("6*x", RelOp::Ge).to_latex(), "0 \\leq x \\wedge x < \\infty");
        assert_eq!(reduce("6*x", RelOp::Le).to_string(), "-oo < x & x <= 0");
    }

    #[test]
    fn test_constant_truth() {
        assert!(reduce("2", RelOp::Ge).is_all());
        assert_eq!(reduce("2", RelOp::Ge).to_latex(), "\\text{True}");
        assert!(reduce("-1", RelOp::Ge).is_empty());
        assert_eq!(reduce("x**2 + 1", RelOp::Le).to_latex(), "\\text{False}");
    }

    #[test]
    fn test_union_of_intervals() {
        let set = reduce("x**2 - 1", RelOp::Ge);
        assert_eq!(set.to_string(), "(-oo < x & x <= -1) | (1 <= x & x < oo)");
    }

    #[test]
    fn test_isolated_point() {
        let set = reduce("-x**2", RelOp::Ge);
        assert_eq!(set.to_string(), "x = 0");
        assert_eq!(reduce("x**2", RelOp::Ge).to_latex(), "\\text{True}");
    }

    #[test]
    fn test_poles_are_excluded() {
        let set = reduce("1/x", RelOp::Gt);
        assert_eq!(set.to_string(), "0 < x & x < oo");
        let set = reduce("(x - 1)/(x + 1)", RelOp::Le);
        assert_eq!(set.to_string(), "-1 < x & x <= 1");
    }

    #[test]
    fn test_non_polynomial_fails() {
        let err = reduce_inequality(&parse("sin(x)").unwrap(), RelOp::Ge, &sym("x"), &mut Budget::default());
        assert!(err.is_err());
    }
}
