//! Nonlinear systems by recursive elimination
//!
//! One equation is solved for one variable, the roots are substituted into
//! the remaining equations and the search recurses. Each finished branch is
//! back-substituted into a tuple in variable order; variables no equation
//! determined stay as themselves.

use super::Budget;
use super::univariate::solve_for;
use crate::error::SolveError;
use crate::eval::eval_complex;
use crate::poly::degree_in;
use crate::simplification::simplify;
use crate::{Expr, Symbol};

const ZERO_TOLERANCE: f64 = 1e-8;

/// Solution tuples of `eqs = 0` in the order of `vars`.
///
/// # Example
/// ```
/// use symb_solve::solve::{Budget, solve_nonlinear_system};
/// use symb_solve::{parse, sym};
///
/// let eqs = [parse("x**2 - y").unwrap(), parse("x - y").unwrap()];
/// let sols = solve_nonlinear_system(&eqs, &[sym("x"), sym("y")], &mut Budget::default()).unwrap();
/// assert_eq!(sols.len(), 2);
/// ```
///
/// # Errors
/// `SolveFailure` when no remaining equation can be solved for any
/// remaining variable.
pub fn solve_nonlinear_system(
    eqs: &[Expr],
    vars: &[Symbol],
    budget: &mut Budget,
) -> Result<Vec<Vec<Expr>>, SolveError> {
    let eqs: Vec<Expr> = eqs.iter().map(simplify).collect();
    let mut branches = Vec::new();
    eliminate(eqs, vars.to_vec(), Vec::new(), budget, &mut branches)?;

    let mut solutions: Vec<Vec<Expr>> = Vec::new();
    for assignments in branches {
        let tuple = back_substitute(&assignments, vars);
        if !solutions.contains(&tuple) {
            solutions.push(tuple);
        }
    }
    budget.check_branches(solutions.len())?;
    solutions.sort_by(|a, b| compare_tuples(a, b));
    Ok(solutions)
}

fn is_zero_value(e: &Expr) -> bool {
    e.is_zero()
        || (e.free_symbols().is_empty()
            && eval_complex(e, &[]).is_some_and(|z| z.norm() <= ZERO_TOLERANCE))
}

fn eliminate(
    eqs: Vec<Expr>,
    unknowns: Vec<Symbol>,
    assignments: Vec<(Symbol, Expr)>,
    budget: &mut Budget,
    branches: &mut Vec<Vec<(Symbol, Expr)>>,
) -> Result<(), SolveError> {
    budget.tick()?;
    let mut remaining = Vec::new();
    for eq in eqs {
        if is_zero_value(&eq) {
            continue;
        }
        if unknowns.iter().all(|v| eq.is_free_of(v)) {
            if eq.free_symbols().is_empty() {
                // Nonzero constant: this branch has no solution
                return Ok(());
            }
            // Relation between parameters only; keep the branch
            continue;
        }
        remaining.push(eq);
    }
    if remaining.is_empty() {
        branches.push(assignments);
        budget.check_branches(branches.len())?;
        return Ok(());
    }

    // Prefer equations where a variable occurs with low degree
    let mut candidates: Vec<(u32, usize, usize)> = Vec::new();
    for (i, eq) in remaining.iter().enumerate() {
        for (j, v) in unknowns.iter().enumerate() {
            if eq.is_free_of(v) {
                continue;
            }
            let degree = degree_in(eq, v).unwrap_or(u32::MAX);
            candidates.push((degree, i, j));
        }
    }
    candidates.sort();

    let mut last_error = None;
    for (_, i, j) in candidates {
        let var = &unknowns[j];
        let roots = match solve_for(&remaining[i], var, budget) {
            Ok(roots) => roots,
            Err(e @ SolveError::BudgetExceeded { .. }) => return Err(e),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        };
        let others: Vec<Symbol> = unknowns.iter().filter(|v| *v != var).cloned().collect();
        for root in roots {
            let substituted: Vec<Expr> = remaining
                .iter()
                .enumerate()
                .filter(|(k, _)| *k != i)
                .map(|(_, eq)| simplify(&eq.subs(var, &root)))
                .collect();
            let mut next = assignments.clone();
            next.push((var.clone(), root));
            eliminate(substituted, others.clone(), next, budget, branches)?;
        }
        return Ok(());
    }
    Err(last_error.unwrap_or_else(|| SolveError::failure("Could not eliminate any variable")))
}

/// Resolve later assignments into earlier ones and lay the values out in
/// `vars` order.
fn back_substitute(assignments: &[(Symbol, Expr)], vars: &[Symbol]) -> Vec<Expr> {
    let mut resolved: Vec<(Symbol, Expr)> = Vec::new();
    for (var, value) in assignments.iter().rev() {
        let value = resolved
            .iter()
            .fold(value.clone(), |acc, (s, v)| acc.subs(s, v));
        resolved.push((var.clone(), simplify(&value)));
    }
    vars.iter()
        .map(|v| {
            resolved
                .iter()
                .find(|(s, _)| s == v)
                .map_or_else(|| v.to_expr(), |(_, e)| e.clone())
        })
        .collect()
}

fn compare_tuples(a: &[Expr], b: &[Expr]) -> std::cmp::Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (eval_complex(x, &[]), eval_complex(y, &[])) {
            (Some(p), Some(q)) => p.re.total_cmp(&q.re).then(p.im.total_cmp(&q.im)),
            _ => std::cmp::Ordering::Equal,
        };
        if ord.is_ne() {
            return ord;
        }
    }
    std::cmp::Ordering::Equal
}
