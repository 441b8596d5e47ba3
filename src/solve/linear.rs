//! Linear systems by Gauss-Jordan elimination over symbolic coefficients

use super::Budget;
use crate::error::SolveError;
use crate::simplification::{expand_limited, simplify};
use crate::{Expr, Symbol};

/// Outcome of eliminating a linear system.
#[derive(Debug, Clone, PartialEq)]
pub enum LinearSolution {
    /// Pivot variables in terms of the free ones, in variable order.
    /// Free variables do not appear.
    Solved(Vec<(Symbol, Expr)>),
    Inconsistent,
}

/// Solve `eqs = 0` (each expression implicitly equal to zero) for `vars`.
///
/// # Example
/// ```
/// use symb_solve::solve::{Budget, LinearSolution, solve_linear_system};
/// use symb_solve::{Expr, parse, sym};
///
/// let eqs = [parse("2*x + 3*y - 5").unwrap(), parse("x - y - 1").unwrap()];
/// let solution = solve_linear_system(&eqs, &[sym("x"), sym("y")], &mut Budget::default()).unwrap();
/// assert_eq!(
///     solution,
///     LinearSolution::Solved(vec![(sym("x"), Expr::frac(8, 5)), (sym("y"), Expr::frac(3, 5))])
/// );
/// ```
///
/// # Errors
/// `SolveFailure` when an equation is not linear in `vars`.
pub fn solve_linear_system(
    eqs: &[Expr],
    vars: &[Symbol],
    budget: &mut Budget,
) -> Result<LinearSolution, SolveError> {
    let n = vars.len();
    // Augmented rows [a_1 .. a_n | b] for a_1*x_1 + ... + a_n*x_n = b
    let mut rows: Vec<Vec<Expr>> = Vec::with_capacity(eqs.len());
    for eq in eqs {
        budget.check_size(eq)?;
        let expanded = expand_limited(eq, budget.max_terms())?;
        let mut row = Vec::with_capacity(n + 1);
        for v in vars {
            let coeff = simplify(&expanded.diff(v));
            if vars.iter().any(|w| !coeff.is_free_of(w)) {
                return Err(SolveError::failure(format!(
                    "Equation {} = 0 is not linear in {}",
                    eq, v
                )));
            }
            row.push(coeff);
        }
        let constant = vars
            .iter()
            .fold(expanded.clone(), |acc, v| acc.subs(v, &Expr::zero()));
        row.push(simplify(&Expr::negate(constant)));
        rows.push(row);
    }

    let mut pivots: Vec<(usize, usize)> = Vec::new();
    let mut r = 0;
    for c in 0..n {
        if r == rows.len() {
            break;
        }
        budget.tick()?;
        let Some(p) = (r..rows.len()).find(|&i| !rows[i][c].is_zero()) else {
            continue;
        };
        rows.swap(r, p);
        let pivot = rows[r][c].clone();
        rows[r] = rows[r]
            .iter()
            .map(|e| simplify(&Expr::div_expr(e.clone(), pivot.clone())))
            .collect();
        for i in 0..rows.len() {
            if i == r || rows[i][c].is_zero() {
                continue;
            }
            let factor = rows[i][c].clone();
            rows[i] = rows[i]
                .iter()
                .zip(&rows[r])
                .map(|(a, b)| {
                    simplify(&Expr::sub_expr(
                        a.clone(),
                        Expr::product(vec![factor.clone(), b.clone()]),
                    ))
                })
                .collect();
        }
        pivots.push((r, c));
        r += 1;
    }

    if rows[r..].iter().any(|row| !row[n].is_zero()) {
        tracing::debug!("linear system is inconsistent");
        return Ok(LinearSolution::Inconsistent);
    }

    let pivot_cols: Vec<usize> = pivots.iter().map(|&(_, c)| c).collect();
    let solution = pivots
        .iter()
        .map(|&(row, col)| {
            let free_terms = (0..n)
                .filter(|j| !pivot_cols.contains(j))
                .map(|j| Expr::product(vec![rows[row][j].clone(), vars[j].to_expr()]));
            let value = Expr::sub_expr(rows[row][n].clone(), Expr::sum(free_terms.collect()));
            (vars[col].clone(), simplify(&value))
        })
        .collect();
    Ok(LinearSolution::Solved(solution))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    fn system(eqs: &[&str], vars: &[&str]) -> Result<LinearSolution, SolveError> {
        let eqs: Vec<Expr> = eqs.iter().map(|e| parse(e).unwrap()).collect();
        let vars: Vec<Symbol> = vars.iter().map(|v| sym(v)).collect();
        solve_linear_system(&eqs, &vars, &mut Budget::default())
    }

    #[test]
    fn test_unique_solution() {
        let out = system(&["x + y + z - 6", "2*y + 5*z + 4", "2*x + 5*y - z - 27"], &["x", "y", "z"]);
        assert_eq!(
            out.unwrap(),
            LinearSolution::Solved(vec![
                (sym("x"), Expr::integer(5)),
                (sym("y"), Expr::integer(3)),
                (sym("z"), Expr::integer(-2)),
            ])
        );
    }

    #[test]
    fn test_underdetermined_uses_free_variables() {
        let out = system(&["x + y - 1"], &["x", "y"]).unwrap();
        assert_eq!(
            out,
            LinearSolution::Solved(vec![(sym("x"), parse("1 - y").unwrap())])
        );
    }

    #[test]
    fn test_inconsistent() {
        let out = system(&["x + y - 1", "x + y - 2"], &["x", "y"]).unwrap();
        assert_eq!(out, LinearSolution::Inconsistent);
    }

    #[test]
    fn test_symbolic_coefficients() {
        let out = system(&["a*x - 1"], &["x"]).unwrap();
        assert_eq!(out, LinearSolution::Solved(vec![(sym("x"), parse("1/a").unwrap())]));
    }

    #[test]
    fn test_nonlinear_rejected() {
        assert!(matches!(
            system(&["x*y - 1"], &["x", "y"]),
            Err(SolveError::SolveFailure(_))
        ));
    }
}
