//! Multi-variable differentiation helpers
//!
//! Gradient, Hessian and the leading principal minors used by the
//! convexity analyzer and the derivative handler, plus string-based
//! wrappers.

use crate::error::SolveError;
use crate::simplification::{expand, simplify};
use crate::{Expr, Symbol, parse};

/// Compute the gradient of an expression with respect to `vars`
/// Returns a vector of partial derivatives [∂f/∂x₁, ∂f/∂x₂, ...]
///
/// # Example
/// ```
/// use symb_solve::{gradient, parse, sym};
///
/// let f = parse("x**2 + y**2").unwrap();
/// let grad = gradient(&f, &[sym("x"), sym("y")]);
/// assert_eq!(grad[0].to_string(), "2*x");
/// ```
pub fn gradient(expr: &Expr, vars: &[Symbol]) -> Vec<Expr> {
    vars.iter().map(|v| simplify(&expr.diff(v))).collect()
}

/// Compute the Hessian matrix H[i][j] = ∂²f/∂xᵢ∂xⱼ
pub fn hessian(expr: &Expr, vars: &[Symbol]) -> Vec<Vec<Expr>> {
    gradient(expr, vars)
        .iter()
        .map(|partial| gradient(partial, vars))
        .collect()
}

/// Determinant by cofactor expansion along the first row, expanded.
pub fn determinant(matrix: &[Vec<Expr>]) -> Expr {
    match matrix.len() {
        0 => Expr::one(),
        1 => matrix[0][0].clone(),
        2 => expand(&Expr::sub_expr(
            Expr::product(vec![matrix[0][0].clone(), matrix[1][1].clone()]),
            Expr::product(vec![matrix[0][1].clone(), matrix[1][0].clone()]),
        )),
        n => {
            let terms = (0..n)
                .filter(|&j| !matrix[0][j].is_zero())
                .map(|j| {
                    let minor: Vec<Vec<Expr>> = matrix[1..]
                        .iter()
                        .map(|row| {
                            row.iter()
                                .enumerate()
                                .filter(|(k, _)| *k != j)
                                .map(|(_, e)| e.clone())
                                .collect()
                        })
                        .collect();
                    let sign = if j % 2 == 0 { 1 } else { -1 };
                    Expr::product(vec![
                        Expr::integer(sign),
                        matrix[0][j].clone(),
                        determinant(&minor),
                    ])
                })
                .collect();
            expand(&Expr::sum(terms))
        }
    }
}

/// Determinants of the top-left k×k submatrices, k = 1..n.
pub fn leading_principal_minors(matrix: &[Vec<Expr>]) -> Vec<Expr> {
    (1..=matrix.len())
        .map(|k| {
            let sub: Vec<Vec<Expr>> = matrix[..k].iter().map(|row| row[..k].to_vec()).collect();
            simplify(&determinant(&sub))
        })
        .collect()
}

/// Compute the gradient from a formula string
///
/// # Errors
/// Returns the parse error when `formula` cannot be parsed.
pub fn gradient_str(formula: &str, vars: &[&str]) -> Result<Vec<String>, SolveError> {
    let expr = parse(formula)?;
    let vars: Vec<Symbol> = vars.iter().map(Symbol::new).collect();
    Ok(gradient(&expr, &vars).iter().map(|e| e.to_string()).collect())
}

/// Compute the Hessian matrix from a formula string
///
/// # Errors
/// Returns the parse error when `formula` cannot be parsed.
pub fn hessian_str(formula: &str, vars: &[&str]) -> Result<Vec<Vec<String>>, SolveError> {
    let expr = parse(formula)?;
    let vars: Vec<Symbol> = vars.iter().map(Symbol::new).collect();
    Ok(hessian(&expr, &vars)
        .iter()
        .map(|row| row.iter().map(|e| e.to_string()).collect())
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    #[test]
    fn test_gradient() {
        let grad = gradient_str("x^2 + y^2", &["x", "y"]).unwrap();
        assert_eq!(grad, vec!["2*x", "2*y"]);
    }

    #[test]
    fn test_hessian() {
        let hess = hessian_str("x^2 * y", &["x", "y"]).unwrap();
        assert_eq!(hess, vec![vec!["2*y", "2*x"], vec!["2*x", "0"]]);
    }

    #[test]
    fn test_leading_principal_minors() {
        let f = parse("x**2 + y**2").unwrap();
        let h = hessian(&f, &[Symbol::new("x"), Symbol::new("y")]);
        let minors = leading_principal_minors(&h);
        assert_eq!(minors, vec![Expr::integer(2), Expr::integer(4)]);
    }

    #[test]
    fn test_three_by_three_determinant() {
        let m: Vec<Vec<Expr>> = [[2, 0, 1], [1, 3, 2], [1, 1, 1]]
            .iter()
            .map(|row| row.iter().map(|&n| Expr::integer(n)).collect())
            .collect();
        // 2*(3-2) - 0 + 1*(1-3)
        assert_eq!(determinant(&m), Expr::integer(0));
        let symbolic = vec![
            vec![parse("a").unwrap(), parse("b").unwrap()],
            vec![parse("b").unwrap(), parse("a").unwrap()],
        ];
        assert_eq!(determinant(&symbolic), parse("a**2 - b**2").unwrap());
    }
}
