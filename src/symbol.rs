//! Symbols and operator overloading for building expressions in code
//!
//! # Example
//! ```
//! use symb_solve::{sym, Expr};
//!
//! let x = sym("x");
//! let expr = x.pow(2) - 4;
//! assert_eq!(expr.to_string(), "x**2 - 4");
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use crate::Expr;

/// A named variable. Ordering is by name, which gives the "sorted by name"
/// variable order used throughout the solvers.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Create a new symbol with the given name
    pub fn new(name: impl AsRef<str>) -> Self {
        Symbol(Arc::from(name.as_ref()))
    }

    /// Get the name of the symbol
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Convert to an Expr
    pub fn to_expr(&self) -> Expr {
        Expr::from_symbol(self.clone())
    }

    /// Raise to a power
    pub fn pow(&self, exp: impl Into<Expr>) -> Expr {
        Expr::pow(self.to_expr(), exp.into())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", &*self.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Create a symbol
pub fn sym(name: &str) -> Symbol {
    Symbol::new(name)
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        s.to_expr()
    }
}

impl From<&Symbol> for Expr {
    fn from(s: &Symbol) -> Self {
        s.to_expr()
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        Expr::integer(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        Expr::integer(i64::from(n))
    }
}

// ===== Operator overloading =====

macro_rules! impl_binop {
    ($trait:ident, $method:ident, $build:expr) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                ($build)(self, rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                ($build)(self.clone(), rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for Symbol {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                ($build)(self.to_expr(), rhs.into())
            }
        }

        impl<R: Into<Expr>> $trait<R> for &Symbol {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                ($build)(self.to_expr(), rhs.into())
            }
        }
    };
}

impl_binop!(Add, add, |a: Expr, b: Expr| Expr::sum(vec![a, b]));
impl_binop!(Sub, sub, Expr::sub_expr);
impl_binop!(Mul, mul, |a: Expr, b: Expr| Expr::product(vec![a, b]));
impl_binop!(Div, div, Expr::div_expr);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::negate(self)
    }
}

impl Neg for &Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::negate(self.clone())
    }
}

impl Neg for Symbol {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::negate(self.to_expr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_ordering_is_by_name() {
        let mut v = vec![sym("y"), sym("b"), sym("x")];
        v.sort();
        let names: Vec<&str> = v.iter().map(Symbol::name).collect();
        assert_eq!(names, vec!["b", "x", "y"]);
    }

    #[test]
    fn test_operators_build_canonical_sums() {
        let x = sym("x");
        let e = &x + &x;
        assert_eq!(e, Expr::product(vec![Expr::integer(2), x.to_expr()]));
        assert_eq!((x.clone() - x.clone()), Expr::zero());
    }
}
