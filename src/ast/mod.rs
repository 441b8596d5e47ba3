//! Abstract Syntax Tree for mathematical expressions.
//!
//! This module defines:
//! - `Expr` - The central, immutable expression value
//! - `ExprKind` - The variants of expression nodes (Number, Symbol, Sum, Relation, ...)
//!
//! # Architecture
//!
//! ## Canonical form
//! Every `Expr` is built through the constructors in [`constructors`], which keep
//! the tree canonical: sums and products are n-ary, flat, numerically folded and
//! sorted, like terms and equal bases are collected, and exact rational powers
//! are evaluated. Structural equality is therefore semantic equality for the
//! polynomial and rational algebra the solvers need (`x + x == 2*x`).
//!
//! Subtraction is a sum with a `-1` coefficient, division is a product with a
//! `-1` power, `exp(u)` is `E**u` and `sqrt(u)` is `u**(1/2)`.
//!
//! ## Structural hashing
//! Each `Expr` carries a pre-computed hash so inequality is usually decided
//! without walking the tree. Nodes are shared through `Arc`, so cloning is O(1)
//! and expressions are `Send + Sync`.

mod constructors;
mod ordering;

use rustc_hash::FxHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, LazyLock};

use crate::number::{Numeric, Rational};
use crate::symbol::Symbol;

pub use ordering::expr_cmp;

/// A float wrapped with bitwise equality and a total order, so that
/// expressions holding approximate values can still be hashed and sorted.
#[derive(Debug, Clone, Copy)]
pub struct Real(pub f64);

impl Real {
    fn normalized_bits(self) -> u64 {
        if self.0 == 0.0 { 0 } else { self.0.to_bits() }
    }
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.normalized_bits() == other.normalized_bits()
    }
}

impl Eq for Real {}

impl Hash for Real {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized_bits().hash(state);
    }
}

/// Named mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Pi,
    E,
    /// The imaginary unit.
    I,
    /// Unsigned infinity, the value of `1/0`.
    ComplexInfinity,
}

/// Relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    /// The operator with sides swapped (`a < b` is `b > a`).
    pub fn reversed(self) -> RelOp {
        match self {
            RelOp::Eq => RelOp::Eq,
            RelOp::Ne => RelOp::Ne,
            RelOp::Lt => RelOp::Gt,
            RelOp::Le => RelOp::Ge,
            RelOp::Gt => RelOp::Lt,
            RelOp::Ge => RelOp::Le,
        }
    }
}

/// The kind (structure) of an expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Exact rational number
    Number(Rational),
    /// Approximate number produced by a numeric fallback
    Float(Real),
    Constant(Constant),
    /// Free variable
    Symbol(Symbol),
    /// N-ary sum, flat and sorted; a numeric term comes first
    Sum(Vec<Expr>),
    /// N-ary product, flat and sorted; a numeric coefficient comes first
    Product(Vec<Expr>),
    Pow(Expr, Expr),
    /// Function application, built-in (`sin`, `log`, ...) or undefined (`f(x)`)
    Function { name: Symbol, args: Vec<Expr> },
    /// Unevaluated derivative construct, `vars` holds (variable, order) pairs
    Derivative {
        inner: Expr,
        vars: Vec<(Symbol, u32)>,
    },
    /// Unevaluated integral construct, optionally definite
    Integral {
        integrand: Expr,
        var: Symbol,
        bounds: Option<(Expr, Expr)>,
    },
    /// Relational: equality, inequality or an ordering
    Relation { op: RelOp, lhs: Expr, rhs: Expr },
    /// Ordered collection (a system of equations, a point, a constructor argument)
    Tuple(Vec<Expr>),
}

/// A symbolic mathematical expression.
#[derive(Clone)]
pub struct Expr {
    hash: u64,
    kind: Arc<ExprKind>,
}

/// Placeholder swapped into nodes while they are torn down.
static DROP_PLACEHOLDER: LazyLock<Expr> =
    LazyLock::new(|| Expr::new(ExprKind::Number(Rational::from_i64(0))));

impl Deref for Expr {
    type Target = ExprKind;
    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}

impl PartialEq for Expr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.hash != other.hash {
            return false;
        }
        Arc::ptr_eq(&self.kind, &other.kind) || self.kind == other.kind
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for Expr {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expr {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        expr_cmp(self, other)
    }
}

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_srepr())
    }
}

// Deep trees are torn down iteratively to keep drop off the call stack.
impl Drop for Expr {
    fn drop(&mut self) {
        fn drain(kind: &mut ExprKind, queue: &mut Vec<Expr>) {
            match kind {
                ExprKind::Sum(items) | ExprKind::Product(items) | ExprKind::Tuple(items) => {
                    queue.append(items);
                }
                ExprKind::Function { args, .. } => queue.append(args),
                ExprKind::Pow(a, b) | ExprKind::Relation { lhs: a, rhs: b, .. } => {
                    queue.push(std::mem::replace(a, DROP_PLACEHOLDER.clone()));
                    queue.push(std::mem::replace(b, DROP_PLACEHOLDER.clone()));
                }
                ExprKind::Derivative { inner, .. } => {
                    queue.push(std::mem::replace(inner, DROP_PLACEHOLDER.clone()));
                }
                ExprKind::Integral {
                    integrand, bounds, ..
                } => {
                    queue.push(std::mem::replace(integrand, DROP_PLACEHOLDER.clone()));
                    if let Some((lo, hi)) = bounds.take() {
                        queue.push(lo);
                        queue.push(hi);
                    }
                }
                ExprKind::Number(_)
                | ExprKind::Float(_)
                | ExprKind::Constant(_)
                | ExprKind::Symbol(_) => {}
            }
        }

        let Some(kind) = Arc::get_mut(&mut self.kind) else {
            return;
        };
        if !has_children(kind) {
            return;
        }
        let mut queue = Vec::new();
        drain(kind, &mut queue);
        while let Some(mut child) = queue.pop() {
            if let Some(child_kind) = Arc::get_mut(&mut child.kind) {
                drain(child_kind, &mut queue);
            }
        }
    }
}

fn has_children(kind: &ExprKind) -> bool {
    !matches!(
        kind,
        ExprKind::Number(_) | ExprKind::Float(_) | ExprKind::Constant(_) | ExprKind::Symbol(_)
    )
}

fn compute_hash(kind: &ExprKind) -> u64 {
    let mut hasher = FxHasher::default();
    kind.hash(&mut hasher);
    hasher.finish()
}

impl Expr {
    /// Wrap a node without canonicalization. Only for nodes already in canonical form.
    pub(crate) fn new(kind: ExprKind) -> Self {
        let hash = compute_hash(&kind);
        Self {
            hash,
            kind: Arc::new(kind),
        }
    }

    #[inline]
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    #[inline]
    pub fn structural_hash(&self) -> u64 {
        self.hash
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn as_rational(&self) -> Option<&Rational> {
        match self.kind() {
            ExprKind::Number(r) => Some(r),
            _ => None,
        }
    }

    /// Numeric value of a `Number` or `Float` leaf.
    pub fn as_numeric(&self) -> Option<Numeric> {
        match self.kind() {
            ExprKind::Number(r) => Some(Numeric::Exact(r.clone())),
            ExprKind::Float(f) => Some(Numeric::Approx(f.0)),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self.kind() {
            ExprKind::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind(), ExprKind::Number(_) | ExprKind::Float(_))
    }

    pub fn is_zero(&self) -> bool {
        match self.kind() {
            ExprKind::Number(r) => num_traits::Zero::is_zero(r),
            ExprKind::Float(f) => f.0 == 0.0,
            _ => false,
        }
    }

    pub fn is_one(&self) -> bool {
        self.as_rational().is_some_and(num_traits::One::is_one)
    }

    pub fn is_constant(&self, c: Constant) -> bool {
        matches!(self.kind(), ExprKind::Constant(k) if *k == c)
    }

    pub fn is_relational(&self) -> bool {
        matches!(self.kind(), ExprKind::Relation { .. })
    }

    /// Name of a function application, if this is one.
    pub fn function_name(&self) -> Option<&str> {
        match self.kind() {
            ExprKind::Function { name, .. } => Some(name.name()),
            _ => None,
        }
    }

    /// View as `base ** exp` (non-powers are `self ** 1`).
    pub fn as_base_exp(&self) -> (Expr, Expr) {
        match self.kind() {
            ExprKind::Pow(b, e) => (b.clone(), e.clone()),
            _ => (self.clone(), Expr::one()),
        }
    }

    /// Split off the numeric coefficient: `3*x*y` is `(3, x*y)`.
    pub fn as_coeff_mul(&self) -> (Numeric, Expr) {
        match self.kind() {
            ExprKind::Number(r) => (Numeric::Exact(r.clone()), Expr::one()),
            ExprKind::Float(f) => (Numeric::Approx(f.0), Expr::one()),
            ExprKind::Product(factors) => match factors.first().and_then(Expr::as_numeric) {
                Some(c) => {
                    let rest = if factors.len() == 2 {
                        factors[1].clone()
                    } else {
                        Expr::new(ExprKind::Product(factors[1..].to_vec()))
                    };
                    (c, rest)
                }
                None => (Numeric::one(), self.clone()),
            },
            _ => (Numeric::one(), self.clone()),
        }
    }

    /// Whether the leading numeric coefficient is negative (`-x`, `-2*y`, `-3`).
    pub fn has_negative_coefficient(&self) -> bool {
        self.as_coeff_mul().0.is_negative()
    }

    /// Direct children of this node.
    pub fn children(&self) -> Vec<Expr> {
        match self.kind() {
            ExprKind::Sum(items) | ExprKind::Product(items) | ExprKind::Tuple(items) => {
                items.clone()
            }
            ExprKind::Function { args, .. } => args.clone(),
            ExprKind::Pow(a, b) | ExprKind::Relation { lhs: a, rhs: b, .. } => {
                vec![a.clone(), b.clone()]
            }
            ExprKind::Derivative { inner, .. } => vec![inner.clone()],
            ExprKind::Integral {
                integrand, bounds, ..
            } => {
                let mut out = vec![integrand.clone()];
                if let Some((lo, hi)) = bounds {
                    out.push(lo.clone());
                    out.push(hi.clone());
                }
                out
            }
            ExprKind::Number(_)
            | ExprKind::Float(_)
            | ExprKind::Constant(_)
            | ExprKind::Symbol(_) => Vec::new(),
        }
    }

    /// Rebuild this node with every child passed through `f`, re-canonicalizing.
    pub fn map_children(&self, f: &mut dyn FnMut(&Expr) -> Expr) -> Expr {
        match self.kind() {
            ExprKind::Sum(items) => Expr::sum(items.iter().map(&mut *f).collect()),
            ExprKind::Product(items) => Expr::product(items.iter().map(&mut *f).collect()),
            ExprKind::Tuple(items) => Expr::tuple(items.iter().map(&mut *f).collect()),
            ExprKind::Function { name, args } => {
                Expr::func(name.name(), args.iter().map(&mut *f).collect())
            }
            ExprKind::Pow(b, e) => Expr::pow(f(b), f(e)),
            ExprKind::Relation { op, lhs, rhs } => Expr::relation(*op, f(lhs), f(rhs)),
            ExprKind::Derivative { inner, vars } => Expr::derivative(f(inner), vars.clone()),
            ExprKind::Integral {
                integrand,
                var,
                bounds,
            } => Expr::integral(
                f(integrand),
                var.clone(),
                bounds.as_ref().map(|(lo, hi)| (f(lo), f(hi))),
            ),
            ExprKind::Number(_)
            | ExprKind::Float(_)
            | ExprKind::Constant(_)
            | ExprKind::Symbol(_) => self.clone(),
        }
    }

    /// True if any node (including this one) satisfies `pred`.
    pub fn any(&self, pred: &dyn Fn(&Expr) -> bool) -> bool {
        if pred(self) {
            return true;
        }
        match self.kind() {
            ExprKind::Sum(items) | ExprKind::Product(items) | ExprKind::Tuple(items) => {
                items.iter().any(|c| c.any(pred))
            }
            ExprKind::Function { args, .. } => args.iter().any(|c| c.any(pred)),
            ExprKind::Pow(a, b) | ExprKind::Relation { lhs: a, rhs: b, .. } => {
                a.any(pred) || b.any(pred)
            }
            _ => self.children().iter().any(|c| c.any(pred)),
        }
    }

    /// Free variables, sorted by name.
    ///
    /// The variable of an indefinite integral stays free (the result depends on
    /// it); a definite integral binds it.
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_free_symbols(&mut out);
        out
    }

    fn collect_free_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self.kind() {
            ExprKind::Symbol(s) => {
                out.insert(s.clone());
            }
            ExprKind::Derivative { inner, vars } => {
                inner.collect_free_symbols(out);
                out.extend(vars.iter().map(|(v, _)| v.clone()));
            }
            ExprKind::Integral {
                integrand,
                var,
                bounds,
            } => {
                let mut inner = BTreeSet::new();
                integrand.collect_free_symbols(&mut inner);
                match bounds {
                    Some((lo, hi)) => {
                        inner.remove(var);
                        lo.collect_free_symbols(&mut inner);
                        hi.collect_free_symbols(&mut inner);
                    }
                    None => {
                        inner.insert(var.clone());
                    }
                }
                out.extend(inner);
            }
            _ => {
                for c in self.children() {
                    c.collect_free_symbols(out);
                }
            }
        }
    }

    pub fn has_symbol(&self, var: &Symbol) -> bool {
        self.any(&|e| e.as_symbol() == Some(var))
    }

    /// Free of `var`: constant with respect to it.
    pub fn is_free_of(&self, var: &Symbol) -> bool {
        !self.has_symbol(var)
    }

    /// Contains the imaginary unit anywhere.
    pub fn has_imaginary(&self) -> bool {
        self.any(&|e| e.is_constant(Constant::I))
    }

    pub fn has_float(&self) -> bool {
        self.any(&|e| matches!(e.kind(), ExprKind::Float(_)))
    }

    pub fn contains_derivative(&self) -> bool {
        self.any(&|e| matches!(e.kind(), ExprKind::Derivative { .. }))
    }

    pub fn contains_integral(&self) -> bool {
        self.any(&|e| matches!(e.kind(), ExprKind::Integral { .. }))
    }

    /// Replace every occurrence of `var` by `value`.
    pub fn subs(&self, var: &Symbol, value: &Expr) -> Expr {
        if !self.has_symbol(var) {
            return self.clone();
        }
        match self.kind() {
            ExprKind::Symbol(s) if s == var => value.clone(),
            _ => self.map_children(&mut |c| c.subs(var, value)),
        }
    }

    /// Replace every occurrence of the subexpression `pattern` by `value`.
    pub fn replace(&self, pattern: &Expr, value: &Expr) -> Expr {
        if self == pattern {
            return value.clone();
        }
        if self.children().is_empty() {
            return self.clone();
        }
        self.map_children(&mut |c| c.replace(pattern, value))
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(Expr::node_count).sum::<usize>()
    }

    /// Height of the tree.
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(Expr::depth)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_sum_flattening() {
        let (x, y, z) = (sym("x").to_expr(), sym("y").to_expr(), sym("z").to_expr());
        let inner = Expr::sum(vec![x, y]);
        let outer = Expr::sum(vec![inner, z]);
        match outer.kind() {
            ExprKind::Sum(terms) => assert_eq!(terms.len(), 3),
            _ => panic!("Expected Sum"),
        }
    }

    #[test]
    fn test_product_flattening() {
        let (a, b, c) = (sym("a").to_expr(), sym("b").to_expr(), sym("c").to_expr());
        let inner = Expr::product(vec![a, b]);
        let outer = Expr::product(vec![inner, c]);
        match outer.kind() {
            ExprKind::Product(factors) => assert_eq!(factors.len(), 3),
            _ => panic!("Expected Product"),
        }
    }

    #[test]
    fn test_free_symbols_sorted() {
        let e = sym("y").to_expr() * sym("x") + sym("b");
        let names: Vec<String> = e.free_symbols().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["b", "x", "y"]);
    }

    #[test]
    fn test_definite_integral_binds_variable() {
        let x = sym("x");
        let definite = Expr::integral(
            x.pow(2),
            x.clone(),
            Some((Expr::zero(), sym("a").to_expr())),
        );
        assert!(!definite.free_symbols().contains(&x));
        assert!(definite.free_symbols().contains(&sym("a")));
        let indefinite = Expr::integral(x.pow(2), x.clone(), None);
        assert!(indefinite.free_symbols().contains(&x));
    }

    #[test]
    fn test_subs_recanonicalizes() {
        let x = sym("x");
        let e = x.pow(2) + x.to_expr() * 3;
        let at_two = e.subs(&x, &Expr::integer(2));
        assert_eq!(at_two, Expr::integer(10));
    }

    #[test]
    fn test_deep_tree_drops() {
        let x = sym("x").to_expr();
        let mut e = x.clone();
        for _ in 0..20_000 {
            e = Expr::new(ExprKind::Pow(e, x.clone()));
        }
        assert!(matches!(e.kind(), ExprKind::Pow(_, _)));
        drop(e);
    }
}
