// Differentiation engine - applies calculus rules
//
// The canonical constructors already fold `0 + u` and `1 * u`, so the rules
// below build results directly and let `Expr::sum`/`Expr::product` tidy up.
// Only `mul_opt` is used to keep the chain rule from allocating a product
// node for the very common `u' = 1` case.

use crate::ast::ExprKind;
use crate::functions::{Registry, mul_opt};
use crate::{Expr, Symbol};

impl Expr {
    /// Differentiate with respect to `var`.
    ///
    /// Undefined functions (`f(x)`) stay as `Derivative` constructs, and
    /// derivatives of an indefinite integral in its own variable return the
    /// integrand.
    ///
    /// # Example
    /// ```
    /// use symb_solve::sym;
    ///
    /// let x = sym("x");
    /// let f = x.pow(3);
    /// assert_eq!(f.diff(&x).to_string(), "3*x**2");
    /// ```
    pub fn diff(&self, var: &Symbol) -> Expr {
        if !matches!(self.kind(), ExprKind::Integral { .. }) && self.is_free_of(var) {
            return Expr::zero();
        }
        match self.kind() {
            ExprKind::Number(_) | ExprKind::Float(_) | ExprKind::Constant(_) => Expr::zero(),

            ExprKind::Symbol(s) => {
                if s == var {
                    Expr::one()
                } else {
                    Expr::zero()
                }
            }

            // Sum rule: (u + v)' = u' + v'
            ExprKind::Sum(terms) => Expr::sum(terms.iter().map(|t| t.diff(var)).collect()),

            // Product rule, n-ary: (f1*f2*...*fn)' = sum_i f_i' * prod_{j != i} f_j
            ExprKind::Product(factors) => {
                let mut terms = Vec::with_capacity(factors.len());
                for (i, factor) in factors.iter().enumerate() {
                    let prime = factor.diff(var);
                    if prime.is_zero() {
                        continue;
                    }
                    let mut rest: Vec<Expr> = factors
                        .iter()
                        .enumerate()
                        .filter(|(j, _)| *j != i)
                        .map(|(_, f)| f.clone())
                        .collect();
                    rest.push(prime);
                    terms.push(Expr::product(rest));
                }
                Expr::sum(terms)
            }

            ExprKind::Pow(base, exp) => diff_pow(base, exp, var),

            ExprKind::Function { name, args } => {
                if let Some(def) = Registry::get(name.name())
                    && def.validate_arity(args.len())
                {
                    let primes: Vec<Expr> = args.iter().map(|a| a.diff(var)).collect();
                    return (def.derivative)(args, &primes);
                }
                diff_undefined(self, var)
            }

            ExprKind::Derivative { inner, vars } => {
                if inner.function_name().is_some_and(|n| Registry::get(n).is_none()) {
                    let mut vars = vars.clone();
                    vars.push((var.clone(), 1));
                    Expr::derivative(inner.clone(), vars)
                } else {
                    self.doit().diff(var)
                }
            }

            ExprKind::Integral {
                integrand,
                var: bound,
                bounds,
            } => diff_integral(integrand, bound, bounds.as_ref(), var),

            ExprKind::Relation { op, lhs, rhs } => {
                Expr::relation(*op, lhs.diff(var), rhs.diff(var))
            }

            ExprKind::Tuple(items) => Expr::tuple(items.iter().map(|t| t.diff(var)).collect()),
        }
    }

    /// `n`-th derivative with respect to `var`.
    pub fn diff_n(&self, var: &Symbol, n: u32) -> Expr {
        let mut current = self.clone();
        for _ in 0..n {
            if current.is_zero() {
                break;
            }
            current = current.diff(var);
        }
        current
    }

    /// Evaluate every `Derivative` construct in the tree.
    ///
    /// Derivatives of undefined functions cannot be evaluated and stay.
    /// Integral constructs are left for [`crate::integrate`].
    pub fn doit(&self) -> Expr {
        if !self.contains_derivative() {
            return self.clone();
        }
        match self.kind() {
            ExprKind::Derivative { inner, vars } => {
                let inner = inner.doit();
                if inner.function_name().is_some_and(|n| Registry::get(n).is_none()) {
                    return Expr::derivative(inner, vars.clone());
                }
                vars.iter()
                    .fold(inner, |acc, (v, n)| acc.diff_n(v, *n))
            }
            _ => self.map_children(&mut |c| c.doit()),
        }
    }
}

/// Power rule with its two special cases.
fn diff_pow(base: &Expr, exp: &Expr, var: &Symbol) -> Expr {
    let base_prime = base.diff(var);
    let exp_prime = exp.diff(var);

    if exp_prime.is_zero() {
        // d/dx u^n = n * u^(n-1) * u'
        return Expr::product(vec![
            exp.clone(),
            Expr::pow(base.clone(), Expr::sub_expr(exp.clone(), Expr::one())),
            base_prime,
        ]);
    }

    let log_base = Expr::func1("log", base.clone());
    let current = Expr::pow(base.clone(), exp.clone());
    if base_prime.is_zero() {
        // d/dx a^v = a^v * log(a) * v'
        return Expr::product(vec![current, log_base, exp_prime]);
    }

    // d/dx u^v = u^v * (v' * log(u) + v * u' / u)
    Expr::product(vec![
        current,
        Expr::sum(vec![
            Expr::product(vec![exp_prime, log_base]),
            Expr::product(vec![exp.clone(), base_prime, Expr::recip(base.clone())]),
        ]),
    ])
}

/// Undefined applications stay as `Derivative(f(u), x)`, the total derivative.
fn diff_undefined(call: &Expr, var: &Symbol) -> Expr {
    Expr::derivative(call.clone(), vec![(var.clone(), 1)])
}

/// Fundamental theorem and differentiation under the integral sign.
fn diff_integral(
    integrand: &Expr,
    bound: &Symbol,
    bounds: Option<&(Expr, Expr)>,
    var: &Symbol,
) -> Expr {
    match bounds {
        None if bound == var => integrand.clone(),
        None => under_integral(integrand.diff(var), bound, None),
        Some((lo, hi)) => {
            let inner = if bound == var {
                Expr::zero()
            } else {
                under_integral(
                    integrand.diff(var),
                    bound,
                    Some((lo.clone(), hi.clone())),
                )
            };
            // Leibniz: f(hi) * hi' - f(lo) * lo'
            Expr::sum(vec![
                inner,
                mul_opt(integrand.subs(bound, hi), hi.diff(var)),
                Expr::negate(mul_opt(integrand.subs(bound, lo), lo.diff(var))),
            ])
        }
    }
}

fn under_integral(prime: Expr, bound: &Symbol, bounds: Option<(Expr, Expr)>) -> Expr {
    if prime.is_zero() {
        Expr::zero()
    } else {
        Expr::integral(prime, bound.clone(), bounds)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::{parse, sym};

    fn d(input: &str, var: &str) -> String {
        parse(input).unwrap().diff(&sym(var)).to_string()
    }

    #[test]
    fn test_polynomials() {
        assert_eq!(d("x**3", "x"), "3*x**2");
        assert_eq!(d("x**2 + 3*x + 1", "x"), "2*x + 3");
        assert_eq!(d("5", "x"), "0");
        assert_eq!(d("y**2", "x"), "0");
    }

    #[test]
    fn test_product_and_chain_rules() {
        let x = sym("x");
        let e = parse("x*sin(x)").unwrap().diff(&x);
        let expected = Expr::sum(vec![
            Expr::func1("sin", x.to_expr()),
            Expr::product(vec![x.to_expr(), Expr::func1("cos", x.to_expr())]),
        ]);
        assert_eq!(e, expected);
        assert_eq!(
            parse("exp(2*x)").unwrap().diff(&x),
            Expr::product(vec![Expr::integer(2), Expr::exp(x.to_expr() * 2)])
        );
    }

    #[test]
    fn test_quotient_via_negative_powers() {
        let x = sym("x");
        assert_eq!(parse("1/x").unwrap().diff(&x), Expr::negate(x.pow(-2)));
        assert_eq!(d("log(x)", "x"), "1/x");
    }

    #[test]
    fn test_general_power() {
        let x = sym("x");
        let e = parse("x**x").unwrap().diff(&x);
        let expected = Expr::product(vec![
            x.pow(x.to_expr()),
            Expr::sum(vec![Expr::func1("log", x.to_expr()), Expr::one()]),
        ]);
        assert_eq!(e, expected);
    }

    #[test]
    fn test_undefined_function() {
        let x = sym("x");
        let f = Expr::func("f", vec![x.to_expr()]);
        let df = f.diff(&x);
        assert!(matches!(df.kind(), ExprKind::Derivative { .. }));
        let d2 = df.diff(&x);
        match d2.kind() {
            ExprKind::Derivative { vars, .. } => assert_eq!(vars, &vec![(x.clone(), 2)]),
            _ => unreachable!("expected a derivative construct"),
        }
    }

    #[test]
    fn test_doit_evaluates_constructs() {
        let x = sym("x");
        let construct = Expr::derivative(x.pow(3), vec![(x.clone(), 2)]);
        assert_eq!(construct.doit(), x.to_expr() * 6);
        let nested = Expr::sum(vec![construct, Expr::one()]);
        assert_eq!(nested.doit(), Expr::sum(vec![x.to_expr() * 6, Expr::one()]));
    }

    #[test]
    fn test_integral_in_own_variable() {
        let x = sym("x");
        let integral = Expr::integral(Expr::func1("cos", x.to_expr()), x.clone(), None);
        assert_eq!(integral.diff(&x), Expr::func1("cos", x.to_expr()));
        let definite = Expr::integral(x.pow(2), x.clone(), Some((Expr::zero(), sym("t").to_expr())));
        assert_eq!(definite.diff(&sym("t")), sym("t").pow(2));
    }

    #[test]
    fn test_diff_n() {
        let x = sym("x");
        assert_eq!(x.pow(3).diff_n(&x, 3), Expr::integer(6));
        assert_eq!(x.pow(3).diff_n(&x, 5), Expr::zero());
    }
}
