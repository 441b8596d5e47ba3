//! Expression constructors.
//!
//! The n-ary constructors here are the only way composite nodes get built, so
//! they carry the canonicalization: flattening, numeric folding, like-term and
//! equal-base collection, and exact evaluation of rational powers.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use num_traits::{One, Zero};

use super::{Constant, Expr, ExprKind, Real, RelOp, expr_cmp};
use crate::number::{Numeric, Rational, extract_perfect_power};
use crate::symbol::Symbol;

impl Expr {
    // -------------------------------------------------------------------------
    // Atoms
    // -------------------------------------------------------------------------

    pub fn integer(n: i64) -> Self {
        Self::new(ExprKind::Number(Rational::from_i64(n)))
    }

    pub fn rational(r: Rational) -> Self {
        Self::new(ExprKind::Number(r))
    }

    /// `n / d`; a zero denominator gives complex infinity.
    pub fn frac(n: i64, d: i64) -> Self {
        match Rational::frac(n, d) {
            Some(r) => Self::rational(r),
            None => Self::complex_infinity(),
        }
    }

    pub fn float(value: f64) -> Self {
        Self::new(ExprKind::Float(Real(value)))
    }

    pub fn numeric(n: Numeric) -> Self {
        match n {
            Numeric::Exact(r) => Self::rational(r),
            Numeric::Approx(f) => Self::float(f),
        }
    }

    pub fn zero() -> Self {
        Self::integer(0)
    }

    pub fn one() -> Self {
        Self::integer(1)
    }

    pub fn neg_one() -> Self {
        Self::integer(-1)
    }

    pub fn half() -> Self {
        Self::frac(1, 2)
    }

    pub fn symbol(name: impl AsRef<str>) -> Self {
        Self::from_symbol(Symbol::new(name))
    }

    pub fn from_symbol(s: Symbol) -> Self {
        Self::new(ExprKind::Symbol(s))
    }

    pub fn constant(c: Constant) -> Self {
        Self::new(ExprKind::Constant(c))
    }

    pub fn pi() -> Self {
        Self::constant(Constant::Pi)
    }

    pub fn e() -> Self {
        Self::constant(Constant::E)
    }

    pub fn imaginary_unit() -> Self {
        Self::constant(Constant::I)
    }

    pub fn complex_infinity() -> Self {
        Self::constant(Constant::ComplexInfinity)
    }

    // -------------------------------------------------------------------------
    // Arithmetic
    // -------------------------------------------------------------------------

    /// Create a sum, flattening nested sums, folding numbers and collecting like terms.
    pub fn sum(terms: Vec<Expr>) -> Self {
        let mut flat = Vec::with_capacity(terms.len());
        for t in terms {
            match t.kind() {
                ExprKind::Sum(inner) => flat.extend(inner.iter().cloned()),
                _ => flat.push(t),
            }
        }

        let mut constant = Numeric::zero();
        let mut collected: BTreeMap<Expr, Numeric> = BTreeMap::new();
        for t in flat {
            match t.kind() {
                ExprKind::Number(r) => constant = constant.add(&Numeric::Exact(r.clone())),
                ExprKind::Float(f) => constant = constant.add(&Numeric::Approx(f.0)),
                ExprKind::Constant(Constant::ComplexInfinity) => {
                    return Self::complex_infinity();
                }
                _ => {
                    let (c, rest) = t.as_coeff_mul();
                    match collected.entry(rest) {
                        Entry::Vacant(v) => {
                            v.insert(c);
                        }
                        Entry::Occupied(mut o) => {
                            let acc = o.get().add(&c);
                            o.insert(acc);
                        }
                    }
                }
            }
        }

        let mut out = Vec::with_capacity(collected.len() + 1);
        if !constant.is_zero() {
            out.push(Self::numeric(constant));
        }
        for (rest, c) in collected {
            if !c.is_zero() {
                out.push(Self::scaled(c, rest));
            }
        }
        match out.len() {
            0 => Self::zero(),
            1 => out.swap_remove(0),
            _ => Self::new(ExprKind::Sum(out)),
        }
    }

    /// `c * rest` where `rest` is already a canonical, coefficient-free term.
    fn scaled(c: Numeric, rest: Expr) -> Self {
        if c.is_one() {
            return rest;
        }
        let mut factors = vec![Self::numeric(c)];
        match rest.kind() {
            ExprKind::Product(fs) => factors.extend(fs.iter().cloned()),
            _ => factors.push(rest),
        }
        Self::new(ExprKind::Product(factors))
    }

    /// Create a product, flattening nested products, folding the numeric
    /// coefficient and adding exponents of equal bases.
    pub fn product(factors: Vec<Expr>) -> Self {
        let mut flat = Vec::with_capacity(factors.len());
        for f in factors {
            match f.kind() {
                ExprKind::Product(inner) => flat.extend(inner.iter().cloned()),
                _ => flat.push(f),
            }
        }

        let mut coeff = Numeric::one();
        let mut infinite = false;
        // base -> (summed exponent, the untouched factor while the base is seen once)
        let mut bases: BTreeMap<Expr, (Expr, Option<Expr>)> = BTreeMap::new();
        for f in flat {
            match f.kind() {
                ExprKind::Number(r) => coeff = coeff.mul(&Numeric::Exact(r.clone())),
                ExprKind::Float(v) => coeff = coeff.mul(&Numeric::Approx(v.0)),
                ExprKind::Constant(Constant::ComplexInfinity) => infinite = true,
                _ => {
                    let (base, exp) = f.as_base_exp();
                    match bases.entry(base) {
                        Entry::Vacant(v) => {
                            v.insert((exp, Some(f)));
                        }
                        Entry::Occupied(mut o) => {
                            let (acc, original) = o.get_mut();
                            *acc = Self::sum(vec![acc.clone(), exp]);
                            *original = None;
                        }
                    }
                }
            }
        }
        if infinite {
            return Self::complex_infinity();
        }
        if coeff.is_zero() {
            return Self::numeric(coeff);
        }

        let mut out: Vec<Expr> = Vec::with_capacity(bases.len());
        for (base, (exp, original)) in bases {
            let built = match original {
                Some(f) => f,
                None => Self::pow(base, exp),
            };
            match built.kind() {
                ExprKind::Number(r) => coeff = coeff.mul(&Numeric::Exact(r.clone())),
                ExprKind::Float(v) => coeff = coeff.mul(&Numeric::Approx(v.0)),
                ExprKind::Product(inner) => {
                    for g in inner {
                        match g.as_numeric() {
                            Some(n) => coeff = coeff.mul(&n),
                            None => out.push(g.clone()),
                        }
                    }
                }
                _ => out.push(built),
            }
        }
        if coeff.is_zero() {
            return Self::numeric(coeff);
        }
        out.sort_by(expr_cmp);

        if !coeff.is_one()
            && out.len() == 1
            && let ExprKind::Sum(terms) = out[0].kind()
        {
            let c = Self::numeric(coeff);
            return Self::sum(
                terms
                    .iter()
                    .map(|t| Self::product(vec![c.clone(), t.clone()]))
                    .collect(),
            );
        }

        match (coeff.is_one(), out.len()) {
            (_, 0) => Self::numeric(coeff),
            (true, 1) => out.swap_remove(0),
            (true, _) => Self::new(ExprKind::Product(out)),
            (false, _) => {
                out.insert(0, Self::numeric(coeff));
                Self::new(ExprKind::Product(out))
            }
        }
    }

    /// Create `base ** exp`, evaluating what can be evaluated exactly.
    pub fn pow(base: Expr, exp: Expr) -> Self {
        if exp.is_zero() {
            return Self::one();
        }
        if exp.is_one() || base.is_one() {
            return base;
        }
        match (base.kind(), exp.kind()) {
            (ExprKind::Number(b), ExprKind::Number(e)) => {
                if let Some(v) = rational_pow(b, e) {
                    return v;
                }
            }
            (ExprKind::Float(_), _) | (_, ExprKind::Float(_))
                if base.is_number() && exp.is_number() =>
            {
                let (bv, ev) = (
                    base.as_numeric().map_or(f64::NAN, |n| n.to_f64()),
                    exp.as_numeric().map_or(f64::NAN, |n| n.to_f64()),
                );
                if bv >= 0.0 || ev.fract() == 0.0 {
                    return Self::float(bv.powf(ev));
                }
            }
            (ExprKind::Constant(Constant::I), ExprKind::Number(e)) => {
                if let Some(n) = e.to_i64() {
                    return match n.rem_euclid(4) {
                        0 => Self::one(),
                        1 => Self::imaginary_unit(),
                        2 => Self::neg_one(),
                        _ => Self::product(vec![Self::neg_one(), Self::imaginary_unit()]),
                    };
                }
            }
            (ExprKind::Constant(Constant::ComplexInfinity), ExprKind::Number(e)) => {
                return if e.is_positive() {
                    Self::complex_infinity()
                } else {
                    Self::zero()
                };
            }
            (ExprKind::Constant(Constant::E), ExprKind::Function { name, args })
                if name.name() == "log" && args.len() == 1 =>
            {
                return args[0].clone();
            }
            (ExprKind::Pow(b1, e1), ExprKind::Number(e)) if e.is_integer() => {
                return Self::pow(b1.clone(), Self::product(vec![e1.clone(), exp.clone()]));
            }
            (ExprKind::Product(factors), ExprKind::Number(e)) => {
                if e.is_integer() {
                    return Self::product(
                        factors
                            .iter()
                            .map(|f| Self::pow(f.clone(), exp.clone()))
                            .collect(),
                    );
                }
                if let Some(c) = factors[0].as_rational()
                    && c.is_positive()
                {
                    let rest = if factors.len() == 2 {
                        factors[1].clone()
                    } else {
                        Self::new(ExprKind::Product(factors[1..].to_vec()))
                    };
                    return Self::product(vec![
                        Self::pow(factors[0].clone(), exp.clone()),
                        Self::pow(rest, exp),
                    ]);
                }
            }
            _ => {}
        }
        Self::new(ExprKind::Pow(base, exp))
    }

    pub fn sub_expr(a: Expr, b: Expr) -> Self {
        Self::sum(vec![a, Self::negate(b)])
    }

    pub fn div_expr(a: Expr, b: Expr) -> Self {
        Self::product(vec![a, Self::pow(b, Self::neg_one())])
    }

    pub fn negate(a: Expr) -> Self {
        Self::product(vec![Self::neg_one(), a])
    }

    pub fn recip(a: Expr) -> Self {
        Self::pow(a, Self::neg_one())
    }

    pub fn exp(arg: Expr) -> Self {
        Self::pow(Self::e(), arg)
    }

    pub fn sqrt(arg: Expr) -> Self {
        Self::pow(arg, Self::half())
    }

    /// Apply a named function. Built-in names are validated and may evaluate
    /// on the spot (`sin(0) = 0`, `log(E) = 1`); other names stay undefined.
    pub fn func(name: &str, args: Vec<Expr>) -> Self {
        crate::functions::apply(name, args)
    }

    pub fn func1(name: &str, arg: Expr) -> Self {
        Self::func(name, vec![arg])
    }

    /// Function node without evaluation.
    pub(crate) fn func_raw(name: &str, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Function {
            name: Symbol::new(name),
            args,
        })
    }

    // -------------------------------------------------------------------------
    // Structural constructs
    // -------------------------------------------------------------------------

    pub fn relation(op: RelOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Relation { op, lhs, rhs })
    }

    /// `lhs = rhs`
    pub fn equation(lhs: Expr, rhs: Expr) -> Self {
        Self::relation(RelOp::Eq, lhs, rhs)
    }

    pub fn tuple(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Tuple(items))
    }

    /// Unevaluated derivative. Orders of zero are dropped and repeated
    /// variables merged; no variables left returns the inner expression.
    pub fn derivative(inner: Expr, vars: Vec<(Symbol, u32)>) -> Self {
        let mut merged: Vec<(Symbol, u32)> = Vec::with_capacity(vars.len());
        for (v, n) in vars {
            if n == 0 {
                continue;
            }
            match merged.last_mut() {
                Some((last, count)) if *last == v => *count += n,
                _ => merged.push((v, n)),
            }
        }
        if merged.is_empty() {
            return inner;
        }
        Self::new(ExprKind::Derivative {
            inner,
            vars: merged,
        })
    }

    /// Unevaluated integral.
    pub fn integral(integrand: Expr, var: Symbol, bounds: Option<(Expr, Expr)>) -> Self {
        Self::new(ExprKind::Integral {
            integrand,
            var,
            bounds,
        })
    }
}

/// Exact `b ** e` for rationals, `None` when the result should stay a power node.
fn rational_pow(b: &Rational, e: &Rational) -> Option<Expr> {
    if b.is_zero() {
        return Some(if e.is_positive() {
            Expr::zero()
        } else {
            Expr::complex_infinity()
        });
    }
    if e.is_integer() {
        return b.checked_pow(e.to_i64()?).map(Expr::rational);
    }
    let (p, q) = e.to_i128_parts()?;
    let p = i64::try_from(p).ok()?;
    let q = i64::try_from(q).ok()?;
    let k = p.div_euclid(q);
    let r = p.rem_euclid(q);
    let whole = b.checked_pow(k)?;

    if b.is_negative() {
        if q != 2 {
            return None;
        }
        // b**(k + 1/2) = b**k * I * sqrt(|b|)
        let root = rational_pow(&b.abs(), &Rational::frac(1, 2)?)?;
        return Some(Expr::product(vec![
            Expr::rational(whole),
            Expr::imaginary_unit(),
            root,
        ]));
    }

    // (n/d)**(r/q) = (n * d**(q-1))**(r/q) / d**r
    let (n, d) = b.to_i128_parts()?;
    let n = u128::try_from(n).ok()?;
    let q32 = u32::try_from(q).ok()?;
    let radicand = n.checked_mul(d.checked_pow(q32 - 1)?)?;
    let (outside, inside) = extract_perfect_power(radicand, q32);
    let scale = Rational::from_parts(
        dashu::integer::IBig::from(outside),
        dashu::integer::UBig::from(d),
    )?
    .checked_pow(r)?;
    let coeff = &whole * &scale;
    if inside == 1 {
        return Some(Expr::rational(coeff));
    }
    let radical = Expr::new(ExprKind::Pow(
        Expr::rational(Rational::from_parts(
            dashu::integer::IBig::from(inside),
            dashu::integer::UBig::ONE,
        )?),
        Expr::rational(Rational::frac(r, q)?),
    ));
    if coeff.is_one() {
        Some(radical)
    } else {
        Some(Expr::new(ExprKind::Product(vec![
            Expr::rational(coeff),
            radical,
        ])))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_like_terms_collect() {
        let x = sym("x");
        let e = Expr::sum(vec![x.to_expr(), x.to_expr(), Expr::integer(3)]);
        assert_eq!(e.to_string(), "2*x + 3");
        assert_eq!(Expr::sub_expr(x.to_expr(), x.to_expr()), Expr::zero());
    }

    #[test]
    fn test_equal_bases_add_exponents() {
        let x = sym("x");
        let e = Expr::product(vec![x.to_expr(), x.pow(2)]);
        assert_eq!(e, x.pow(3));
        let cancel = Expr::product(vec![x.to_expr(), Expr::recip(x.to_expr())]);
        assert_eq!(cancel, Expr::one());
    }

    #[test]
    fn test_coefficient_distributes_over_single_sum() {
        let x = sym("x");
        let e = Expr::product(vec![Expr::integer(2), x.to_expr() + 1]);
        assert_eq!(e, Expr::sum(vec![x.to_expr() * 2, Expr::integer(2)]));
    }

    #[test]
    fn test_surds() {
        assert_eq!(Expr::sqrt(Expr::integer(4)), Expr::integer(2));
        assert_eq!(Expr::sqrt(Expr::integer(8)).to_string(), "2*sqrt(2)");
        assert_eq!(Expr::sqrt(Expr::frac(1, 2)).to_string(), "sqrt(2)/2");
        assert_eq!(Expr::sqrt(Expr::integer(-4)).to_string(), "2*I");
        let two_sqrt = Expr::product(vec![Expr::sqrt(Expr::integer(2)), Expr::sqrt(Expr::integer(2))]);
        assert_eq!(two_sqrt, Expr::integer(2));
    }

    #[test]
    fn test_imaginary_powers() {
        let i = Expr::imaginary_unit();
        assert_eq!(Expr::pow(i.clone(), Expr::integer(2)), Expr::neg_one());
        assert_eq!(Expr::product(vec![i.clone(), i.clone()]), Expr::neg_one());
        assert_eq!(Expr::pow(i, Expr::integer(4)), Expr::one());
    }

    #[test]
    fn test_division_by_zero_is_complex_infinity() {
        assert_eq!(
            Expr::div_expr(Expr::one(), Expr::zero()),
            Expr::complex_infinity()
        );
    }

    #[test]
    fn test_exp_of_log() {
        let x = sym("x");
        assert_eq!(Expr::exp(Expr::func1("log", x.to_expr())), x.to_expr());
    }
}
