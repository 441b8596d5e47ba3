//! Display implementations for expressions.
//!
//! This module provides three output formats:
//!
//! ## Plain (`to_string()` / `{}`)
//! Python-flavoured algebra text: `x**3/3`, `2*x + 1`, `exp(x)`, `sqrt(2)`, `Eq(x, 1)`.
//!
//! ## LaTeX (`to_latex()`)
//! Display-ready markup: `\frac{x^{3}}{3}`, `3 x^{2}`, `\sin{\left(x \right)}`.
//!
//! ## Canonical serialized form (`to_srepr()`)
//! A fully parenthesized constructor encoding, e.g.
//! `Add(Pow(Symbol('x'), Integer(2)), Integer(-4))`. The parser reads it back
//! to an equal expression, which makes it a stable classifier input.
//!
//! Sums print by descending degree with constant terms last; products print
//! numeric coefficient first, then constants, symbols and function factors,
//! with negative powers moved into a denominator.

use std::fmt;

use crate::ast::{Constant, Expr, ExprKind, RelOp, expr_cmp};
use crate::functions::{LatexStyle, Registry};
use crate::number::Numeric;
use crate::symbol::Symbol;

/// Greek letter names with their LaTeX command and Unicode glyph.
pub(crate) static GREEK_LETTERS: &[(&str, &str, char)] = &[
    ("alpha", r"\alpha", '\u{3b1}'),
    ("beta", r"\beta", '\u{3b2}'),
    ("gamma", r"\gamma", '\u{3b3}'),
    ("delta", r"\delta", '\u{3b4}'),
    ("epsilon", r"\epsilon", '\u{3b5}'),
    ("zeta", r"\zeta", '\u{3b6}'),
    ("eta", r"\eta", '\u{3b7}'),
    ("theta", r"\theta", '\u{3b8}'),
    ("iota", r"\iota", '\u{3b9}'),
    ("kappa", r"\kappa", '\u{3ba}'),
    ("lambda", r"\lambda", '\u{3bb}'),
    ("mu", r"\mu", '\u{3bc}'),
    ("nu", r"\nu", '\u{3bd}'),
    ("xi", r"\xi", '\u{3be}'),
    ("rho", r"\rho", '\u{3c1}'),
    ("sigma", r"\sigma", '\u{3c3}'),
    ("tau", r"\tau", '\u{3c4}'),
    ("upsilon", r"\upsilon", '\u{3c5}'),
    ("phi", r"\phi", '\u{3c6}'),
    ("chi", r"\chi", '\u{3c7}'),
    ("psi", r"\psi", '\u{3c8}'),
    ("omega", r"\omega", '\u{3c9}'),
];

/// Map symbol name to Greek letter (LaTeX format)
fn greek_to_latex(name: &str) -> Option<&'static str> {
    GREEK_LETTERS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, latex, _)| *latex)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FormatMode {
    Plain,
    Latex,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self, FormatMode::Plain))
    }
}

impl Expr {
    /// Render as LaTeX.
    pub fn to_latex(&self) -> String {
        render(self, FormatMode::Latex)
    }

    /// Render in the canonical serialized form.
    pub fn to_srepr(&self) -> String {
        srepr(self)
    }
}

/// `\left[ a, \  b\right]`
pub fn latex_list(items: &[Expr]) -> String {
    let inner: Vec<String> = items.iter().map(Expr::to_latex).collect();
    join_latex_seq(r"\left[ ", &inner, r"\right]")
}

/// `\left( a, \  b\right)`
pub fn latex_tuple(items: &[Expr]) -> String {
    let inner: Vec<String> = items.iter().map(Expr::to_latex).collect();
    if inner.len() == 1 {
        return format!(r"\left( {},\right)", inner[0]);
    }
    join_latex_seq(r"\left( ", &inner, r"\right)")
}

fn join_latex_seq(open: &str, items: &[String], close: &str) -> String {
    if items.is_empty() {
        return format!("{}{}", open.trim_end(), close);
    }
    format!("{open}{}{close}", items.join(r", \  "))
}

/// `\left[\begin{matrix}a & b\\c & d\end{matrix}\right]`
pub fn latex_matrix(rows: &[Vec<Expr>]) -> String {
    let body: Vec<String> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(Expr::to_latex)
                .collect::<Vec<_>>()
                .join(" & ")
        })
        .collect();
    format!(
        r"\left[\begin{{matrix}}{}\end{{matrix}}\right]",
        body.join(r"\\")
    )
}

/// Plain rendering of a matrix: `[[2, 0], [0, 2]]`
pub fn plain_matrix(rows: &[Vec<Expr>]) -> String {
    let body: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(Expr::to_string).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", body.join(", "))
}

/// Floats print with a trailing `.0` when integral so they stay visibly approximate.
pub(crate) fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn render(e: &Expr, mode: FormatMode) -> String {
    match e.kind() {
        ExprKind::Number(r) => {
            if r.is_integer() {
                r.to_string()
            } else if mode == FormatMode::Latex {
                let sign = if r.is_negative() { "- " } else { "" };
                let abs = r.abs();
                format!(r"{sign}\frac{{{}}}{{{}}}", abs.numer(), abs.denom())
            } else {
                r.to_string()
            }
        }
        ExprKind::Float(v) => format_float(v.0),
        ExprKind::Constant(c) => constant_name(*c, mode).to_string(),
        ExprKind::Symbol(s) => render_symbol(s, mode),
        ExprKind::Sum(terms) => render_sum(terms, mode),
        ExprKind::Product(_) => render_product(e, mode),
        ExprKind::Pow(b, x) => render_pow(b, x, mode),
        ExprKind::Function { name, args } => render_function(name.name(), args, mode),
        ExprKind::Derivative { inner, vars } => render_derivative(inner, vars, mode),
        ExprKind::Integral {
            integrand,
            var,
            bounds,
        } => render_integral(integrand, var, bounds.as_ref(), mode),
        ExprKind::Relation { op, lhs, rhs } => render_relation(*op, lhs, rhs, mode),
        ExprKind::Tuple(items) => match mode {
            FormatMode::Latex => latex_tuple(items),
            FormatMode::Plain => {
                let inner: Vec<String> = items.iter().map(Expr::to_string).collect();
                if inner.len() == 1 {
                    format!("({},)", inner[0])
                } else {
                    format!("({})", inner.join(", "))
                }
            }
        },
    }
}

fn constant_name(c: Constant, mode: FormatMode) -> &'static str {
    match (c, mode) {
        (Constant::Pi, FormatMode::Plain) => "pi",
        (Constant::Pi, FormatMode::Latex) => r"\pi",
        (Constant::E, FormatMode::Plain) => "E",
        (Constant::E, FormatMode::Latex) => "e",
        (Constant::I, FormatMode::Plain) => "I",
        (Constant::I, FormatMode::Latex) => "i",
        (Constant::ComplexInfinity, FormatMode::Plain) => "zoo",
        (Constant::ComplexInfinity, FormatMode::Latex) => r"\tilde{\infty}",
    }
}

fn render_symbol(s: &Symbol, mode: FormatMode) -> String {
    let name = s.name();
    if mode == FormatMode::Plain {
        return name.to_string();
    }
    if let Some(greek) = greek_to_latex(name) {
        return greek.to_string();
    }
    if let Some((head, sub)) = name.split_once('_')
        && !head.is_empty()
        && !sub.is_empty()
    {
        let head = greek_to_latex(head).unwrap_or(head);
        return format!("{head}_{{{sub}}}");
    }
    let digits_at = name.find(|c: char| c.is_ascii_digit());
    match digits_at {
        Some(pos) if pos > 0 && name[pos..].chars().all(|c| c.is_ascii_digit()) => {
            let head = greek_to_latex(&name[..pos]).unwrap_or(&name[..pos]);
            format!("{head}_{{{}}}", &name[pos..])
        }
        _ => name.to_string(),
    }
}

fn parens(s: &str, mode: FormatMode) -> String {
    match mode {
        FormatMode::Plain => format!("({s})"),
        FormatMode::Latex => format!(r"\left({s}\right)"),
    }
}

/// Rough polynomial degree used only for print ordering.
fn print_degree(e: &Expr) -> f64 {
    match e.kind() {
        ExprKind::Symbol(_) => 1.0,
        ExprKind::Pow(b, x) => match x.as_numeric() {
            Some(n) => print_degree(b) * n.to_f64(),
            None => 0.0,
        },
        ExprKind::Product(fs) => fs.iter().map(print_degree).sum(),
        ExprKind::Sum(ts) => ts.iter().map(print_degree).fold(0.0, f64::max),
        _ => 0.0,
    }
}

/// Terms of a sum in print order: descending degree, constant terms last.
pub(crate) fn print_order(terms: &[Expr]) -> Vec<Expr> {
    let mut v = terms.to_vec();
    v.sort_by(|a, b| {
        let ca = a.free_symbols().is_empty();
        let cb = b.free_symbols().is_empty();
        ca.cmp(&cb)
            .then_with(|| print_degree(b).total_cmp(&print_degree(a)))
            .then_with(|| expr_cmp(&a.as_coeff_mul().1, &b.as_coeff_mul().1))
    });
    v
}

fn render_sum(terms: &[Expr], mode: FormatMode) -> String {
    let mut out = String::new();
    for (i, t) in print_order(terms).iter().enumerate() {
        let negative = t.has_negative_coefficient();
        let body = if negative {
            render(&Expr::negate(t.clone()), mode)
        } else {
            render(t, mode)
        };
        if i == 0 {
            if negative {
                out.push_str(if mode == FormatMode::Latex { "- " } else { "-" });
            }
        } else {
            out.push_str(if negative { " - " } else { " + " });
        }
        out.push_str(&body);
    }
    out
}

fn factor_rank(f: &Expr) -> u8 {
    let (base, _) = f.as_base_exp();
    match base.kind() {
        ExprKind::Number(_) | ExprKind::Float(_) => 0,
        ExprKind::Constant(Constant::E) => 3,
        ExprKind::Constant(_) => 1,
        ExprKind::Symbol(_) => 2,
        ExprKind::Function { .. } => 3,
        _ => 4,
    }
}

/// Factor string inside a product; sums get parentheses.
fn product_operand(f: &Expr, mode: FormatMode) -> String {
    let s = render(f, mode);
    match f.kind() {
        ExprKind::Sum(_) | ExprKind::Relation { .. } => parens(&s, mode),
        _ => s,
    }
}

fn render_product(e: &Expr, mode: FormatMode) -> String {
    let (coeff, rest) = e.as_coeff_mul();
    let negative = coeff.is_negative();
    let coeff = if negative { coeff.neg() } else { coeff };

    let mut numer: Vec<String> = Vec::new();
    let mut denom: Vec<String> = Vec::new();
    match &coeff {
        Numeric::Exact(r) => {
            if !r.numer().to_string().eq("1") {
                numer.push(r.numer().to_string());
            }
            if !r.is_integer() {
                denom.push(r.denom().to_string());
            }
        }
        Numeric::Approx(v) => numer.push(format_float(*v)),
    }

    let mut factors = match rest.kind() {
        ExprKind::Product(fs) => fs.clone(),
        _ if rest.is_one() => Vec::new(),
        _ => vec![rest.clone()],
    };
    factors.sort_by(|a, b| factor_rank(a).cmp(&factor_rank(b)).then_with(|| expr_cmp(a, b)));

    for f in &factors {
        if let ExprKind::Pow(b, x) = f.kind()
            && let Some(r) = x.as_rational()
            && r.is_negative()
            && !b.is_constant(Constant::E)
        {
            let flipped = Expr::pow(b.clone(), Expr::rational(-r));
            denom.push(product_operand(&flipped, mode));
        } else {
            numer.push(product_operand(f, mode));
        }
    }

    let sign = match (negative, mode) {
        (false, _) => "",
        (true, FormatMode::Plain) => "-",
        (true, FormatMode::Latex) => "- ",
    };
    match mode {
        FormatMode::Plain => {
            let num = if numer.is_empty() {
                "1".to_string()
            } else {
                numer.join("*")
            };
            if denom.is_empty() {
                format!("{sign}{num}")
            } else if denom.len() == 1 {
                format!("{sign}{num}/{}", denom[0])
            } else {
                format!("{sign}{num}/({})", denom.join("*"))
            }
        }
        FormatMode::Latex => {
            let num = if numer.is_empty() {
                "1".to_string()
            } else {
                numer.join(" ")
            };
            if denom.is_empty() {
                format!("{sign}{num}")
            } else {
                format!(r"{sign}\frac{{{num}}}{{{}}}", denom.join(" "))
            }
        }
    }
}

fn needs_parens_as_base(b: &Expr) -> bool {
    match b.kind() {
        ExprKind::Sum(_)
        | ExprKind::Product(_)
        | ExprKind::Pow(..)
        | ExprKind::Relation { .. } => true,
        ExprKind::Number(r) => r.is_negative() || !r.is_integer(),
        ExprKind::Float(v) => v.0 < 0.0,
        _ => false,
    }
}

fn plain_exponent(x: &Expr) -> String {
    let s = x.to_string();
    match x.kind() {
        ExprKind::Symbol(_) | ExprKind::Constant(_) => s,
        ExprKind::Number(r) if r.is_integer() && !r.is_negative() => s,
        ExprKind::Float(v) if v.0 >= 0.0 => s,
        _ => format!("({s})"),
    }
}

fn render_pow(b: &Expr, x: &Expr, mode: FormatMode) -> String {
    if b.is_constant(Constant::E) {
        return match mode {
            FormatMode::Plain => format!("exp({x})"),
            FormatMode::Latex => format!("e^{{{}}}", x.to_latex()),
        };
    }
    let base = render(b, mode);
    if let Some(r) = x.as_rational() {
        let half = r.numer().to_string() == "1" && r.denom().to_string() == "2";
        let neg_half = r.numer().to_string() == "-1" && r.denom().to_string() == "2";
        match mode {
            FormatMode::Plain => {
                if half {
                    return format!("sqrt({base})");
                }
                if neg_half {
                    return format!("1/sqrt({base})");
                }
                if r.to_i64() == Some(-1) {
                    let base = if needs_parens_as_base(b) {
                        parens(&base, mode)
                    } else {
                        base
                    };
                    return format!("1/{base}");
                }
            }
            FormatMode::Latex => {
                if half {
                    return format!(r"\sqrt{{{base}}}");
                }
                if r.is_negative() {
                    let flipped = if r.to_i64() == Some(-1) {
                        base
                    } else {
                        render_pow(b, &Expr::rational(-r), mode)
                    };
                    return format!(r"\frac{{1}}{{{flipped}}}");
                }
                if r.numer().to_string() == "1" && !r.is_integer() {
                    return format!(r"\sqrt[{}]{{{base}}}", r.denom());
                }
            }
        }
    }
    match mode {
        FormatMode::Plain => {
            let base = if needs_parens_as_base(b) {
                parens(&base, mode)
            } else {
                base
            };
            format!("{base}**{}", plain_exponent(x))
        }
        FormatMode::Latex => {
            if let ExprKind::Function { name, args } = b.kind()
                && let Some(def) = Registry::get(name.name())
                && let LatexStyle::Command(cmd) = def.latex
                && x.as_rational().is_some_and(|r| r.is_integer() && r.is_positive())
            {
                return format!(r"{cmd}^{{{}}}{{\left({} \right)}}", x.to_latex(), latex_args(args));
            }
            let base = if needs_parens_as_base(b) {
                parens(&base, mode)
            } else {
                base
            };
            format!("{base}^{{{}}}", x.to_latex())
        }
    }
}

fn latex_args(args: &[Expr]) -> String {
    args.iter()
        .map(Expr::to_latex)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_function(name: &str, args: &[Expr], mode: FormatMode) -> String {
    if mode == FormatMode::Plain {
        let inner: Vec<String> = args.iter().map(Expr::to_string).collect();
        return format!("{name}({})", inner.join(", "));
    }
    let inner = latex_args(args);
    match Registry::get(name).map(|d| d.latex) {
        Some(LatexStyle::Command(cmd)) => format!(r"{cmd}{{\left({inner} \right)}}"),
        Some(LatexStyle::Operator(op)) => {
            format!(r"\operatorname{{{op}}}{{\left({inner} \right)}}")
        }
        Some(LatexStyle::Abs) => format!(r"\left|{{{inner}}}\right|"),
        None => {
            let head = render_symbol(&Symbol::new(name), mode);
            format!(r"{head}{{\left({inner} \right)}}")
        }
    }
}

fn render_derivative(inner: &Expr, vars: &[(Symbol, u32)], mode: FormatMode) -> String {
    if mode == FormatMode::Plain {
        let specs: Vec<String> = vars
            .iter()
            .map(|(v, n)| {
                if *n == 1 {
                    v.to_string()
                } else {
                    format!("({v}, {n})")
                }
            })
            .collect();
        return format!("Derivative({inner}, {})", specs.join(", "));
    }
    let order: u32 = vars.iter().map(|(_, n)| n).sum();
    let body = match inner.kind() {
        ExprKind::Sum(_) => parens(&inner.to_latex(), mode),
        _ => inner.to_latex(),
    };
    let ordinary = vars.len() == 1 && inner.free_symbols().len() <= 1;
    let (d, sep) = if ordinary { ("d", " ") } else { (r"\partial", " ") };
    let top = if order == 1 {
        d.to_string()
    } else {
        format!("{d}^{{{order}}}")
    };
    let bottom: String = vars
        .iter()
        .map(|(v, n)| {
            let v = render_symbol(v, mode);
            if *n == 1 {
                format!("{d}{sep}{v}")
            } else {
                format!("{d}{sep}{v}^{{{n}}}")
            }
        })
        .collect();
    format!(r"\frac{{{top}}}{{{bottom}}} {body}")
}

fn render_integral(
    integrand: &Expr,
    var: &Symbol,
    bounds: Option<&(Expr, Expr)>,
    mode: FormatMode,
) -> String {
    match mode {
        FormatMode::Plain => match bounds {
            Some((lo, hi)) => format!("Integral({integrand}, ({var}, {lo}, {hi}))"),
            None => format!("Integral({integrand}, {var})"),
        },
        FormatMode::Latex => {
            let body = match integrand.kind() {
                ExprKind::Sum(_) => parens(&integrand.to_latex(), mode),
                _ => integrand.to_latex(),
            };
            let v = render_symbol(var, mode);
            match bounds {
                Some((lo, hi)) => format!(
                    r"\int\limits_{{{}}}^{{{}}} {body}\, d{v}",
                    lo.to_latex(),
                    hi.to_latex()
                ),
                None => format!(r"\int {body}\, d{v}"),
            }
        }
    }
}

fn render_relation(op: RelOp, lhs: &Expr, rhs: &Expr, mode: FormatMode) -> String {
    let (l, r) = (render(lhs, mode), render(rhs, mode));
    match mode {
        FormatMode::Plain => match op {
            RelOp::Eq => format!("Eq({l}, {r})"),
            RelOp::Ne => format!("Ne({l}, {r})"),
            RelOp::Lt => format!("{l} < {r}"),
            RelOp::Le => format!("{l} <= {r}"),
            RelOp::Gt => format!("{l} > {r}"),
            RelOp::Ge => format!("{l} >= {r}"),
        },
        FormatMode::Latex => {
            let sym = match op {
                RelOp::Eq => "=",
                RelOp::Ne => r"\neq",
                RelOp::Lt => "<",
                RelOp::Le => r"\leq",
                RelOp::Gt => ">",
                RelOp::Ge => r"\geq",
            };
            format!("{l} {sym} {r}")
        }
    }
}

// =============================================================================
// CANONICAL SERIALIZED FORM
// =============================================================================

pub(crate) fn relation_constructor(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => "Equality",
        RelOp::Ne => "Unequality",
        RelOp::Lt => "StrictLessThan",
        RelOp::Le => "LessThan",
        RelOp::Gt => "StrictGreaterThan",
        RelOp::Ge => "GreaterThan",
    }
}

fn srepr_args(items: &[Expr]) -> String {
    items.iter().map(srepr).collect::<Vec<_>>().join(", ")
}

fn srepr_symbol(s: &Symbol) -> String {
    format!("Symbol('{}')", s.name())
}

fn srepr(e: &Expr) -> String {
    match e.kind() {
        ExprKind::Number(r) => {
            if r.is_integer() {
                format!("Integer({})", r.numer())
            } else {
                format!("Rational({}, {})", r.numer(), r.denom())
            }
        }
        ExprKind::Float(v) => format!("Float('{:?}', precision=53)", v.0),
        ExprKind::Constant(c) => constant_name(*c, FormatMode::Plain).to_string(),
        ExprKind::Symbol(s) => srepr_symbol(s),
        ExprKind::Sum(terms) => format!("Add({})", srepr_args(terms)),
        ExprKind::Product(factors) => format!("Mul({})", srepr_args(factors)),
        ExprKind::Pow(b, x) => {
            if b.is_constant(Constant::E) {
                format!("exp({})", srepr(x))
            } else {
                format!("Pow({}, {})", srepr(b), srepr(x))
            }
        }
        ExprKind::Function { name, args } => {
            if Registry::get(name.name()).is_some() {
                format!("{}({})", name.name(), srepr_args(args))
            } else {
                format!("Function('{}')({})", name.name(), srepr_args(args))
            }
        }
        ExprKind::Derivative { inner, vars } => {
            let specs: Vec<String> = vars
                .iter()
                .map(|(v, n)| format!("Tuple({}, Integer({n}))", srepr_symbol(v)))
                .collect();
            format!("Derivative({}, {})", srepr(inner), specs.join(", "))
        }
        ExprKind::Integral {
            integrand,
            var,
            bounds,
        } => {
            let spec = match bounds {
                Some((lo, hi)) => format!("Tuple({}, {}, {})", srepr_symbol(var), srepr(lo), srepr(hi)),
                None => format!("Tuple({})", srepr_symbol(var)),
            };
            format!("Integral({}, {spec})", srepr(integrand))
        }
        ExprKind::Relation { op, lhs, rhs } => {
            format!("{}({}, {})", relation_constructor(*op), srepr(lhs), srepr(rhs))
        }
        ExprKind::Tuple(items) => format!("Tuple({})", srepr_args(items)),
    }
}
