use crate::Expr;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::OnceLock;

/// How a function name is typeset in LaTeX
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LatexStyle {
    /// A dedicated command such as `\sin`
    Command(&'static str),
    /// `\operatorname{name}`
    Operator(&'static str),
    /// `\left|{x}\right|`
    Abs,
}

/// Definition of a named function: evaluation, exact values and differentiation
#[derive(Clone)]
pub(crate) struct FunctionDefinition {
    /// Canonical name of the function (e.g., "sin", "log")
    pub name: &'static str,

    /// Acceptable argument count (arity)
    pub arity: RangeInclusive<usize>,

    /// Numerical evaluation
    pub eval: fn(&[f64]) -> Option<f64>,

    /// Exact value at special arguments (`sin(pi) = 0`), applied on construction
    pub exact: fn(&[Expr]) -> Option<Expr>,

    /// Symbolic differentiation
    /// Arguments: (args of the function call, derivatives of the arguments)
    /// Returns the total derivative dA/dx = sum( (dA/d_arg_i) * (d_arg_i/dx) )
    pub derivative: fn(&[Expr], &[Expr]) -> Expr,

    pub latex: LatexStyle,
}

impl FunctionDefinition {
    pub(crate) fn validate_arity(&self, args: usize) -> bool {
        self.arity.contains(&args)
    }
}

static REGISTRY: OnceLock<HashMap<&'static str, FunctionDefinition>> = OnceLock::new();

fn init_registry() -> HashMap<&'static str, FunctionDefinition> {
    let defs = crate::functions::definitions::all_definitions();
    let mut map = HashMap::with_capacity(defs.len());
    for def in defs {
        map.insert(def.name, def);
    }
    map
}

/// Central registry for getting function definitions
pub(crate) struct Registry;

impl Registry {
    /// Get a function definition by name - O(1) HashMap lookup
    pub(crate) fn get(name: &str) -> Option<&'static FunctionDefinition> {
        REGISTRY.get_or_init(init_registry).get(name)
    }

    /// Names the parser treats as function heads.
    pub(crate) fn names() -> impl Iterator<Item = &'static str> {
        REGISTRY.get_or_init(init_registry).keys().copied()
    }
}
