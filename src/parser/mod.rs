//! Parser module - converts strings to AST
//!
//! Two tiers are tried in order. The permissive tier accepts natural
//! notation: implicit multiplication (`2x`, `(a)(b)`), splitting of unknown
//! multi-letter names (`xy` is `x*y`) and `^` for powers. The strict tier
//! takes names literally and requires explicit operators, which rescues
//! inputs such as `sinx` that the permissive tier rejects as ambiguous.

mod implicit_mul;
mod lexer;
mod pratt;
mod tokens;

use crate::config::SolveLimits;
use crate::error::ParseError;
use crate::functions::is_known_function;
use crate::Expr;

/// Names with parser meaning beyond the function registry
pub(crate) const CONSTRUCTS: &[&str] = &[
    "diff",
    "integrate",
    "Derivative",
    "Integral",
    "Eq",
    "Ne",
    "Lt",
    "Le",
    "Gt",
    "Ge",
    "Add",
    "Mul",
    "Pow",
    "Symbol",
    "Integer",
    "Rational",
    "Float",
    "Tuple",
    "Function",
    "Equality",
    "Unequality",
    "LessThan",
    "StrictLessThan",
    "GreaterThan",
    "StrictGreaterThan",
];

/// Names read as constants
pub(crate) const CONSTANTS: &[&str] = &["pi", "E", "I", "zoo", "oo"];

/// Whether `name(` is a call to a known function or construct
pub(crate) fn is_callable(name: &str) -> bool {
    is_known_function(name) || CONSTRUCTS.contains(&name)
}

/// Parsing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Implicit multiplication, name splitting, `^` as power
    Permissive,
    /// Explicit operators only, names taken literally
    Strict,
}

/// Parse a formula string into an expression, trying the permissive tier
/// first and the strict tier second.
///
/// # Example
/// ```
/// use symb_solve::parse;
///
/// let expr = parse("2x^2 + 3x").unwrap();
/// assert_eq!(expr.to_string(), "2*x**2 + 3*x");
/// ```
///
/// # Errors
/// Returns the strict tier's `ParseError` when neither tier accepts the input.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    parse_with_limits(input, &SolveLimits::default())
}

/// [`parse`] with explicit depth and size limits.
pub fn parse_with_limits(input: &str, limits: &SolveLimits) -> Result<Expr, ParseError> {
    match parse_tier(input, Tier::Permissive, limits) {
        Ok(expr) => Ok(expr),
        Err(permissive) => {
            tracing::debug!(%input, error = %permissive, "permissive parse failed, retrying strict");
            parse_tier(input, Tier::Strict, limits)
        }
    }
}

/// Parse with a single strategy.
pub fn parse_tier(input: &str, tier: Tier, limits: &SolveLimits) -> Result<Expr, ParseError> {
    // Pipeline: validate -> lex -> (split -> implicit_mul) -> parse
    if input.trim().is_empty() {
        return Err(ParseError::EmptyFormula);
    }

    let tokens = lexer::lex(input)?;
    let tokens = match tier {
        Tier::Permissive => {
            implicit_mul::insert_implicit_multiplication(lexer::split_identifiers(tokens)?)
        }
        Tier::Strict => tokens,
    };

    let expr = pratt::parse_expression(&tokens, limits.max_depth)?;
    if expr.node_count() > limits.max_nodes {
        return Err(ParseError::MaxNodesExceeded);
    }
    Ok(expr)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;
    use crate::sym;

    #[test]
    fn test_implicit_multiplication() {
        let x = sym("x");
        assert_eq!(parse("2x").unwrap(), x.to_expr() * 2);
        assert_eq!(parse("2(x+1)").unwrap(), (x.to_expr() + 1) * 2);
        assert_eq!(parse("xy").unwrap(), x.to_expr() * sym("y"));
        assert_eq!(parse("x^2").unwrap(), x.pow(2));
    }

    #[test]
    fn test_strict_tier_rescues_ambiguous_names() {
        assert!(parse_tier("sinx", Tier::Permissive, &SolveLimits::default()).is_err());
        assert_eq!(parse("sinx").unwrap(), Expr::symbol("sinx"));
    }

    #[test]
    fn test_strict_tier_reads_undefined_functions() {
        let strict = parse_tier("f(x)", Tier::Strict, &SolveLimits::default()).unwrap();
        assert_eq!(strict.function_name(), Some("f"));
        let permissive = parse("f(x)").unwrap();
        assert_eq!(permissive, sym("f").to_expr() * sym("x"));
    }

    #[test]
    fn test_both_tiers_failing_reports_error() {
        assert!(matches!(parse("   "), Err(ParseError::EmptyFormula)));
        assert!(parse("x + * 2").is_err());
    }

    #[test]
    fn test_limits() {
        let tight = SolveLimits::default().with_max_depth(3);
        assert!(matches!(
            parse_with_limits("((((((x))))))", &tight),
            Err(ParseError::MaxDepthExceeded)
        ));
        let small = SolveLimits::default().with_max_nodes(3);
        assert!(matches!(
            parse_with_limits("x + y + z + w", &small),
            Err(ParseError::MaxNodesExceeded)
        ));
    }
}
