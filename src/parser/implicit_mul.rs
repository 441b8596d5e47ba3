//! Implicit multiplication insertion for natural notation
//!
//! Inserts `*` operators between tokens where multiplication is implied, e.g. `2x` → `2 * x`.

use crate::parser::is_callable;
use crate::parser::tokens::{Lexeme, Operator, Token};

/// Whether `name(` is a call rather than `name * (`
fn is_call_head(name: &str) -> bool {
    is_callable(name) || (name.chars().count() > 1 && !name.chars().all(char::is_alphabetic))
}

/// Check if implicit multiplication should be inserted between two tokens
fn should_insert_mul(current: &Token, next: &Token) -> bool {
    match (current, next) {
        // f(x) with an unknown single-letter f is f*x
        (Token::Identifier(name), Token::LeftParen) => !is_call_head(name),

        // A function name never multiplies what follows it
        (Token::Identifier(name), _) if is_callable(name) => false,

        // Number * Identifier: 2x
        // Number * (: 2(x)
        // Identifier * Identifier: xy
        // Identifier * Number: x2
        // ) * Identifier: )x
        // ) * Number: )2
        // ) * (: )(
        (
            Token::Number(_) | Token::Identifier(_) | Token::RightParen | Token::RightBracket,
            Token::Identifier(_) | Token::Number(_),
        )
        | (Token::Number(_) | Token::RightParen | Token::RightBracket, Token::LeftParen) => {
            !matches!((current, next), (Token::Number(_), Token::Number(_)))
        }

        _ => false,
    }
}

/// `Function('f')` heads a call: `Function('f')(x)` must not become a product.
fn closes_function_head(tokens: &[Lexeme], idx: usize) -> bool {
    idx >= 3
        && matches!(&tokens[idx - 3].token, Token::Identifier(n) if n == "Function")
        && tokens[idx - 2].token == Token::LeftParen
        && matches!(tokens[idx - 1].token, Token::Str(_))
}

/// Insert implicit multiplication operators between appropriate tokens
///
/// Rules:
/// - Number * Identifier: `2 x` → `2 * x`
/// - Identifier * Identifier: `a x` → `a * x`
/// - ) * Identifier/Number/(: `(a) x` → `(a) * x`
/// - Number * (: `2 (y)` → `2 * (y)`
/// - Unknown single letter * (: `f(x)` → `f * (x)`
///
/// Exception: a known function or construct followed by ( is a call
pub(crate) fn insert_implicit_multiplication(tokens: Vec<Lexeme>) -> Vec<Lexeme> {
    let needs_insertion = tokens
        .windows(2)
        .enumerate()
        .any(|(i, w)| should_insert_mul(&w[0].token, &w[1].token) && !closes_function_head(&tokens, i));

    if !needs_insertion {
        return tokens;
    }

    let mut result = Vec::with_capacity(tokens.len() * 3 / 2);
    for (i, lexeme) in tokens.iter().enumerate() {
        result.push(lexeme.clone());
        if let Some(next) = tokens.get(i + 1)
            && should_insert_mul(&lexeme.token, &next.token)
            && !closes_function_head(&tokens, i)
        {
            result.push(Lexeme::new(Token::Operator(Operator::Mul), lexeme.span));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Span;

    fn lexemes(tokens: Vec<Token>) -> Vec<Lexeme> {
        tokens
            .into_iter()
            .map(|t| Lexeme::new(t, Span::default()))
            .collect()
    }

    fn count_muls(tokens: &[Lexeme]) -> usize {
        tokens
            .iter()
            .filter(|l| l.token == Token::Operator(Operator::Mul))
            .count()
    }

    #[test]
    fn test_number_identifier() {
        let tokens = lexemes(vec![Token::Number("2".into()), Token::Identifier("x".into())]);
        let result = insert_implicit_multiplication(tokens);
        assert_eq!(result.len(), 3);
        assert_eq!(result[1].token, Token::Operator(Operator::Mul));
    }

    #[test]
    fn test_paren_paren() {
        let tokens = lexemes(vec![
            Token::RightParen,
            Token::LeftParen,
        ]);
        assert_eq!(count_muls(&insert_implicit_multiplication(tokens)), 1);
    }

    #[test]
    fn test_function_no_multiplication() {
        let tokens = lexemes(vec![Token::Identifier("sin".into()), Token::LeftParen]);
        let result = insert_implicit_multiplication(tokens);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_unknown_letter_before_paren_multiplies() {
        let tokens = lexemes(vec![Token::Identifier("f".into()), Token::LeftParen]);
        assert_eq!(count_muls(&insert_implicit_multiplication(tokens)), 1);
    }

    #[test]
    fn test_function_head_is_a_call() {
        let tokens = lexemes(vec![
            Token::Identifier("Function".into()),
            Token::LeftParen,
            Token::Str("f".into()),
            Token::RightParen,
            Token::LeftParen,
            Token::Identifier("x".into()),
            Token::RightParen,
        ]);
        assert_eq!(count_muls(&insert_implicit_multiplication(tokens)), 0);
    }

    #[test]
    fn test_number_function() {
        let tokens = lexemes(vec![Token::Number("4".into()), Token::Identifier("sin".into())]);
        assert_eq!(count_muls(&insert_implicit_multiplication(tokens)), 1);
    }
}
