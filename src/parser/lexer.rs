//! Lexer: source text to positioned tokens
//!
//! The second pass, [`split_identifiers`], only runs in the permissive tier
//! and breaks unknown multi-letter names such as `xy` into single symbols.

use crate::ast::RelOp;
use crate::display::GREEK_LETTERS;
use crate::error::{ParseError, Span};
use crate::functions::Registry;
use crate::parser::tokens::{Lexeme, Operator, Token};
use crate::parser::{CONSTANTS, is_callable};

fn greek_from_glyph(c: char) -> Option<&'static str> {
    if c == '\u{3c0}' {
        return Some("pi");
    }
    GREEK_LETTERS
        .iter()
        .find(|(_, _, glyph)| *glyph == c)
        .map(|(name, _, _)| *name)
}

/// Tokenize `input`
pub(crate) fn lex(input: &str) -> Result<Vec<Lexeme>, ParseError> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let end_of = |idx: usize| chars.get(idx).map_or(input.len(), |(p, _)| *p);
    let mut out = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let single = |tok: Token| Lexeme::new(tok, Span::new(pos, end_of(i + 1)));

        if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            while i < chars.len() && chars[i].1.is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i].1 == '.' {
                i += 1;
                while i < chars.len() && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
            }
            // exponent only when digits follow, so `2e` stays `2*e`
            if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
                let after = chars.get(i + 1).map(|(_, c)| *c);
                let after2 = chars.get(i + 2).map(|(_, c)| *c);
                let digits_follow = after.is_some_and(|c| c.is_ascii_digit())
                    || (matches!(after, Some('+' | '-'))
                        && after2.is_some_and(|c| c.is_ascii_digit()));
                if digits_follow {
                    i += 2;
                    while i < chars.len() && chars[i].1.is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let span = Span::new(pos, end_of(i));
            out.push(Lexeme::new(
                Token::Number(input[span.start..span.end].to_string()),
                span,
            ));
            continue;
        }

        // x² is x**2
        if let Some(digit) = match c {
            '\u{b2}' => Some("2"),
            '\u{b3}' => Some("3"),
            _ => None,
        } {
            let span = Span::new(pos, end_of(i + 1));
            out.push(Lexeme::new(Token::Operator(Operator::Pow), span));
            out.push(Lexeme::new(Token::Number(digit.to_string()), span));
            i += 1;
            continue;
        }

        if let Some(name) = greek_from_glyph(c) {
            out.push(single(Token::Identifier(name.to_string())));
            i += 1;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len()
                && (chars[i].1.is_alphabetic() || chars[i].1.is_ascii_digit() || chars[i].1 == '_')
            {
                if i > start && greek_from_glyph(chars[i].1).is_some() {
                    break;
                }
                i += 1;
            }
            let span = Span::new(pos, end_of(i));
            out.push(Lexeme::new(
                Token::Identifier(input[span.start..span.end].to_string()),
                span,
            ));
            continue;
        }

        if c == '\'' || c == '"' {
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].1 != c {
                i += 1;
            }
            if i >= chars.len() {
                return Err(ParseError::invalid_syntax_at(
                    "unterminated string",
                    Span::new(pos, input.len()),
                ));
            }
            let text = input[end_of(start + 1)..chars[i].0].to_string();
            i += 1;
            out.push(Lexeme::new(Token::Str(text), Span::new(pos, end_of(i))));
            continue;
        }

        let (token, width) = match (c, next) {
            ('*', Some('*')) => (Token::Operator(Operator::Pow), 2),
            ('*' | '\u{d7}' | '\u{b7}' | '\u{22c5}', _) => (Token::Operator(Operator::Mul), 1),
            ('/' | '\u{f7}', _) => (Token::Operator(Operator::Div), 1),
            ('^', _) => (Token::Operator(Operator::Pow), 1),
            ('+', _) => (Token::Operator(Operator::Add), 1),
            ('-' | '\u{2212}', _) => (Token::Operator(Operator::Sub), 1),
            ('=', Some('=')) => (Token::Relation(RelOp::Eq), 2),
            ('=', _) => (Token::Relation(RelOp::Eq), 1),
            ('!', Some('=')) => (Token::Relation(RelOp::Ne), 2),
            ('<', Some('=')) => (Token::Relation(RelOp::Le), 2),
            ('<', _) => (Token::Relation(RelOp::Lt), 1),
            ('>', Some('=')) => (Token::Relation(RelOp::Ge), 2),
            ('>', _) => (Token::Relation(RelOp::Gt), 1),
            ('\u{2264}', _) => (Token::Relation(RelOp::Le), 1),
            ('\u{2265}', _) => (Token::Relation(RelOp::Ge), 1),
            ('\u{2260}', _) => (Token::Relation(RelOp::Ne), 1),
            ('(', _) => (Token::LeftParen, 1),
            (')', _) => (Token::RightParen, 1),
            ('[', _) => (Token::LeftBracket, 1),
            (']', _) => (Token::RightBracket, 1),
            (',', _) => (Token::Comma, 1),
            _ => {
                return Err(ParseError::InvalidToken {
                    token: c.to_string(),
                    span: Some(Span::new(pos, end_of(i + 1))),
                });
            }
        };
        out.push(Lexeme::new(token, Span::new(pos, end_of(i + width))));
        i += width;
    }

    Ok(out)
}

/// Names the splitter keeps whole
fn is_protected(name: &str) -> bool {
    is_callable(name)
        || CONSTANTS.contains(&name)
        || GREEK_LETTERS.iter().any(|(n, _, _)| *n == name)
        || name.chars().count() == 1
        || !name.chars().all(|c| c.is_ascii_alphabetic())
}

/// Longest known name at the start of `rest`
fn longest_known_prefix(rest: &str) -> Option<&'static str> {
    Registry::names()
        .chain(crate::functions::ALIASES.iter().copied())
        .chain(GREEK_LETTERS.iter().map(|(n, _, _)| *n))
        .chain(["pi"])
        .filter(|n| n.len() > 1 && rest.starts_with(n))
        .max_by_key(|n| n.len())
}

/// Break unknown multi-letter identifiers into known names and single letters.
///
/// An identifier that starts with a function name and continues with more
/// letters (`sinx`) is rejected as ambiguous rather than guessed at.
pub(crate) fn split_identifiers(tokens: Vec<Lexeme>) -> Result<Vec<Lexeme>, ParseError> {
    let mut out = Vec::with_capacity(tokens.len());
    for lexeme in tokens {
        let name = match &lexeme.token {
            Token::Identifier(name) if !is_protected(name) => name.clone(),
            _ => {
                out.push(lexeme);
                continue;
            }
        };

        if let Some(head) = longest_known_prefix(&name)
            && (Registry::get(head).is_some() || crate::functions::ALIASES.contains(&head))
        {
            let rest = &name[head.len()..];
            return Err(ParseError::AmbiguousSequence {
                sequence: name.clone(),
                suggestion: format!("could be '{head}({rest})' or '{head}*{rest}'"),
                span: Some(lexeme.span),
            });
        }

        let base = lexeme.span.start;
        let mut i = 0;
        while i < name.len() {
            let rest = &name[i..];
            let piece_len = longest_known_prefix(rest).map_or(1, str::len);
            out.push(Lexeme::new(
                Token::Identifier(rest[..piece_len].to_string()),
                Span::new(base + i, base + i + piece_len),
            ));
            i += piece_len;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "Standard test relaxations")]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        lex(input).unwrap().into_iter().map(|l| l.token).collect()
    }

    #[test]
    fn test_numbers_and_exponents() {
        assert_eq!(kinds("1.5e-3"), vec![Token::Number("1.5e-3".into())]);
        assert_eq!(
            kinds("2e"),
            vec![Token::Number("2".into()), Token::Identifier("e".into())]
        );
        assert_eq!(kinds(".5"), vec![Token::Number(".5".into())]);
    }

    #[test]
    fn test_operators_and_relations() {
        assert_eq!(
            kinds("x**2 <= 3"),
            vec![
                Token::Identifier("x".into()),
                Token::Operator(Operator::Pow),
                Token::Number("2".into()),
                Token::Relation(RelOp::Le),
                Token::Number("3".into()),
            ]
        );
        assert_eq!(kinds("x^2")[1], Token::Operator(Operator::Pow));
        assert_eq!(kinds("a == b")[1], Token::Relation(RelOp::Eq));
    }

    #[test]
    fn test_unicode_input() {
        assert_eq!(
            kinds("2\u{3c0} \u{2212} \u{3b1}"),
            vec![
                Token::Number("2".into()),
                Token::Identifier("pi".into()),
                Token::Operator(Operator::Sub),
                Token::Identifier("alpha".into()),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(kinds("Symbol('x')")[2], Token::Str("x".into()));
        assert!(lex("Symbol('x)").is_err());
    }

    #[test]
    fn test_split_identifiers() {
        let split = split_identifiers(lex("xy + alphax").unwrap()).unwrap();
        let names: Vec<Token> = split.into_iter().map(|l| l.token).collect();
        assert_eq!(
            names,
            vec![
                Token::Identifier("x".into()),
                Token::Identifier("y".into()),
                Token::Operator(Operator::Add),
                Token::Identifier("alpha".into()),
                Token::Identifier("x".into()),
            ]
        );
    }

    #[test]
    fn test_function_prefix_is_ambiguous() {
        let err = split_identifiers(lex("sinx").unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::AmbiguousSequence { .. }));
    }

    #[test]
    fn test_invalid_character() {
        assert!(matches!(
            lex("x $ y"),
            Err(ParseError::InvalidToken { .. })
        ));
    }
}
