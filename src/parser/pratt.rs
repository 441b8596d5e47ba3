use crate::ast::{ExprKind, RelOp};
use crate::error::{ParseError, Span};
use crate::functions::{ALIASES, Registry};
use crate::number::Rational;
use crate::parser::is_callable;
use crate::parser::tokens::{Lexeme, Operator, Token};
use crate::symbol::Symbol;
use crate::Expr;

/// Unary sign binds looser than `**` and tighter than `*`, so `-x**2` is `-(x**2)`
const UNARY_PRECEDENCE: u8 = 25;

/// Parse tokens into an AST using Pratt parsing algorithm
pub(crate) fn parse_expression(tokens: &[Lexeme], max_depth: usize) -> Result<Expr, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::UnexpectedEndOfInput);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };

    let (items, trailing_comma) = parser.parse_items()?;
    if let Some(extra) = parser.current() {
        return Err(parser.unexpected("end of input", extra));
    }
    Ok(into_group(items, trailing_comma))
}

/// A parenthesised or top-level comma list becomes a tuple; a lone item stays itself
fn into_group(mut items: Vec<Expr>, had_comma: bool) -> Expr {
    if items.len() == 1 && !had_comma {
        items.remove(0)
    } else {
        Expr::tuple(items)
    }
}

enum Arg {
    Expr(Expr),
    Str(String),
    Keyword,
}

struct Parser<'a> {
    tokens: &'a [Lexeme],
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Lexeme> {
        self.tokens.get(self.pos)
    }

    fn current_token(&self) -> Option<&'a Token> {
        self.current().map(|l| &l.token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn unexpected(&self, expected: &str, got: &Lexeme) -> ParseError {
        ParseError::unexpected(expected, got.token.to_user_string(), got.span)
    }

    fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        match self.current() {
            Some(l) if l.token == *token => {
                self.advance();
                Ok(())
            }
            Some(l) => Err(self.unexpected(&token.to_user_string(), l)),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    /// Comma-separated relations up to a closing bracket or the end.
    /// Returns the items and whether any comma was seen.
    fn parse_items(&mut self) -> Result<(Vec<Expr>, bool), ParseError> {
        let mut items = vec![self.parse_relation()?];
        let mut had_comma = false;
        while let Some(Token::Comma) = self.current_token() {
            self.advance();
            had_comma = true;
            match self.current_token() {
                None | Some(Token::RightParen | Token::RightBracket) => break,
                _ => items.push(self.parse_relation()?),
            }
        }
        Ok((items, had_comma))
    }

    fn parse_relation(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_expr(0)?;
        let Some(Token::Relation(op)) = self.current_token() else {
            return Ok(left);
        };
        let op = *op;
        self.advance();
        let right = self.parse_expr(0)?;
        if let Some(l) = self.current()
            && matches!(l.token, Token::Relation(_))
        {
            return Err(ParseError::invalid_syntax_at(
                "chained relations are not supported",
                l.span,
            ));
        }
        Ok(Expr::relation(op, left, right))
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::MaxDepthExceeded);
        }

        // Parse left side (prefix)
        let mut left = self.parse_prefix()?;

        // Parse operators and right side (infix)
        while let Some(Token::Operator(op)) = self.current_token() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            let op = *op;
            self.advance();

            // Right associative for power, left for others
            let next_precedence = if op == Operator::Pow {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_expr(next_precedence)?;

            left = match op {
                Operator::Add => Expr::sum(vec![left, right]),
                Operator::Sub => Expr::sub_expr(left, right),
                Operator::Mul => Expr::product(vec![left, right]),
                Operator::Div => Expr::div_expr(left, right),
                Operator::Pow => Expr::pow(left, right),
            };
        }

        self.depth -= 1;
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let lexeme = self.current().ok_or(ParseError::UnexpectedEndOfInput)?;

        match &lexeme.token {
            Token::Number(text) => {
                self.advance();
                Rational::parse_decimal(text)
                    .map(Expr::rational)
                    .ok_or_else(|| ParseError::InvalidNumber {
                        value: text.clone(),
                        span: Some(lexeme.span),
                    })
            }

            Token::Identifier(name) => {
                self.advance();
                if let Some(Token::LeftParen) = self.current_token() {
                    self.parse_call(name, lexeme.span)
                } else {
                    atom(name, lexeme.span)
                }
            }

            Token::Operator(Operator::Sub) => {
                self.advance();
                Ok(Expr::negate(self.parse_expr(UNARY_PRECEDENCE)?))
            }

            Token::Operator(Operator::Add) => {
                self.advance();
                self.parse_expr(UNARY_PRECEDENCE)
            }

            Token::LeftParen => {
                self.advance();
                if let Some(Token::RightParen) = self.current_token() {
                    return Err(ParseError::invalid_syntax_at(
                        "empty parentheses",
                        lexeme.span,
                    ));
                }
                let (items, had_comma) = self.parse_items()?;
                self.expect(&Token::RightParen)?;
                Ok(into_group(items, had_comma))
            }

            Token::LeftBracket => {
                self.advance();
                if let Some(Token::RightBracket) = self.current_token() {
                    self.advance();
                    return Ok(Expr::tuple(Vec::new()));
                }
                let (items, _) = self.parse_items()?;
                self.expect(&Token::RightBracket)?;
                Ok(Expr::tuple(items))
            }

            _ => Err(ParseError::InvalidToken {
                token: lexeme.token.to_user_string(),
                span: Some(lexeme.span),
            }),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Arg>, ParseError> {
        self.expect(&Token::LeftParen)?;
        let mut args = Vec::new();

        if let Some(Token::RightParen) = self.current_token() {
            self.advance();
            return Ok(args); // Empty argument list
        }

        loop {
            match (self.current_token(), self.tokens.get(self.pos + 1).map(|l| &l.token)) {
                (Some(Token::Str(s)), _) => {
                    args.push(Arg::Str(s.clone()));
                    self.advance();
                }
                // keyword arguments such as precision=53 carry no meaning here
                (Some(Token::Identifier(_)), Some(Token::Relation(RelOp::Eq))) => {
                    self.advance();
                    self.advance();
                    self.parse_relation()?;
                    args.push(Arg::Keyword);
                }
                _ => args.push(Arg::Expr(self.parse_relation()?)),
            }

            match self.current() {
                Some(l) if l.token == Token::Comma => self.advance(),
                Some(l) if l.token == Token::RightParen => {
                    self.advance();
                    break;
                }
                Some(l) => return Err(self.unexpected(", or )", l)),
                None => return Err(ParseError::UnexpectedEndOfInput),
            }
        }

        Ok(args)
    }

    fn parse_call(&mut self, name: &str, span: Span) -> Result<Expr, ParseError> {
        let args = self.parse_arguments()?;

        if name == "Function" {
            let head = match args.as_slice() {
                [Arg::Str(s)] => s.clone(),
                _ => {
                    return Err(ParseError::invalid_syntax_at(
                        "Function expects a quoted name",
                        span,
                    ));
                }
            };
            if self.current_token() != Some(&Token::LeftParen) {
                return match self.current() {
                    Some(l) => Err(self.unexpected("(", l)),
                    None => Err(ParseError::UnexpectedEndOfInput),
                };
            }
            let inner = positional(self.parse_arguments()?, &head, span)?;
            return Ok(Expr::func(&head, inner));
        }

        build_call(name, args, span)
    }
}

fn atom(name: &str, span: Span) -> Result<Expr, ParseError> {
    match name {
        "pi" => Ok(Expr::pi()),
        "E" => Ok(Expr::e()),
        "I" => Ok(Expr::imaginary_unit()),
        "zoo" => Ok(Expr::complex_infinity()),
        "oo" => Err(ParseError::invalid_syntax_at(
            "infinite quantities are not supported",
            span,
        )),
        _ if is_callable(name) => Err(ParseError::unexpected("(", "end of name", Span::at(span.end))),
        _ => Ok(Expr::symbol(name)),
    }
}

/// Plain expression arguments; strings and keywords are rejected
fn positional(args: Vec<Arg>, name: &str, span: Span) -> Result<Vec<Expr>, ParseError> {
    let mut out = Vec::with_capacity(args.len());
    for a in args {
        match a {
            Arg::Expr(e) => out.push(e),
            Arg::Str(_) | Arg::Keyword => {
                return Err(ParseError::invalid_syntax_at(
                    format!("unexpected argument to '{name}'"),
                    span,
                ));
            }
        }
    }
    Ok(out)
}

fn arity_ok(name: &str, n: usize) -> bool {
    match name {
        "log" => (1..=2).contains(&n),
        _ if ALIASES.contains(&name) => n == 1,
        _ => Registry::get(name).is_none_or(|d| d.validate_arity(n)),
    }
}

fn binary(name: &str, args: Vec<Expr>) -> Result<(Expr, Expr), ParseError> {
    match <[Expr; 2]>::try_from(args) {
        Ok([a, b]) => Ok((a, b)),
        Err(v) => Err(ParseError::WrongArity {
            name: name.to_string(),
            got: v.len(),
        }),
    }
}

fn integer_arg(e: &Expr, span: Span) -> Result<Rational, ParseError> {
    match e.as_rational() {
        Some(r) if r.is_integer() => Ok(r.clone()),
        _ => Err(ParseError::invalid_syntax_at(
            format!("expected an integer, got '{e}'"),
            span,
        )),
    }
}

fn build_call(name: &str, args: Vec<Arg>, span: Span) -> Result<Expr, ParseError> {
    match name {
        "Symbol" => match args.first() {
            Some(Arg::Str(s)) if !s.is_empty() => Ok(Expr::symbol(s)),
            _ => Err(ParseError::invalid_syntax_at("Symbol expects a quoted name", span)),
        },
        "Float" => {
            let value = match args.first() {
                Some(Arg::Str(s)) => s.trim().parse::<f64>().ok(),
                Some(Arg::Expr(e)) => e.as_numeric().map(|n| n.to_f64()),
                _ => None,
            };
            value.map(Expr::float).ok_or_else(|| ParseError::InvalidNumber {
                value: "Float(...)".to_string(),
                span: Some(span),
            })
        }
        _ => {
            let args = positional(args, name, span)?;
            build_expr_call(name, args, span)
        }
    }
}

fn build_expr_call(name: &str, args: Vec<Expr>, span: Span) -> Result<Expr, ParseError> {
    let relation = |op: RelOp, args: Vec<Expr>| -> Result<Expr, ParseError> {
        let (a, b) = binary(name, args)?;
        Ok(Expr::relation(op, a, b))
    };
    match name {
        "Integer" => match args.as_slice() {
            [n] => integer_arg(n, span).map(Expr::rational),
            _ => Err(ParseError::WrongArity {
                name: name.to_string(),
                got: args.len(),
            }),
        },
        "Rational" => {
            let (p, q) = binary(name, args)?;
            let (p, q) = (integer_arg(&p, span)?, integer_arg(&q, span)?);
            Ok(Expr::div_expr(Expr::rational(p), Expr::rational(q)))
        }
        "Add" => Ok(Expr::sum(args)),
        "Mul" => Ok(Expr::product(args)),
        "Pow" => {
            let (b, e) = binary(name, args)?;
            Ok(Expr::pow(b, e))
        }
        "Tuple" => Ok(Expr::tuple(args)),
        "Eq" | "Equality" => relation(RelOp::Eq, args),
        "Ne" | "Unequality" => relation(RelOp::Ne, args),
        "StrictLessThan" | "Lt" => relation(RelOp::Lt, args),
        "LessThan" | "Le" => relation(RelOp::Le, args),
        "StrictGreaterThan" | "Gt" => relation(RelOp::Gt, args),
        "GreaterThan" | "Ge" => relation(RelOp::Ge, args),
        "diff" | "Derivative" => derivative_call(args, span),
        "integrate" | "Integral" => integral_call(args, span),
        _ => {
            if !arity_ok(name, args.len()) {
                return Err(ParseError::WrongArity {
                    name: name.to_string(),
                    got: args.len(),
                });
            }
            Ok(Expr::func(name, args))
        }
    }
}

/// The only free variable of `f`, used when a construct omits its variable
fn sole_variable(f: &Expr, span: Span) -> Result<Symbol, ParseError> {
    let free = f.free_symbols();
    match (free.len(), free.into_iter().next()) {
        (1, Some(s)) => Ok(s),
        _ => Err(ParseError::invalid_syntax_at(
            "the variable must be given explicitly",
            span,
        )),
    }
}

fn derivative_call(args: Vec<Expr>, span: Span) -> Result<Expr, ParseError> {
    let mut it = args.into_iter();
    let f = it.next().ok_or(ParseError::WrongArity {
        name: "Derivative".to_string(),
        got: 0,
    })?;
    let mut vars: Vec<(Symbol, u32)> = Vec::new();
    for spec in it {
        match spec.kind() {
            ExprKind::Symbol(s) => vars.push((s.clone(), 1)),
            ExprKind::Number(_) if !vars.is_empty() => {
                let order = integer_arg(&spec, span)?
                    .to_i64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| ParseError::invalid_syntax_at("invalid derivative order", span))?;
                if let Some(last) = vars.last_mut() {
                    last.1 = order;
                }
            }
            ExprKind::Tuple(items) => match items.as_slice() {
                [v, n] if v.as_symbol().is_some() => {
                    let order = integer_arg(n, span)?
                        .to_i64()
                        .and_then(|n| u32::try_from(n).ok())
                        .ok_or_else(|| {
                            ParseError::invalid_syntax_at("invalid derivative order", span)
                        })?;
                    if let Some(s) = v.as_symbol() {
                        vars.push((s.clone(), order));
                    }
                }
                _ => {
                    return Err(ParseError::invalid_syntax_at(
                        "invalid differentiation variable",
                        span,
                    ));
                }
            },
            _ => {
                return Err(ParseError::invalid_syntax_at(
                    format!("cannot differentiate with respect to '{spec}'"),
                    span,
                ));
            }
        }
    }
    if vars.is_empty() {
        vars.push((sole_variable(&f, span)?, 1));
    }
    Ok(Expr::derivative(f, vars))
}

fn integral_call(args: Vec<Expr>, span: Span) -> Result<Expr, ParseError> {
    let (f, spec) = match <[Expr; 2]>::try_from(args) {
        Ok([f, spec]) => (f, Some(spec)),
        Err(v) if v.len() == 1 => (v[0].clone(), None),
        Err(v) => {
            return Err(ParseError::WrongArity {
                name: "Integral".to_string(),
                got: v.len(),
            });
        }
    };
    let bad_spec = || ParseError::invalid_syntax_at("invalid integration variable", span);
    let (var, bounds) = match spec {
        None => (sole_variable(&f, span)?, None),
        Some(spec) => match spec.kind() {
            ExprKind::Symbol(s) => (s.clone(), None),
            ExprKind::Tuple(items) => match items.as_slice() {
                [v] => (v.as_symbol().ok_or_else(bad_spec)?.clone(), None),
                [v, lo, hi] => (
                    v.as_symbol().ok_or_else(bad_spec)?.clone(),
                    Some((lo.clone(), hi.clone())),
                ),
                _ => return Err(bad_spec()),
            },
            _ => return Err(bad_spec()),
        },
    };
    Ok(Expr::integral(f, var, bounds))
}
