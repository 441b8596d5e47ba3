use crate::ast::RelOp;
use crate::error::Span;

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Operator {
    /// Binding power for Pratt parsing
    pub(crate) fn precedence(self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 10,
            Operator::Mul | Operator::Div => 20,
            Operator::Pow => 30,
        }
    }

    pub(crate) fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// Numeric literal, kept as text so it can be read exactly
    Number(String),
    Identifier(String),
    /// Quoted string, only meaningful as a constructor argument
    Str(String),
    Operator(Operator),
    Relation(RelOp),
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
}

impl Token {
    pub(crate) fn to_user_string(&self) -> String {
        match self {
            Token::Number(n) => n.clone(),
            Token::Identifier(s) => s.clone(),
            Token::Str(s) => format!("'{s}'"),
            Token::Operator(op) => op.symbol().to_string(),
            Token::Relation(op) => match op {
                RelOp::Eq => "=",
                RelOp::Ne => "!=",
                RelOp::Lt => "<",
                RelOp::Le => "<=",
                RelOp::Gt => ">",
                RelOp::Ge => ">=",
            }
            .to_string(),
            Token::LeftParen => "(".to_string(),
            Token::RightParen => ")".to_string(),
            Token::LeftBracket => "[".to_string(),
            Token::RightBracket => "]".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

/// A token with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub span: Span,
}

impl Lexeme {
    pub(crate) fn new(token: Token, span: Span) -> Self {
        Lexeme { token, span }
    }
}
