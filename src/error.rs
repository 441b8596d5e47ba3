use std::fmt;

/// Source location span for error reporting
/// Represents a range of characters in the input string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (0-indexed byte offset)
    pub start: usize,
    /// End position (exclusive, 0-indexed byte offset)
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Span covering a single position
    pub fn at(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.end > self.start
    }

    /// Format the span for display (1-indexed for users)
    pub fn display(&self) -> String {
        if !self.is_valid() {
            String::new()
        } else if self.end - self.start == 1 {
            format!(" at position {}", self.start + 1)
        } else {
            format!(" at positions {}-{}", self.start + 1, self.end)
        }
    }
}

fn span_suffix(span: &Option<Span>) -> String {
    span.map_or(String::new(), |s| s.display())
}

/// Errors raised while turning text into an expression
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    EmptyFormula,
    InvalidSyntax {
        msg: String,
        span: Option<Span>,
    },
    InvalidNumber {
        value: String,
        span: Option<Span>,
    },
    InvalidToken {
        token: String,
        span: Option<Span>,
    },
    UnexpectedToken {
        expected: String,
        got: String,
        span: Option<Span>,
    },
    UnexpectedEndOfInput,
    WrongArity {
        name: String,
        got: usize,
    },
    AmbiguousSequence {
        sequence: String,
        suggestion: String,
        span: Option<Span>,
    },
    MaxDepthExceeded,
    MaxNodesExceeded,
}

impl ParseError {
    pub fn invalid_syntax(msg: impl Into<String>) -> Self {
        ParseError::InvalidSyntax {
            msg: msg.into(),
            span: None,
        }
    }

    pub fn invalid_syntax_at(msg: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidSyntax {
            msg: msg.into(),
            span: Some(span),
        }
    }

    pub fn unexpected(expected: impl Into<String>, got: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedToken {
            expected: expected.into(),
            got: got.into(),
            span: Some(span),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyFormula => write!(f, "Formula cannot be empty"),
            ParseError::InvalidSyntax { msg, span } => {
                write!(f, "Invalid syntax: {}{}", msg, span_suffix(span))
            }
            ParseError::InvalidNumber { value, span } => {
                write!(f, "Invalid number format: '{}'{}", value, span_suffix(span))
            }
            ParseError::InvalidToken { token, span } => {
                write!(f, "Invalid token: '{}'{}", token, span_suffix(span))
            }
            ParseError::UnexpectedToken {
                expected,
                got,
                span,
            } => write!(
                f,
                "Expected '{}', but got '{}'{}",
                expected,
                got,
                span_suffix(span)
            ),
            ParseError::UnexpectedEndOfInput => write!(f, "Unexpected end of input"),
            ParseError::WrongArity { name, got } => {
                write!(f, "Function '{}' does not take {} argument(s)", name, got)
            }
            ParseError::AmbiguousSequence {
                sequence,
                suggestion,
                span,
            } => write!(
                f,
                "Ambiguous identifier sequence '{}': {}.{} \
                 Consider using explicit multiplication (e.g., 'x*sin(y)').",
                sequence,
                suggestion,
                span_suffix(span)
            ),
            ParseError::MaxDepthExceeded => {
                write!(f, "Expression nesting depth exceeds maximum limit")
            }
            ParseError::MaxNodesExceeded => {
                write!(f, "Expression size exceeds maximum node count limit")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors raised by the router and the symbolic solvers
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    Parse(ParseError),
    /// More than one `=` or an empty side
    MalformedEquation(String),
    /// No `=` at all
    NotAnEquation,
    UnsupportedQueryType(String),
    NoFreeVariable,
    SolveFailure(String),
    NotIntegrable(String),
    BudgetExceeded {
        resource: &'static str,
        limit: usize,
    },
}

impl SolveError {
    pub fn failure(msg: impl Into<String>) -> Self {
        SolveError::SolveFailure(msg.into())
    }
}

impl From<ParseError> for SolveError {
    fn from(e: ParseError) -> Self {
        SolveError::Parse(e)
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Parse(e) => write!(f, "{}", e),
            SolveError::MalformedEquation(msg) => write!(f, "Malformed equation: {}", msg),
            SolveError::NotAnEquation => write!(f, "Not an equation"),
            SolveError::UnsupportedQueryType(t) => write!(f, "Unsupported query type: {}", t),
            SolveError::NoFreeVariable => write!(f, "No free variable in expression"),
            SolveError::SolveFailure(msg) => write!(f, "{}", msg),
            SolveError::NotIntegrable(e) => {
                write!(f, "Could not find an antiderivative for {}", e)
            }
            SolveError::BudgetExceeded { resource, limit } => write!(
                f,
                "Computation budget exceeded: more than {} {}",
                limit, resource
            ),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors from loading or running the statistical model
#[derive(Debug)]
pub enum ModelError {
    Io(std::io::Error),
    Format(serde_json::Error),
    /// Weights, labels and vocabulary disagree in size
    Shape(String),
    Inference(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Io(e) => write!(f, "Could not read model artifact: {}", e),
            ModelError::Format(e) => write!(f, "Malformed model artifact: {}", e),
            ModelError::Shape(msg) => write!(f, "Inconsistent model artifact: {}", msg),
            ModelError::Inference(msg) => write!(f, "Model inference failed: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Io(e) => Some(e),
            ModelError::Format(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self {
        ModelError::Io(e)
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Format(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display_is_one_indexed() {
        assert_eq!(Span::at(0).display(), " at position 1");
        assert_eq!(Span::new(2, 5).display(), " at positions 3-5");
        assert_eq!(Span::default().display(), "");
    }

    #[test]
    fn test_solve_error_messages() {
        assert_eq!(SolveError::NotAnEquation.to_string(), "Not an equation");
        assert_eq!(
            SolveError::UnsupportedQueryType("limit".into()).to_string(),
            "Unsupported query type: limit"
        );
        let parse: SolveError = ParseError::EmptyFormula.into();
        assert_eq!(parse.to_string(), "Formula cannot be empty");
    }
}
