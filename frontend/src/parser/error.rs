use crate::ast::SourceLocation;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParserErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("integer literal '{0}' is out of range")]
    IntegerOutOfRange(String),
    #[error("expected {expected} but found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("expected expression but found {0}")]
    ExpectedExpression(String),
    #[error("expression nesting exceeds {0} levels")]
    RecursionLimit(usize),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}:{}: {}", .location.line, .location.column, .kind)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub location: SourceLocation,
}

impl ParserError {
    pub fn new(kind: ParserErrorKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    pub fn unexpected_token(location: SourceLocation, expected: &str, found: String) -> Self {
        Self::new(
            ParserErrorKind::UnexpectedToken { expected: expected.to_string(), found },
            location,
        )
    }
}

pub type ParserResult<T> = Result<T, ParserError>;
