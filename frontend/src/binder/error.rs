use crate::ast::SourceLocation;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindErrorKind {
    #[error("'{0}' is already declared in this scope")]
    DuplicateDeclaration(String),
    #[error("unresolved identifier '{0}'")]
    UnresolvedIdentifier(String),
    #[error("'{0}' is not an object")]
    NotAnObject(String),
    #[error("unknown class '{0}'")]
    UnknownClass(String),
    #[error("class '{class}' has no method '{method}'")]
    UnknownMethod { class: String, method: String },
    #[error("class '{0}' can only be declared at the outermost scope")]
    MisplacedClass(String),
    #[error("'{0}' is not declared at the outermost scope and cannot be used as a value")]
    LocalFunctionValue(String),
    #[error("expression nesting exceeds {0} levels")]
    NestingTooDeep(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    pub kind: BindErrorKind,
    pub location: Option<SourceLocation>,
}

impl BindError {
    pub fn new(kind: BindErrorKind) -> Self {
        Self { kind, location: None }
    }

    pub fn with_location(mut self, location: Option<SourceLocation>) -> Self {
        self.location = location;
        self
    }
}

impl std::fmt::Display for BindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}:{}: {}", location.line, location.column, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for BindError {}
