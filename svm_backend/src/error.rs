use frontend::ast::{DeclRef, ExprRef};

/// Preconditions the generator relies on. A program that bound without
/// errors never produces one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    #[error("binding reported {0} error(s); refusing to generate code")]
    BindingErrors(usize),
    #[error("expression {0:?} has no resolution")]
    Unresolved(ExprRef),
    #[error("dotted call {0:?} has no method resolution")]
    MissingMethod(ExprRef),
    #[error("expression {0:?} is not in the program")]
    MissingExpression(ExprRef),
    #[error("declaration {0:?} is not in the program")]
    MissingDeclaration(DeclRef),
    #[error("expression nesting exceeds {0} levels")]
    NestingTooDeep(usize),
}
