use string_interner::DefaultSymbol;

/// A type as written in the source, before the binder has checked that
/// class names refer to declared classes.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub enum TypeDecl {
    Int,
    Bool,
    Class(DefaultSymbol),
    Arrow(Vec<TypeDecl>, Box<TypeDecl>),
}
