pub mod ast;
pub mod binder;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod type_decl;

pub use binder::{bind, Bindings};
pub use parser::{Parser, ParserError};
