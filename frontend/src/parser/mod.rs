pub mod core;
pub mod decl;
pub mod error;
pub mod expr;
pub mod token_source;


pub use core::Parser;
pub use error::{ParserError, ParserErrorKind, ParserResult};
