pub mod error;
pub mod generator;
pub mod label;

pub use error::CodegenError;
pub use generator::{generate, CodeGenerator, CodegenOptions};
pub use label::LabelGenerator;
