pub mod assembler;
pub mod error;
pub mod instruction;
pub mod processor;

pub use assembler::{parse_assembly, write_assembly, Assembly, Program};
pub use error::{AsmError, MachineError};
pub use instruction::{Instruction, Operand};
pub use processor::{MachineOptions, Processor};

/// Loads `instructions` and runs them to `halt` with `options`.
pub fn execute(instructions: Vec<Instruction>, options: MachineOptions) -> Result<Processor, MachineError> {
    let program = Program::load(instructions)?;
    let mut processor = Processor::new(program, options);
    processor.run()?;
    Ok(processor)
}
