#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AsmError {
    #[error("line {line}: unknown instruction '{text}'")]
    UnknownInstruction { line: usize, text: String },
    #[error("line {line}: '{mnemonic}' needs an operand")]
    MissingOperand { line: usize, mnemonic: String },
    #[error("line {line}: unexpected operand '{operand}'")]
    UnexpectedOperand { line: usize, operand: String },
    #[error("label '{0}' is defined more than once")]
    DuplicateLabel(String),
    #[error("label '{0}' is never defined")]
    UnknownLabel(String),
    #[error("line {line}: invalid directive '{text}'")]
    InvalidDirective { line: usize, text: String },
    #[error("code was generated for {recorded} memory cells, not {requested}")]
    MemoryMismatch { recorded: usize, requested: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("division by zero at instruction {ip}")]
    DivisionByZero { ip: usize },
    #[error("address {address} is outside memory at instruction {ip}")]
    InvalidAddress { address: i64, ip: usize },
    #[error("jump target {target} is outside the program at instruction {ip}")]
    InvalidJump { target: i64, ip: usize },
    #[error("stack overflow at instruction {ip}")]
    StackOverflow { ip: usize },
    #[error("pop from empty stack at instruction {ip}")]
    EmptyStack { ip: usize },
    #[error("step limit of {0} instructions exceeded")]
    StepLimit(u64),
    #[error("failed to load program: {0}")]
    Load(#[from] AsmError),
}
