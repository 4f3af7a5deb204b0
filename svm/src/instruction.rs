use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Int(i64),
    Label(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(v) => write!(f, "{}", v),
            Operand::Label(l) => write!(f, "{}", l),
        }
    }
}

/// One machine instruction. `Display` renders the assembly mnemonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Push(Operand),
    Pop,
    Add,
    Sub,
    Mult,
    Div,
    Branch(String),
    BranchEq(String),
    BranchLessEq(String),
    Label(String),
    LoadFp,
    StoreFp,
    CopyFp,
    LoadRa,
    StoreRa,
    LoadTm,
    StoreTm,
    LoadHp,
    StoreHp,
    LoadWord,
    StoreWord,
    JumpSub,
    Print,
    Halt,
}

impl Instruction {
    pub fn push(v: i64) -> Self {
        Instruction::Push(Operand::Int(v))
    }

    pub fn push_label(label: &str) -> Self {
        Instruction::Push(Operand::Label(label.to_string()))
    }

    /// The label this instruction refers to, if any; label definitions excluded.
    pub fn target(&self) -> Option<&str> {
        match self {
            Instruction::Push(Operand::Label(l))
            | Instruction::Branch(l)
            | Instruction::BranchEq(l)
            | Instruction::BranchLessEq(l) => Some(l),
            _ => None,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push(_) => "push",
            Instruction::Pop => "pop",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mult => "mult",
            Instruction::Div => "div",
            Instruction::Branch(_) => "b",
            Instruction::BranchEq(_) => "beq",
            Instruction::BranchLessEq(_) => "bleq",
            Instruction::Label(_) => "label",
            Instruction::LoadFp => "lfp",
            Instruction::StoreFp => "sfp",
            Instruction::CopyFp => "cfp",
            Instruction::LoadRa => "lra",
            Instruction::StoreRa => "sra",
            Instruction::LoadTm => "ltm",
            Instruction::StoreTm => "stm",
            Instruction::LoadHp => "lhp",
            Instruction::StoreHp => "shp",
            Instruction::LoadWord => "lw",
            Instruction::StoreWord => "sw",
            Instruction::JumpSub => "js",
            Instruction::Print => "print",
            Instruction::Halt => "halt",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Label(l) => write!(f, "{}:", l),
            Instruction::Push(operand) => write!(f, "push {}", operand),
            Instruction::Branch(l) | Instruction::BranchEq(l) | Instruction::BranchLessEq(l) => {
                write!(f, "{} {}", self.mnemonic(), l)
            }
            other => f.write_str(other.mnemonic()),
        }
    }
}
