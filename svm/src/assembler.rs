use std::collections::HashMap;
use crate::error::AsmError;
use crate::instruction::{Instruction, Operand};
use crate::processor::MachineOptions;

/// Instructions with every label resolved to the index of its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

impl Program {
    pub fn load(instructions: Vec<Instruction>) -> Result<Self, AsmError> {
        let mut labels = HashMap::new();
        for (index, instruction) in instructions.iter().enumerate() {
            if let Instruction::Label(name) = instruction {
                if labels.insert(name.clone(), index).is_some() {
                    return Err(AsmError::DuplicateLabel(name.clone()));
                }
            }
        }
        if let Some(missing) = instructions
            .iter()
            .filter_map(Instruction::target)
            .find(|target| !labels.contains_key(*target))
        {
            return Err(AsmError::UnknownLabel(missing.to_string()));
        }
        Ok(Program { instructions, labels })
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn address_of(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }
}

/// Generated code together with the memory size its absolute addresses
/// were computed for. The text form starts with a `.memory N` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub memory_size: Option<usize>,
    pub instructions: Vec<Instruction>,
}

impl Assembly {
    pub fn new(instructions: Vec<Instruction>, memory_size: usize) -> Self {
        Assembly { memory_size: Some(memory_size), instructions }
    }

    /// Reads assembly text, one instruction per line. Blank lines are
    /// skipped; a `.memory N` directive may appear once.
    pub fn parse(text: &str) -> Result<Self, AsmError> {
        let mut memory_size = None;
        let mut instructions = vec![];
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let source = raw.trim();
            if source.is_empty() {
                continue;
            }
            if let Some(directive) = source.strip_prefix('.') {
                let size = parse_memory_directive(line, directive)?;
                if memory_size.replace(size).is_some() {
                    return Err(AsmError::InvalidDirective { line, text: source.to_string() });
                }
                continue;
            }
            instructions.push(parse_instruction(line, source)?);
        }
        Ok(Assembly { memory_size, instructions })
    }

    /// Memory size to run with: the recorded one, unless `requested`
    /// disagrees with it.
    pub fn memory_size_for(&self, requested: Option<usize>) -> Result<usize, AsmError> {
        match (self.memory_size, requested) {
            (Some(recorded), Some(requested)) if recorded != requested => {
                Err(AsmError::MemoryMismatch { recorded, requested })
            }
            (Some(size), _) | (None, Some(size)) => Ok(size),
            (None, None) => Ok(MachineOptions::default().memory_size),
        }
    }
}

impl std::fmt::Display for Assembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(size) = self.memory_size {
            writeln!(f, ".memory {}", size)?;
        }
        f.write_str(&write_assembly(&self.instructions))
    }
}

fn parse_memory_directive(line: usize, directive: &str) -> Result<usize, AsmError> {
    let mut words = directive.split_whitespace();
    match (words.next(), words.next().map(str::parse::<usize>), words.next()) {
        (Some("memory"), Some(Ok(size)), None) => Ok(size),
        _ => Err(AsmError::InvalidDirective { line, text: format!(".{}", directive) }),
    }
}

/// Instructions only; a `.memory` directive is read and dropped.
pub fn parse_assembly(text: &str) -> Result<Vec<Instruction>, AsmError> {
    Ok(Assembly::parse(text)?.instructions)
}

fn parse_instruction(line: usize, source: &str) -> Result<Instruction, AsmError> {
    if let Some(label) = source.strip_suffix(':') {
        return Ok(Instruction::Label(label.trim().to_string()));
    }

    let mut words = source.split_whitespace();
    let mnemonic = words.next().unwrap_or_default();
    let operand = words.next();
    if let Some(extra) = words.next() {
        return Err(AsmError::UnexpectedOperand { line, operand: extra.to_string() });
    }
    let label_operand = |operand: Option<&str>| -> Result<String, AsmError> {
        operand
            .map(str::to_string)
            .ok_or_else(|| AsmError::MissingOperand { line, mnemonic: mnemonic.to_string() })
    };

    let instruction = match mnemonic {
        "push" => {
            let operand = label_operand(operand)?;
            match operand.parse::<i64>() {
                Ok(v) => Instruction::Push(Operand::Int(v)),
                Err(_) => Instruction::Push(Operand::Label(operand)),
            }
        }
        "b" => Instruction::Branch(label_operand(operand)?),
        "beq" => Instruction::BranchEq(label_operand(operand)?),
        "bleq" => Instruction::BranchLessEq(label_operand(operand)?),
        _ => {
            if let Some(operand) = operand {
                return Err(AsmError::UnexpectedOperand { line, operand: operand.to_string() });
            }
            match mnemonic {
                "pop" => Instruction::Pop,
                "add" => Instruction::Add,
                "sub" => Instruction::Sub,
                "mult" => Instruction::Mult,
                "div" => Instruction::Div,
                "lfp" => Instruction::LoadFp,
                "sfp" => Instruction::StoreFp,
                "cfp" => Instruction::CopyFp,
                "lra" => Instruction::LoadRa,
                "sra" => Instruction::StoreRa,
                "ltm" => Instruction::LoadTm,
                "stm" => Instruction::StoreTm,
                "lhp" => Instruction::LoadHp,
                "shp" => Instruction::StoreHp,
                "lw" => Instruction::LoadWord,
                "sw" => Instruction::StoreWord,
                "js" => Instruction::JumpSub,
                "print" => Instruction::Print,
                "halt" => Instruction::Halt,
                other => return Err(AsmError::UnknownInstruction { line, text: other.to_string() }),
            }
        }
    };
    Ok(instruction)
}

pub fn write_assembly(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for instruction in instructions {
        out.push_str(&instruction.to_string());
        out.push('\n');
    }
    out
}
