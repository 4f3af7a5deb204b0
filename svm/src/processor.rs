use tracing::{debug, trace};
use crate::assembler::Program;
use crate::error::MachineError;
use crate::instruction::{Instruction, Operand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineOptions {
    /// Number of memory cells shared by the stack and the heap.
    pub memory_size: usize,
    pub step_limit: Option<u64>,
}

impl Default for MachineOptions {
    fn default() -> Self {
        MachineOptions { memory_size: 10000, step_limit: None }
    }
}

/// Stack machine interpreter.
///
/// The stack grows down from the top of memory and the heap grows up from
/// address 0. `$fp` starts at the top of memory, so the outermost frame's
/// first cell is `memory_size - 1`.
#[derive(Debug)]
pub struct Processor {
    program: Program,
    memory: Vec<i64>,
    ip: usize,
    sp: usize,
    fp: i64,
    ra: i64,
    tm: i64,
    hp: i64,
    output: Vec<i64>,
    steps: u64,
    options: MachineOptions,
}

impl Processor {
    pub fn new(program: Program, options: MachineOptions) -> Self {
        Processor {
            program,
            memory: vec![0; options.memory_size],
            ip: 0,
            sp: options.memory_size,
            fp: options.memory_size as i64,
            ra: 0,
            tm: 0,
            hp: 0,
            output: Vec::new(),
            steps: 0,
            options,
        }
    }

    /// Values printed so far, oldest first.
    pub fn output(&self) -> &[i64] {
        &self.output
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn top(&self) -> Option<i64> {
        self.memory.get(self.sp).copied()
    }

    pub fn stack_depth(&self) -> usize {
        self.options.memory_size - self.sp
    }

    pub fn heap_pointer(&self) -> i64 {
        self.hp
    }

    pub fn read(&self, address: usize) -> Option<i64> {
        self.memory.get(address).copied()
    }

    fn push(&mut self, value: i64) -> Result<(), MachineError> {
        if self.sp == 0 || (self.sp as i64) <= self.hp {
            return Err(MachineError::StackOverflow { ip: self.ip });
        }
        self.sp -= 1;
        self.memory[self.sp] = value;
        Ok(())
    }

    fn pop(&mut self) -> Result<i64, MachineError> {
        let value = self.top().ok_or(MachineError::EmptyStack { ip: self.ip })?;
        self.sp += 1;
        Ok(value)
    }

    fn address(&self, address: i64) -> Result<usize, MachineError> {
        usize::try_from(address)
            .ok()
            .filter(|a| *a < self.options.memory_size)
            .ok_or(MachineError::InvalidAddress { address, ip: self.ip })
    }

    fn jump_target(&self, target: i64) -> Result<usize, MachineError> {
        usize::try_from(target)
            .ok()
            .filter(|t| *t < self.program.len())
            .ok_or(MachineError::InvalidJump { target, ip: self.ip })
    }

    fn label(&self, label: &str) -> usize {
        // Program::load guarantees every referenced label exists
        self.program.address_of(label).unwrap_or(self.program.len())
    }

    /// Runs until `halt` or the end of the program and returns the value left
    /// on top of the stack, if any.
    #[tracing::instrument(level = "debug", skip(self), fields(instructions = self.program.len()))]
    pub fn run(&mut self) -> Result<Option<i64>, MachineError> {
        while let Some(instruction) = self.program.get(self.ip).cloned() {
            self.steps += 1;
            if let Some(limit) = self.options.step_limit {
                if self.steps > limit {
                    return Err(MachineError::StepLimit(limit));
                }
            }
            trace!(ip = self.ip, sp = self.sp, %instruction, "step");
            if !self.step(&instruction)? {
                break;
            }
        }
        debug!(steps = self.steps, printed = self.output.len(), "halt");
        Ok(if self.stack_depth() > 0 { self.top() } else { None })
    }

    /// Executes one instruction. Returns false on `halt`.
    fn step(&mut self, instruction: &Instruction) -> Result<bool, MachineError> {
        let mut next = self.ip + 1;
        match instruction {
            Instruction::Push(Operand::Int(v)) => self.push(*v)?,
            Instruction::Push(Operand::Label(l)) => {
                let address = self.label(l) as i64;
                self.push(address)?
            }
            Instruction::Pop => {
                self.pop()?;
            }
            Instruction::Add | Instruction::Sub | Instruction::Mult | Instruction::Div => {
                let right = self.pop()?;
                let left = self.pop()?;
                let value = match instruction {
                    Instruction::Add => left.wrapping_add(right),
                    Instruction::Sub => left.wrapping_sub(right),
                    Instruction::Mult => left.wrapping_mul(right),
                    _ => {
                        if right == 0 {
                            return Err(MachineError::DivisionByZero { ip: self.ip });
                        }
                        left.wrapping_div(right)
                    }
                };
                self.push(value)?;
            }
            Instruction::Branch(l) => next = self.label(l),
            Instruction::BranchEq(l) | Instruction::BranchLessEq(l) => {
                let right = self.pop()?;
                let left = self.pop()?;
                let taken = match instruction {
                    Instruction::BranchEq(_) => left == right,
                    _ => left <= right,
                };
                if taken {
                    next = self.label(l);
                }
            }
            Instruction::Label(_) => {}
            Instruction::LoadFp => self.push(self.fp)?,
            Instruction::StoreFp => self.fp = self.pop()?,
            Instruction::CopyFp => self.fp = self.sp as i64,
            Instruction::LoadRa => self.push(self.ra)?,
            Instruction::StoreRa => self.ra = self.pop()?,
            Instruction::LoadTm => self.push(self.tm)?,
            Instruction::StoreTm => self.tm = self.pop()?,
            Instruction::LoadHp => self.push(self.hp)?,
            Instruction::StoreHp => self.hp = self.pop()?,
            Instruction::LoadWord => {
                let address = self.pop()?;
                let address = self.address(address)?;
                self.push(self.memory[address])?;
            }
            Instruction::StoreWord => {
                let address = self.pop()?;
                let value = self.pop()?;
                let address = self.address(address)?;
                self.memory[address] = value;
            }
            Instruction::JumpSub => {
                let target = self.pop()?;
                self.ra = next as i64;
                next = self.jump_target(target)?;
            }
            Instruction::Print => {
                let value = self.pop()?;
                debug!(value, "print");
                self.output.push(value);
            }
            Instruction::Halt => return Ok(false),
        }
        self.ip = next;
        Ok(true)
    }
}
