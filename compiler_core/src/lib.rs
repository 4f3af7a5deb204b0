use std::path::{Path, PathBuf};
use string_interner::DefaultStringInterner;
use frontend::ast::Program;
use frontend::binder::{bind, BindError, Bindings};
use frontend::parser::{Parser, ParserError, ParserResult};
use svm::{Assembly, Instruction, MachineError, MachineOptions, Processor, Program as MachineProgram};
use svm_backend::{CodegenError, CodegenOptions};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{0}")]
    Parse(#[from] ParserError),
    #[error("{} binding error(s)", .0.len())]
    Bind(Vec<BindError>),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error(transparent)]
    Machine(#[from] MachineError),
    #[error("failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

/// Settings for code generation and execution. The generator's global frame
/// base must equal the machine's memory size; the builders keep them in step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    pub codegen: CodegenOptions,
    pub machine: MachineOptions,
}

impl CompileOptions {
    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.machine.memory_size = memory_size;
        self.codegen.global_frame_base = memory_size as i64;
        self
    }

    pub fn with_step_limit(mut self, step_limit: Option<u64>) -> Self {
        self.machine.step_limit = step_limit;
        self
    }
}

/// Result of running a compiled program to `halt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub value: Option<i64>,
    pub output: Vec<i64>,
    pub steps: u64,
}

/// Compiler session that serves as the central context for compilation
///
/// Holds the string interner shared by every phase and the options used
/// for code generation and execution.
pub struct CompilerSession {
    string_interner: DefaultStringInterner,
    options: CompileOptions,
}

impl CompilerSession {
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            string_interner: DefaultStringInterner::new(),
            options,
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Parse a program string using the session's string interner
    pub fn parse_program(&mut self, input: &str) -> ParserResult<Program> {
        let parser = Parser::new(input, &mut self.string_interner);
        parser.parse_program()
    }

    pub fn parse_file<P: AsRef<Path>>(&mut self, path: P) -> Result<Program, CompileError> {
        let source = read_source(path.as_ref())?;
        Ok(self.parse_program(&source)?)
    }

    pub fn bind(&self, program: &Program) -> Bindings {
        bind(program, &self.string_interner)
    }

    /// Parse, bind and generate code for `input`.
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = input.len()))]
    pub fn compile(&mut self, input: &str) -> Result<Vec<Instruction>, CompileError> {
        let program = self.parse_program(input)?;
        debug!(expressions = program.expression.len(), declarations = program.declarations.len(), "parsed");
        self.compile_program(&program)
    }

    pub fn compile_program(&self, program: &Program) -> Result<Vec<Instruction>, CompileError> {
        let bindings = self.bind(program);
        if bindings.has_errors() {
            return Err(CompileError::Bind(bindings.errors().to_vec()));
        }
        let codes = svm_backend::generate(program, &bindings, self.options.codegen)?;
        info!(instructions = codes.len(), "compiled");
        Ok(codes)
    }

    /// Compiled code tagged with the memory size it addresses globals for.
    pub fn assemble(&mut self, input: &str) -> Result<Assembly, CompileError> {
        let codes = self.compile(input)?;
        Ok(Assembly::new(codes, self.options.machine.memory_size))
    }

    /// Compile `input` and run it on a fresh machine.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn run(&mut self, input: &str) -> Result<RunOutcome, CompileError> {
        let codes = self.compile(input)?;
        self.execute(codes)
    }

    pub fn execute(&self, codes: Vec<Instruction>) -> Result<RunOutcome, CompileError> {
        let program = MachineProgram::load(codes).map_err(MachineError::from)?;
        let mut processor = Processor::new(program, self.options.machine);
        let value = processor.run()?;
        Ok(RunOutcome {
            value,
            output: processor.output().to_vec(),
            steps: processor.steps(),
        })
    }

    /// One bind error per line.
    pub fn format_errors(errors: &[BindError]) -> String {
        errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
    }

    pub fn string_interner(&self) -> &DefaultStringInterner {
        &self.string_interner
    }

    pub fn string_interner_mut(&mut self) -> &mut DefaultStringInterner {
        &mut self.string_interner
    }
}

impl Default for CompilerSession {
    fn default() -> Self {
        Self::new()
    }
}

pub fn read_source(path: &Path) -> Result<String, CompileError> {
    std::fs::read_to_string(path).map_err(|source| CompileError::Io { path: path.to_path_buf(), source })
}
