//! foolc command-line driver

mod cli;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cli::{Cli, Commands, MachineArgs};
use compiler_core::{CompileError, CompileOptions, CompilerSession, read_source};
use std::path::Path;
use svm::{Assembly, MachineOptions};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // logging is off unless FOOL_LOG holds a filter, e.g. FOOL_LOG=frontend=trace
    if let Ok(filter) = EnvFilter::try_from_env("FOOL_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile { file, output, machine } => compile(&file, output.as_deref(), machine),
        Commands::Run { file, emit_asm, machine } => run(&file, emit_asm, machine),
        Commands::Check { file } => check(&file),
        Commands::Exec { file, machine } => exec(&file, machine),
    }
}

fn session_for(machine: MachineArgs) -> CompilerSession {
    let options = CompileOptions::default()
        .with_memory_size(machine.memory_size_or_default())
        .with_step_limit(machine.step_limit);
    CompilerSession::with_options(options)
}

/// Bind errors are listed one per line below the summary.
fn report(err: CompileError) -> anyhow::Error {
    match err {
        CompileError::Bind(errors) => anyhow!(
            "{} binding error(s)\n{}",
            errors.len(),
            CompilerSession::format_errors(&errors)
        ),
        other => anyhow::Error::new(other),
    }
}

fn compile(file: &Path, output: Option<&Path>, machine: MachineArgs) -> Result<()> {
    let source = read_source(file)?;
    let mut session = session_for(machine);
    let text = session
        .assemble(&source)
        .map_err(report)
        .with_context(|| format!("compiling {}", file.display()))?
        .to_string();
    match output {
        Some(path) => std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}

fn run(file: &Path, emit_asm: bool, machine: MachineArgs) -> Result<()> {
    let source = read_source(file)?;
    let mut session = session_for(machine);
    let codes = session
        .compile(&source)
        .map_err(report)
        .with_context(|| format!("compiling {}", file.display()))?;
    if emit_asm {
        eprint!("{}", Assembly::new(codes.clone(), machine.memory_size_or_default()));
    }
    let outcome = session
        .execute(codes)
        .with_context(|| format!("running {}", file.display()))?;
    tracing::debug!(steps = outcome.steps, "finished");
    for value in &outcome.output {
        println!("{}", value);
    }
    if let Some(value) = outcome.value {
        println!("{}", value);
    }
    Ok(())
}

fn check(file: &Path) -> Result<()> {
    let mut session = CompilerSession::new();
    let program = session.parse_file(file)?;
    let bindings = session.bind(&program);
    if bindings.has_errors() {
        return Err(report(CompileError::Bind(bindings.errors().to_vec())));
    }
    println!("{}: ok ({} names resolved)", file.display(), bindings.resolution_count());
    Ok(())
}

fn exec(file: &Path, machine: MachineArgs) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let assembly = Assembly::parse(&text).with_context(|| format!("assembling {}", file.display()))?;
    let memory_size = assembly
        .memory_size_for(machine.memory_size)
        .with_context(|| format!("checking {}", file.display()))?;
    let options = MachineOptions { memory_size, step_limit: machine.step_limit };
    let processor = svm::execute(assembly.instructions, options).with_context(|| format!("running {}", file.display()))?;
    for value in processor.output() {
        println!("{}", value);
    }
    if let Some(value) = processor.top() {
        println!("{}", value);
    }
    Ok(())
}
