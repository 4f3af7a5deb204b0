use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// FOOL compiler targeting the stack virtual machine
#[derive(Parser, Debug)]
#[command(name = "foolc")]
#[command(version)]
#[command(about = "Compile and run FOOL programs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a source file to assembly
    Compile {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Write the assembly here instead of stdout
        #[arg(short, long, value_name = "OUT")]
        output: Option<PathBuf>,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Compile a source file and run it
    Run {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Print the generated assembly to stderr before running
        #[arg(long)]
        emit_asm: bool,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Parse and bind a source file without generating code
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Run an assembly file produced by `compile`
    Exec {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
    },
}

#[derive(Args, Debug, Clone, Copy)]
pub struct MachineArgs {
    /// Memory cells shared by the stack and the heap [default: 10000]
    #[arg(long, value_name = "CELLS")]
    pub memory_size: Option<usize>,
    /// Abort after this many executed instructions
    #[arg(long, value_name = "STEPS")]
    pub step_limit: Option<u64>,
}

impl MachineArgs {
    pub fn memory_size_or_default(&self) -> usize {
        self.memory_size.unwrap_or(svm::MachineOptions::default().memory_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags() {
        let cli = Cli::try_parse_from(["foolc", "run", "prog.fool", "--emit-asm", "--step-limit", "500"]).unwrap();
        match cli.command {
            Commands::Run { file, emit_asm, machine } => {
                assert_eq!(file, PathBuf::from("prog.fool"));
                assert!(emit_asm);
                assert_eq!(machine.memory_size, None);
                assert_eq!(machine.memory_size_or_default(), 10000);
                assert_eq!(machine.step_limit, Some(500));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn compile_output_and_memory() {
        let cli = Cli::try_parse_from(["foolc", "compile", "a.fool", "-o", "a.asm", "--memory-size", "512"]).unwrap();
        match cli.command {
            Commands::Compile { output, machine, .. } => {
                assert_eq!(output, Some(PathBuf::from("a.asm")));
                assert_eq!(machine.memory_size, Some(512));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn exec_memory_size_is_optional() {
        let cli = Cli::try_parse_from(["foolc", "exec", "a.asm"]).unwrap();
        match cli.command {
            Commands::Exec { machine, .. } => assert_eq!(machine.memory_size, None),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn check_takes_no_machine_flags() {
        assert!(Cli::try_parse_from(["foolc", "check", "a.fool", "--memory-size", "5"]).is_err());
    }
}
