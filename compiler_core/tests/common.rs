use compiler_core::{CompileError, CompileOptions, CompilerSession, RunOutcome};

/// Compile and run `source` on a machine with a step limit
pub fn run_program(source: &str) -> Result<RunOutcome, CompileError> {
    let options = CompileOptions::default().with_step_limit(Some(5_000_000));
    let mut session = CompilerSession::with_options(options);
    session.run(source)
}

/// Run a program and assert the value it leaves on the stack
pub fn assert_program_result(source: &str, expected: i64) {
    let outcome = run_program(source).unwrap_or_else(|e| panic!("program failed: {e}"));
    assert_eq!(outcome.value, Some(expected), "source: {source}");
}

/// Run a program and assert everything it printed
pub fn assert_program_output(source: &str, expected: &[i64]) {
    let outcome = run_program(source).unwrap_or_else(|e| panic!("program failed: {e}"));
    assert_eq!(outcome.output, expected, "source: {source}");
}
