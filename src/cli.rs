//! Command-line surface (spec §6: "CLI surface (collaborator, non-core)").
//! Grounded on the teacher's `clap`-derive `CliArgs`
//! (`examples/TrevorS-lisp-llm-sandbox/src/main.rs`), trimmed to the flags
//! spec §6 actually names plus the `--print-ast`/`--print-instructions`
//! debugging dump supplemented from `original_source/Rasp/src/parser.cpp`'s
//! `settings.verbose` tree/instruction printing.

use clap::Parser;
use std::path::PathBuf;

/// A small dynamically-typed S-expression language.
#[derive(Parser, Debug)]
#[command(name = "rasp")]
#[command(version)]
#[command(about = "A small dynamically-typed S-expression interpreter")]
pub struct CliArgs {
    /// Source files to execute, in order. With none given, starts the REPL
    /// unless `--repl` is also absent and stdin is not a terminal.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Start an interactive REPL after running any given files.
    #[arg(long)]
    pub repl: bool,

    /// Log every executed instruction via `tracing`.
    #[arg(long)]
    pub trace: bool,

    /// Print each file's token tree before executing it.
    #[arg(long = "print-ast")]
    pub print_ast: bool,

    /// Print each file's compiled instruction list before executing it.
    #[arg(long = "print-instructions")]
    pub print_instructions: bool,

    /// Run this crate's bundled unit test suite and exit (a thin wrapper
    /// around `cargo test`, for parity with the original's `--unit-tests`
    /// flag).
    #[arg(long = "unit-tests")]
    pub unit_tests: bool,
}
