//! Rasp: a small dynamically-typed S-expression language — lexer, compiler,
//! and a stack-based tree-walking VM (see each module's doc comment for the
//! spec section it implements). `Session` is the crate's one public
//! end-to-end entry point; the CLI and REPL binaries are thin collaborators
//! built on top of it.

pub mod bindings;
pub mod builtins;
pub mod compiler;
pub mod error;
pub mod escape;
pub mod highlighter;
pub mod identifier;
pub mod instruction;
pub mod interpreter;
pub mod lexer;
pub mod location;
pub mod scope;
pub mod token;
pub mod trace;
pub mod value;

use bindings::Bindings;
use error::{RaspError, Traced};
use interpreter::Interpreter;
use scope::Declarations;
use value::Value;

/// A persistent compilation + execution context: one scope-stack view, one
/// `Bindings`, one `Interpreter`. Re-feeding source through the same
/// `Session` lets later forms reference names declared by earlier ones —
/// the behaviour a REPL needs, and what a batch run over several files also
/// wants (spec §6: "positional arguments are source-file paths executed in
/// order").
pub struct Session {
    declarations: Declarations,
    bindings: Bindings,
    interpreter: Interpreter,
}

impl Session {
    pub fn new() -> Self {
        Session::with_trace(false)
    }

    pub fn with_trace(trace: bool) -> Self {
        let globals = builtins::register();
        let declarations = Declarations::with_globals(builtins::names());
        let bindings = Bindings::new(globals.clone());
        let interpreter = Interpreter::new(globals).with_trace(trace);
        Session {
            declarations,
            bindings,
            interpreter,
        }
    }

    /// Lexes, compiles, and runs one unit of source (e.g. one file, or one
    /// REPL line), returning the value of its last top-level form.
    pub fn run(&mut self, filename: &str, source: &str) -> Result<Value, Traced> {
        let root = lexer::lex(filename, source)?;
        let instructions = compiler::compile(&root, &mut self.declarations)?;
        self.interpreter.run(&instructions, &mut self.bindings)
    }

    /// Lexes and compiles without executing — backs `--print-ast` and
    /// `--print-instructions`. Pair with [`Session::run_compiled`] to still
    /// execute the result without compiling the source a second time (a
    /// second `compile` call would reject redeclarations the first pass
    /// already recorded).
    pub fn compile_only(
        &mut self,
        filename: &str,
        source: &str,
    ) -> Result<(token::Token, Vec<instruction::Instruction>), Traced> {
        let root = lexer::lex(filename, source)?;
        let instructions = compiler::compile(&root, &mut self.declarations)?;
        Ok((root, instructions))
    }

    /// Executes an already-compiled instruction list against this session's
    /// bindings, without lexing or compiling anything.
    pub fn run_compiled(&mut self, instructions: &[instruction::Instruction]) -> Result<Value, Traced> {
        self.interpreter.run(instructions, &mut self.bindings)
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}

/// One-shot convenience wrapper around [`Session`] for callers (and tests)
/// that don't need state across multiple inputs.
pub fn run_source(filename: &str, source: &str) -> Result<Value, Traced> {
    Session::new().run(filename, source)
}

/// Renders a `Traced` the way the CLI/REPL collaborator does (spec §7): the
/// error message followed by its call-frame trace.
pub fn format_error(traced: &Traced) -> String {
    traced.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_scenario_arithmetic() {
        let result = run_source("t.rasp", "(+ (* 2 42) (/ 133 10) (- 1 6))").unwrap();
        assert_eq!(result.to_string(), "92");
    }

    #[test]
    fn seed_scenario_global_mutation() {
        let result = run_source("t.rasp", "(var g 1) (set g (+ g 1)) g").unwrap();
        assert_eq!(result.to_string(), "2");
    }

    #[test]
    fn seed_scenario_nested_defun_reads_outer_local() {
        let result = run_source(
            "t.rasp",
            "(defun outer () (var c 42) (defun inner () c) (inner)) (outer)",
        )
        .unwrap();
        assert_eq!(result.to_string(), "42");
    }

    #[test]
    fn seed_scenario_returned_closure_keeps_captured_value() {
        let result = run_source(
            "t.rasp",
            "(defun outer () (var c 13) (defun inner () c) inner) (var cl (outer)) (cl)",
        )
        .unwrap();
        assert_eq!(result.to_string(), "13");
    }

    #[test]
    fn seed_scenario_type_new_and_member_concat() {
        let result = run_source(
            "t.rasp",
            r#"(type Person id name) (var a (new Person 13 "Alice")) (var b (new Person 42 "Bob")) (concat "People: " a.name ", " b.name)"#,
        )
        .unwrap();
        assert_eq!(result.display_human(), "People: Alice, Bob");
    }

    #[test]
    fn seed_scenario_while_loop_doubles_to_128() {
        let result = run_source("t.rasp", "(var r 2) (while (< r 100) (set r (* r 2))) r").unwrap();
        assert_eq!(result.to_string(), "128");
    }

    #[test]
    fn seed_scenario_recursive_sum() {
        let result = run_source(
            "t.rasp",
            "(defun recurse (n) (if (<= n 0) 0) (if (> n 0) (+ n (recurse (- n 1))))) (recurse 10)",
        )
        .unwrap();
        assert_eq!(result.to_string(), "55");
    }

    #[test]
    fn seed_scenario_divide_by_zero() {
        let err = run_source("t.rasp", "(/ 42 0)").unwrap_err();
        assert!(err.error.to_string().contains("divide by zero"));
    }

    #[test]
    fn seed_scenario_undefined_identifier() {
        let err = run_source("t.rasp", "undefinedVariable").unwrap_err();
        assert!(matches!(err.error, RaspError::ParseError { .. }));
        assert!(err.error.to_string().contains("Identifier 'undefinedVariable' not defined"));
    }

    #[test]
    fn seed_scenario_duplicate_else_is_rejected() {
        let err = run_source("t.rasp", "(if true 1 else 2 else 3)").unwrap_err();
        assert!(matches!(err.error, RaspError::ParseError { .. }));
    }

    #[test]
    fn empty_source_evaluates_to_nil() {
        let result = run_source("t.rasp", "").unwrap();
        assert_eq!(result.to_string(), "nil");
    }

    #[test]
    fn session_carries_declarations_across_multiple_run_calls() {
        let mut session = Session::new();
        session.run("t.rasp", "(var persisted 7)").unwrap();
        let result = session.run("t.rasp", "persisted").unwrap();
        assert_eq!(result.to_string(), "7");
    }
}
