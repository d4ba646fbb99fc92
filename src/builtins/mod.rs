//! Host-provided standard library (spec §6 "Standard-library surface").
//! Interfaces only as far as spec.md's core is concerned — the language
//! pipeline depends only on these names existing in the global mapping at
//! start-up, never on their implementation. Grounded on
//! `examples/TrevorS-lisp-llm-sandbox/src/builtins/mod.rs`'s per-category
//! module layout (arithmetic/comparison/logic/...).

mod arithmetic;
mod arrays;
mod comparison;
mod io;
mod logic;
mod strings;
mod types;

use std::rc::Rc;

use crate::bindings::{globals_from, GlobalMap};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::{Function, NativePureFunction, Value};

fn entry(name: &str, func: crate::value::NativePureFn) -> (Identifier, Value) {
    let function = Function::NativePure(Rc::new(NativePureFunction {
        name: name.to_string(),
        location: SourceLocation::unknown(),
        func,
    }));
    (Identifier::new(name), Value::Function(function))
}

/// Builds the process-wide global mapping seeded with every standard
/// library name spec §6 requires. This is the only place that name ↔
/// implementation bindings happen; the compiler's `Declarations` is seeded
/// from the same name list (see `names()`).
pub fn register() -> GlobalMap {
    let mut entries = Vec::new();
    arithmetic::register(&mut entries);
    comparison::register(&mut entries);
    logic::register(&mut entries);
    types::register(&mut entries);
    strings::register(&mut entries);
    arrays::register(&mut entries);
    io::register(&mut entries);
    globals_from(entries)
}

/// The full set of standard-library names, for seeding the compiler's
/// top-level `Declarations` scope before compiling source that calls them.
pub fn names() -> Vec<Identifier> {
    let mut names = Vec::new();
    arithmetic::names(&mut names);
    comparison::names(&mut names);
    logic::names(&mut names);
    types::names(&mut names);
    strings::names(&mut names);
    arrays::names(&mut names);
    io::names(&mut names);
    names
}
