//! Run-time binding environment (spec §3 "Bindings", §4.5). A per-activation
//! record: an owned local map, a shared pointer to the process-wide global
//! map, and an optional captured-values map for closures. Grounded on
//! `examples/original_source/Rasp/src/bindings.h`/`.cpp`'s `Bindings` class
//! (`get`/`set`/`init`/`initLocal` over a `RefType` of Local/Global/Closure).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::{new_cell, BindingCell, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Local,
    Global,
    Closure,
}

pub type GlobalMap = Rc<RefCell<HashMap<String, BindingCell>>>;

pub struct Bindings {
    locals: HashMap<String, BindingCell>,
    globals: GlobalMap,
    closure: Option<Rc<HashMap<String, BindingCell>>>,
}

impl Bindings {
    pub fn new(globals: GlobalMap) -> Self {
        Bindings {
            locals: HashMap::new(),
            globals,
            closure: None,
        }
    }

    pub fn with_closure(globals: GlobalMap, closure: Rc<HashMap<String, BindingCell>>) -> Self {
        Bindings {
            locals: HashMap::new(),
            globals,
            closure: Some(closure),
        }
    }

    pub fn globals(&self) -> &GlobalMap {
        &self.globals
    }

    fn cell(&self, kind: RefKind, name: &str) -> Option<BindingCell> {
        match kind {
            RefKind::Local => self.locals.get(name).cloned(),
            RefKind::Global => self.globals.borrow().get(name).cloned(),
            RefKind::Closure => self.closure.as_ref().and_then(|c| c.get(name).cloned()),
        }
    }

    pub fn get(&self, kind: RefKind, name: &str, location: &SourceLocation) -> Result<Value, Traced> {
        match self.cell(kind, name) {
            Some(cell) => Ok(cell.borrow().clone()),
            None => Err(RaspError::internal(format!(
                "Expected binding not found: '{name}' at {location}"
            ))
            .into()),
        }
    }

    /// Returns the shared cell backing `name`, for `InitClosure` to stash as
    /// a capture reference.
    pub fn get_cell(&self, kind: RefKind, name: &str) -> Result<BindingCell, Traced> {
        self.cell(kind, name)
            .ok_or_else(|| RaspError::internal(format!("Expected binding not found: '{name}'")).into())
    }

    /// Cascading lookup (local → closure → global) used by `InitClosure`,
    /// which does not know at compile time whether the identifier it is
    /// capturing is itself a Local, Closure, or Global binding in the
    /// enclosing frame.
    pub fn get_cell_any(&self, name: &str) -> Result<BindingCell, Traced> {
        self.cell(RefKind::Local, name)
            .or_else(|| self.cell(RefKind::Closure, name))
            .or_else(|| self.cell(RefKind::Global, name))
            .ok_or_else(|| RaspError::internal(format!("Expected binding not found: '{name}'")).into())
    }

    /// Binds `name` to `value` in the given scope. The name must not already
    /// be bound there — the compiler's scope stack is responsible for
    /// preventing this at compile time, so violation here is an internal
    /// error, not a user-facing one.
    pub fn init(&mut self, kind: RefKind, name: &str, value: Value) -> Result<(), Traced> {
        let map = match kind {
            RefKind::Local => &mut self.locals,
            RefKind::Global => {
                let mut globals = self.globals.borrow_mut();
                if globals.contains_key(name) {
                    return Err(RaspError::internal(format!(
                        "Cannot initialise an already bound global identifier: '{name}'"
                    ))
                    .into());
                }
                globals.insert(name.to_string(), new_cell(value));
                return Ok(());
            }
            RefKind::Closure => {
                return Err(RaspError::internal("Cannot initialise a closure-scoped identifier").into())
            }
        };
        if map.contains_key(name) {
            return Err(RaspError::internal(format!(
                "Cannot initialise an already bound local identifier: '{name}'"
            ))
            .into());
        }
        map.insert(name.to_string(), new_cell(value));
        Ok(())
    }

    /// Updates an existing binding in place (through its shared cell), so
    /// closures observing the same cell see the mutation.
    pub fn assign(&mut self, kind: RefKind, name: &str, value: Value) -> Result<(), Traced> {
        match self.cell(kind, name) {
            Some(cell) => {
                *cell.borrow_mut() = value;
                Ok(())
            }
            None => Err(RaspError::internal(format!(
                "Cannot assign an unbound identifier: '{name}'"
            ))
            .into()),
        }
    }
}

/// Seeds the global map from host-registered name/value pairs
/// (spec §3: "populated once by the host-function registrar").
pub fn globals_from(entries: impl IntoIterator<Item = (Identifier, Value)>) -> GlobalMap {
    let mut map = HashMap::new();
    for (identifier, value) in entries {
        map.insert(identifier.into_string(), new_cell(value));
    }
    Rc::new(RefCell::new(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new("t", 1)
    }

    #[test]
    fn init_then_get_round_trips() {
        let globals = globals_from([]);
        let mut bindings = Bindings::new(globals);
        bindings.init(RefKind::Local, "x", Value::Number(1)).unwrap();
        assert_eq!(bindings.get(RefKind::Local, "x", &loc()).unwrap().to_string(), "1");
    }

    #[test]
    fn init_twice_fails() {
        let globals = globals_from([]);
        let mut bindings = Bindings::new(globals);
        bindings.init(RefKind::Local, "x", Value::Number(1)).unwrap();
        assert!(bindings.init(RefKind::Local, "x", Value::Number(2)).is_err());
    }

    #[test]
    fn assign_requires_existing_binding() {
        let globals = globals_from([]);
        let mut bindings = Bindings::new(globals);
        assert!(bindings.assign(RefKind::Local, "x", Value::Number(1)).is_err());
        bindings.init(RefKind::Local, "x", Value::Number(1)).unwrap();
        bindings.assign(RefKind::Local, "x", Value::Number(9)).unwrap();
        assert_eq!(bindings.get(RefKind::Local, "x", &loc()).unwrap().to_string(), "9");
    }

    #[test]
    fn get_cell_any_cascades_local_then_closure_then_global() {
        let globals = globals_from([(Identifier::new("g"), Value::Number(1))]);
        let mut bindings = Bindings::new(globals);
        bindings.get_cell_any("g").expect("falls through to global");
        bindings.init(RefKind::Local, "x", Value::Number(2)).unwrap();
        bindings.get_cell_any("x").expect("found locally");
        assert!(bindings.get_cell_any("missing").is_err());
    }

    #[test]
    fn shared_cell_makes_mutation_visible_through_closure_map() {
        let globals = globals_from([]);
        let mut outer = Bindings::new(globals.clone());
        outer.init(RefKind::Local, "c", Value::Number(1)).unwrap();
        let cell = outer.get_cell(RefKind::Local, "c").unwrap();

        let mut closure_map = HashMap::new();
        closure_map.insert("c".to_string(), cell);
        let closure_map = Rc::new(closure_map);

        let mut inner = Bindings::with_closure(globals, closure_map);
        inner.assign(RefKind::Closure, "c", Value::Number(42)).unwrap();

        assert_eq!(outer.get(RefKind::Local, "c", &loc()).unwrap().to_string(), "42");
    }
}
