//! Compile-time scope stack (spec §3 "Scope stack", §7 classification).
//! Grounded on `examples/original_source/Rasp/src/bindings.h`/`.cpp`'s
//! `Declarations`/`Scope`: an innermost-first vector of scopes, each a flat
//! set of declared identifiers.

use crate::identifier::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Local,
    Closure,
    Global,
    Undefined,
}

#[derive(Debug, Default, Clone)]
struct Scope {
    declared: Vec<Identifier>,
}

impl Scope {
    fn add(&mut self, identifier: Identifier) {
        self.declared.push(identifier);
    }

    fn is_defined(&self, identifier: &Identifier) -> bool {
        self.declared.contains(identifier)
    }
}

/// Innermost-first stack of scopes. Index 0 is always the current
/// function's locals; the last entry is always the process-wide globals.
#[derive(Debug, Clone)]
pub struct Declarations {
    scopes: Vec<Scope>,
}

impl Declarations {
    /// Seeds a fresh stack with a single scope containing the given
    /// globally-registered names.
    pub fn with_globals<I: IntoIterator<Item = Identifier>>(globals: I) -> Self {
        let mut global_scope = Scope::default();
        for name in globals {
            global_scope.add(name);
        }
        Declarations {
            scopes: vec![global_scope],
        }
    }

    /// Pushes a new innermost scope (entering a function body).
    pub fn push_scope(&mut self) {
        self.scopes.insert(0, Scope::default());
    }

    /// Pops the innermost scope (leaving a function body).
    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.remove(0);
    }

    /// Declares `identifier` in the innermost scope.
    pub fn declare(&mut self, identifier: Identifier) {
        self.scopes[0].add(identifier);
    }

    pub fn is_defined(&self, identifier: &Identifier) -> bool {
        self.classify(identifier) != Classification::Undefined
    }

    pub fn classify(&self, identifier: &Identifier) -> Classification {
        let last = self.scopes.len() - 1;
        for (i, scope) in self.scopes.iter().enumerate() {
            if scope.is_defined(identifier) {
                return if i == last {
                    Classification::Global
                } else if i == 0 {
                    Classification::Local
                } else {
                    Classification::Closure
                };
            }
        }
        Classification::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Identifier {
        Identifier::new(s)
    }

    #[test]
    fn global_only_scope_classifies_as_global() {
        let decl = Declarations::with_globals([id("print")]);
        assert_eq!(decl.classify(&id("print")), Classification::Global);
        assert_eq!(decl.classify(&id("missing")), Classification::Undefined);
    }

    #[test]
    fn innermost_scope_classifies_as_local() {
        let mut decl = Declarations::with_globals([id("print")]);
        decl.push_scope();
        decl.declare(id("x"));
        assert_eq!(decl.classify(&id("x")), Classification::Local);
        assert_eq!(decl.classify(&id("print")), Classification::Global);
    }

    #[test]
    fn intermediate_scope_classifies_as_closure() {
        let mut decl = Declarations::with_globals([id("print")]);
        decl.push_scope();
        decl.declare(id("outer_var"));
        decl.push_scope();
        decl.declare(id("inner_var"));
        assert_eq!(decl.classify(&id("outer_var")), Classification::Closure);
        assert_eq!(decl.classify(&id("inner_var")), Classification::Local);
    }

    #[test]
    fn pop_scope_restores_previous_view() {
        let mut decl = Declarations::with_globals::<[Identifier; 0]>([]);
        decl.push_scope();
        decl.declare(id("x"));
        decl.pop_scope();
        assert_eq!(decl.classify(&id("x")), Classification::Undefined);
    }
}
