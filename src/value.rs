//! The runtime value model (spec §3). A tagged sum with container variants
//! that deep-copy on `Clone`, and a `Function` variant that is cheap to
//! clone via `Rc`-wrapped bodies (spec §9: "wrap non-trivial function bodies
//! in a reference-counted handle to avoid deep copying instruction lists").
//!
//! Grounded on `examples/TrevorS-lisp-llm-sandbox/src/value.rs` for the
//! enum-of-variants shape and `Display` style, and on
//! `examples/original_source/Rasp/src/value.h`/`function.h` for the exact
//! variant set (Nil/Boolean/Number/String/Array/Object/Function/TypeDefinition)
//! and the three Function flavors plus Closure.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{RaspError, Traced};
use crate::escape;
use crate::identifier::Identifier;
use crate::instruction::Instruction;
use crate::location::SourceLocation;

/// A shared, mutable slot holding a `Value`. Backs every local/global
/// binding so that `InitClosure` can take a stable handle that survives the
/// defining frame's return — this is the reference-cell capture model spec
/// §9 resolves the Capture-vs-Close ambiguity to.
pub type BindingCell = Rc<RefCell<Value>>;

pub fn new_cell(value: Value) -> BindingCell {
    Rc::new(RefCell::new(value))
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(i64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(Function),
    TypeDefinition(Rc<TypeDefinition>),
}

#[derive(Debug)]
pub struct TypeDefinition {
    pub name: String,
    pub members: Vec<String>,
}

/// The call context a `NativeFunction` receives: arguments plus a handle
/// back into the running interpreter (for recursive calls, e.g. `map`-style
/// host functions invoking a Rasp closure).
pub struct CallContext<'a> {
    pub arguments: &'a [Value],
    pub interpreter: &'a mut crate::interpreter::Interpreter,
}

pub type NativeFn = fn(CallContext) -> Result<Value, Traced>;
pub type NativePureFn = fn(&[Value]) -> Result<Value, Traced>;

pub struct NativeFunction {
    pub name: String,
    pub location: SourceLocation,
    pub func: NativeFn,
}

pub struct NativePureFunction {
    pub name: String,
    pub location: SourceLocation,
    pub func: NativePureFn,
}

#[derive(Debug)]
pub struct InternalFunction {
    pub name: String,
    pub location: SourceLocation,
    pub parameters: Vec<Identifier>,
    pub instructions: Vec<Instruction>,
}

#[derive(Debug)]
pub struct Closure {
    pub inner: Function,
    /// Captured bindings by name — shared cells, so mutation through the
    /// closure is visible to whichever scope still holds the same cell.
    pub captured: Vec<(Identifier, BindingCell)>,
}

#[derive(Clone)]
pub enum Function {
    Native(Rc<NativeFunction>),
    NativePure(Rc<NativePureFunction>),
    Internal(Rc<InternalFunction>),
    Closure(Rc<Closure>),
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function: {}>", self.name())
    }
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Native(f) => &f.name,
            Function::NativePure(f) => &f.name,
            Function::Internal(f) => &f.name,
            Function::Closure(c) => c.inner.name(),
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Function::Native(f) => &f.location,
            Function::NativePure(f) => &f.location,
            Function::Internal(f) => &f.location,
            Function::Closure(c) => c.inner.location(),
        }
    }
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(_) => true,
            Value::Function(_) => true,
            Value::TypeDefinition(_) => true,
        }
    }

    pub fn is_falsey(&self) -> bool {
        !self.is_truthy()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::TypeDefinition(_) => "type",
        }
    }

    /// Value equality (spec §3): elementwise/by-content for plain data,
    /// ExecutionError for Function or TypeDefinition operands regardless of
    /// identity.
    pub fn equals(&self, other: &Value, location: &SourceLocation) -> Result<bool, Traced> {
        match (self, other) {
            (Value::Function(_), _) | (_, Value::Function(_)) => {
                Err(RaspError::execution(location.clone(), "Comparing functions is not supported").into())
            }
            (Value::TypeDefinition(_), _) | (_, Value::TypeDefinition(_)) => {
                Err(RaspError::execution(location.clone(), "Comparing types is not supported").into())
            }
            (Value::Nil, Value::Nil) => Ok(true),
            (Value::Boolean(a), Value::Boolean(b)) => Ok(a == b),
            (Value::Number(a), Value::Number(b)) => Ok(a == b),
            (Value::String(a), Value::String(b)) => Ok(a == b),
            (Value::Array(a), Value::Array(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    if !x.equals(y, location)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Value::Object(a), Value::Object(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (k, v) in a {
                    match b.get(k) {
                        Some(other_v) if v.equals(other_v, location)? => {}
                        _ => return Ok(false),
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The "raw contents" form used by `print`/`concat` (spec §6): strings
    /// print without quotes, everything else matches the diagnostic form.
    pub fn display_human(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{}", escape::quote(s)),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Object(members) => {
                write!(f, "{{")?;
                for (i, (key, value)) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key} = {value}")?;
                }
                write!(f, "}}")
            }
            Value::Function(function) => write!(f, "<function: {}>", function.name()),
            Value::TypeDefinition(typedef) => write!(f, "<type: {}>", typedef.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::new("t.rasp", 1)
    }

    #[test]
    fn truthiness_matches_spec_table() {
        assert!(Value::Nil.is_falsey());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Boolean(false).is_falsey());
        assert!(Value::Number(0).is_falsey());
        assert!(Value::Number(1).is_truthy());
        assert!(Value::String(String::new()).is_falsey());
        assert!(Value::String("x".into()).is_truthy());
        assert!(Value::Array(vec![]).is_falsey());
        assert!(Value::Object(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn equals_is_elementwise_for_arrays() {
        let a = Value::Array(vec![Value::Number(1), Value::Number(2)]);
        let b = Value::Array(vec![Value::Number(1), Value::Number(2)]);
        let c = Value::Array(vec![Value::Number(1), Value::Number(3)]);
        assert!(a.equals(&b, &loc()).unwrap());
        assert!(!a.equals(&c, &loc()).unwrap());
    }

    #[test]
    fn equals_never_raises_for_mismatched_non_function_variants() {
        assert!(!Value::Nil.equals(&Value::Number(0), &loc()).unwrap());
    }

    #[test]
    fn function_equality_raises_execution_error() {
        let f = Function::Internal(Rc::new(InternalFunction {
            name: "f".into(),
            location: loc(),
            parameters: vec![],
            instructions: vec![],
        }));
        let result = Value::Function(f.clone()).equals(&Value::Function(f), &loc());
        assert!(result.is_err());
    }

    #[test]
    fn display_diagnostic_vs_human_form_for_strings() {
        let v = Value::String("hi".into());
        assert_eq!(v.to_string(), "\"hi\"");
        assert_eq!(v.display_human(), "hi");
    }

    #[test]
    fn display_array_and_object_forms() {
        let arr = Value::Array(vec![Value::Number(1), Value::Number(2)]);
        assert_eq!(arr.to_string(), "[1, 2]");

        let mut obj = BTreeMap::new();
        obj.insert("id".to_string(), Value::Number(1));
        assert_eq!(Value::Object(obj).to_string(), "{id = 1}");
    }
}
