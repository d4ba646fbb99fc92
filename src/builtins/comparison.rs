//! Comparison builtins (spec §6): binary `< > <= >= == !=`. Grounded on
//! `examples/TrevorS-lisp-llm-sandbox/src/builtins/comparison.rs` for the
//! binary-operator shape; `==`/`!=` delegate to `Value::equals`, which is
//! where function/type comparisons raise per spec §3.

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::Value;

use super::entry;

fn as_number(value: &Value) -> Result<i64, Traced> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("expected a number, found a {}", other.type_name()),
        )
        .into()),
    }
}

fn require_two(args: &[Value], name: &str) -> Result<(), Traced> {
    if args.len() != 2 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'{name}' requires exactly 2 arguments, got {}", args.len()),
        )
        .into());
    }
    Ok(())
}

fn less_than(args: &[Value]) -> Result<Value, Traced> {
    require_two(args, "<")?;
    Ok(Value::Boolean(as_number(&args[0])? < as_number(&args[1])?))
}

fn greater_than(args: &[Value]) -> Result<Value, Traced> {
    require_two(args, ">")?;
    Ok(Value::Boolean(as_number(&args[0])? > as_number(&args[1])?))
}

fn less_or_equal(args: &[Value]) -> Result<Value, Traced> {
    require_two(args, "<=")?;
    Ok(Value::Boolean(as_number(&args[0])? <= as_number(&args[1])?))
}

fn greater_or_equal(args: &[Value]) -> Result<Value, Traced> {
    require_two(args, ">=")?;
    Ok(Value::Boolean(as_number(&args[0])? >= as_number(&args[1])?))
}

fn equal(args: &[Value]) -> Result<Value, Traced> {
    require_two(args, "==")?;
    Ok(Value::Boolean(args[0].equals(&args[1], &SourceLocation::unknown())?))
}

fn not_equal(args: &[Value]) -> Result<Value, Traced> {
    require_two(args, "!=")?;
    Ok(Value::Boolean(!args[0].equals(&args[1], &SourceLocation::unknown())?))
}

pub(super) fn register(entries: &mut Vec<(Identifier, Value)>) {
    entries.push(entry("<", less_than));
    entries.push(entry(">", greater_than));
    entries.push(entry("<=", less_or_equal));
    entries.push(entry(">=", greater_or_equal));
    entries.push(entry("==", equal));
    entries.push(entry("!=", not_equal));
}

pub(super) fn names(names: &mut Vec<Identifier>) {
    for name in ["<", ">", "<=", ">=", "==", "!="] {
        names.push(Identifier::new(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_than_compares_numbers() {
        assert_eq!(less_than(&[Value::Number(1), Value::Number(2)]).unwrap().to_string(), "true");
    }

    #[test]
    fn equal_matches_by_value() {
        assert_eq!(equal(&[Value::Number(2), Value::Number(2)]).unwrap().to_string(), "true");
        assert_eq!(not_equal(&[Value::Number(2), Value::Number(3)]).unwrap().to_string(), "true");
    }

    #[test]
    fn equal_on_functions_raises_execution_error() {
        use crate::value::{Function, InternalFunction};
        use std::rc::Rc;
        let f = Function::Internal(Rc::new(InternalFunction {
            name: "f".into(),
            location: SourceLocation::unknown(),
            parameters: vec![],
            instructions: vec![],
        }));
        let err = equal(&[Value::Function(f.clone()), Value::Function(f)]).unwrap_err();
        assert!(matches!(err.error, RaspError::ExecutionError { .. }));
    }
}
