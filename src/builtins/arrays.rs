//! Array builtins (spec §6): `array_new`, `array_length`, `array_element`,
//! `array_set_element`. Arrays are value types (spec §3: "container variants
//! deep-copy on copy"), so `array_set_element` returns a new array with the
//! element replaced rather than mutating in place — callers combine it with
//! `set` to rebind the variable, mirroring how `inc` composes `+` with
//! `set` rather than mutating through a reference.

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::Value;

use super::entry;

fn as_array(value: &Value) -> Result<&Vec<Value>, Traced> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("expected an array, found a {}", other.type_name()),
        )
        .into()),
    }
}

fn as_index(value: &Value, len: usize) -> Result<usize, Traced> {
    match value {
        Value::Number(n) if *n >= 0 && (*n as usize) < len => Ok(*n as usize),
        Value::Number(n) => Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("array index {n} out of bounds for length {len}"),
        )
        .into()),
        other => Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("expected a numeric index, found a {}", other.type_name()),
        )
        .into()),
    }
}

fn array_new(args: &[Value]) -> Result<Value, Traced> {
    if args.len() != 2 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'array_new' requires exactly 2 arguments, got {}", args.len()),
        )
        .into());
    }
    let Value::Number(count) = &args[0] else {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'array_new' expects a numeric length, found a {}", args[0].type_name()),
        )
        .into());
    };
    if *count < 0 {
        return Err(RaspError::execution(SourceLocation::unknown(), "'array_new' length must not be negative").into());
    }
    Ok(Value::Array(vec![args[1].clone(); *count as usize]))
}

fn array_length(args: &[Value]) -> Result<Value, Traced> {
    if args.len() != 1 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'array_length' requires exactly 1 argument, got {}", args.len()),
        )
        .into());
    }
    Ok(Value::Number(as_array(&args[0])?.len() as i64))
}

fn array_element(args: &[Value]) -> Result<Value, Traced> {
    if args.len() != 2 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'array_element' requires exactly 2 arguments, got {}", args.len()),
        )
        .into());
    }
    let items = as_array(&args[0])?;
    let index = as_index(&args[1], items.len())?;
    Ok(items[index].clone())
}

fn array_set_element(args: &[Value]) -> Result<Value, Traced> {
    if args.len() != 3 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'array_set_element' requires exactly 3 arguments, got {}", args.len()),
        )
        .into());
    }
    let items = as_array(&args[0])?;
    let index = as_index(&args[1], items.len())?;
    let mut updated = items.clone();
    updated[index] = args[2].clone();
    Ok(Value::Array(updated))
}

pub(super) fn register(entries: &mut Vec<(Identifier, Value)>) {
    entries.push(entry("array_new", array_new));
    entries.push(entry("array_length", array_length));
    entries.push(entry("array_element", array_element));
    entries.push(entry("array_set_element", array_set_element));
}

pub(super) fn names(names: &mut Vec<Identifier>) {
    for name in ["array_new", "array_length", "array_element", "array_set_element"] {
        names.push(Identifier::new(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_new_fills_with_default() {
        let result = array_new(&[Value::Number(3), Value::Number(0)]).unwrap();
        assert_eq!(result.to_string(), "[0, 0, 0]");
    }

    #[test]
    fn array_length_counts_elements() {
        let arr = Value::Array(vec![Value::Number(1), Value::Number(2)]);
        assert_eq!(array_length(&[arr]).unwrap().to_string(), "2");
    }

    #[test]
    fn array_element_reads_by_index() {
        let arr = Value::Array(vec![Value::Number(10), Value::Number(20)]);
        assert_eq!(array_element(&[arr, Value::Number(1)]).unwrap().to_string(), "20");
    }

    #[test]
    fn array_element_rejects_out_of_bounds_index() {
        let arr = Value::Array(vec![Value::Number(10)]);
        assert!(array_element(&[arr, Value::Number(5)]).is_err());
    }

    #[test]
    fn array_set_element_returns_a_new_array_leaving_original_untouched() {
        let original = Value::Array(vec![Value::Number(1), Value::Number(2)]);
        let updated = array_set_element(&[original.clone(), Value::Number(0), Value::Number(99)]).unwrap();
        assert_eq!(updated.to_string(), "[99, 2]");
        assert_eq!(original.to_string(), "[1, 2]");
    }
}
