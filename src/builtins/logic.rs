//! Boolean builtins (spec §6): unary `!`, N-ary `&&`/`||` folds. Grounded on
//! `examples/TrevorS-lisp-llm-sandbox/src/builtins/logic.rs` for the
//! fold-with-minimum-arity shape, restricted to `Boolean` operands per
//! spec.md (the teacher's `and`/`or` accepted any truthy value).

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::Value;

use super::entry;

fn as_boolean(value: &Value) -> Result<bool, Traced> {
    match value {
        Value::Boolean(b) => Ok(*b),
        other => Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("expected a boolean, found a {}", other.type_name()),
        )
        .into()),
    }
}

fn not(args: &[Value]) -> Result<Value, Traced> {
    if args.len() != 1 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'!' requires exactly 1 argument, got {}", args.len()),
        )
        .into());
    }
    Ok(Value::Boolean(!as_boolean(&args[0])?))
}

fn and(args: &[Value]) -> Result<Value, Traced> {
    if args.len() < 2 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'&&' requires at least 2 arguments, got {}", args.len()),
        )
        .into());
    }
    let mut result = true;
    for arg in args {
        result &= as_boolean(arg)?;
    }
    Ok(Value::Boolean(result))
}

fn or(args: &[Value]) -> Result<Value, Traced> {
    if args.len() < 2 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'||' requires at least 2 arguments, got {}", args.len()),
        )
        .into());
    }
    let mut result = false;
    for arg in args {
        result |= as_boolean(arg)?;
    }
    Ok(Value::Boolean(result))
}

pub(super) fn register(entries: &mut Vec<(Identifier, Value)>) {
    entries.push(entry("!", not));
    entries.push(entry("&&", and));
    entries.push(entry("||", or));
}

pub(super) fn names(names: &mut Vec<Identifier>) {
    for name in ["!", "&&", "||"] {
        names.push(Identifier::new(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_negates() {
        assert_eq!(not(&[Value::Boolean(true)]).unwrap().to_string(), "false");
    }

    #[test]
    fn and_folds_requiring_all_true() {
        assert_eq!(
            and(&[Value::Boolean(true), Value::Boolean(true), Value::Boolean(false)])
                .unwrap()
                .to_string(),
            "false"
        );
    }

    #[test]
    fn or_folds_requiring_any_true() {
        assert_eq!(
            or(&[Value::Boolean(false), Value::Boolean(false), Value::Boolean(true)])
                .unwrap()
                .to_string(),
            "true"
        );
    }

    #[test]
    fn rejects_non_boolean_operand() {
        assert!(and(&[Value::Number(1), Value::Boolean(true)]).is_err());
    }
}
