//! Type-related builtins (spec §6): `is_nil`, `assert`, `new`, and
//! `try_convert_string_to_int`. `new` is the only stdlib function that
//! constructs an Object from a `TypeDefinition` Value, grounded on
//! `original_source/Rasp/src/value.h`'s `Type::Object` shape (a plain
//! member-name → Value mapping, no identity beyond its TypeDefinition's
//! member list).

use std::collections::BTreeMap;

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::Value;

use super::entry;

fn is_nil(args: &[Value]) -> Result<Value, Traced> {
    if args.len() != 1 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'is_nil' requires exactly 1 argument, got {}", args.len()),
        )
        .into());
    }
    Ok(Value::Boolean(matches!(args[0], Value::Nil)))
}

fn assert(args: &[Value]) -> Result<Value, Traced> {
    if args.is_empty() || args.len() > 2 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            "'assert' requires a condition and an optional message",
        )
        .into());
    }
    if args[0].is_falsey() {
        let message = match args.get(1) {
            Some(message) => format!("Assertion failed: {}", message.display_human()),
            None => "Assertion failed".to_string(),
        };
        return Err(RaspError::execution(SourceLocation::unknown(), message).into());
    }
    Ok(Value::Nil)
}

fn new(args: &[Value]) -> Result<Value, Traced> {
    let (type_def, fields) = args.split_first().ok_or_else(|| {
        Traced::from(RaspError::execution(SourceLocation::unknown(), "'new' requires a type argument"))
    })?;
    let Value::TypeDefinition(type_def) = type_def else {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'new' expects a type, found a {}", type_def.type_name()),
        )
        .into());
    };
    if fields.len() != type_def.members.len() {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!(
                "'{}' expects {} member value(s) but got {}",
                type_def.name,
                type_def.members.len(),
                fields.len()
            ),
        )
        .into());
    }

    let mut object = BTreeMap::new();
    for (member_name, value) in type_def.members.iter().zip(fields) {
        object.insert(member_name.clone(), value.clone());
    }
    Ok(Value::Object(object))
}

fn try_convert_string_to_int(args: &[Value]) -> Result<Value, Traced> {
    if args.len() != 1 {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'try_convert_string_to_int' requires exactly 1 argument, got {}", args.len()),
        )
        .into());
    }
    let Value::String(text) = &args[0] else {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'try_convert_string_to_int' expects a string, found a {}", args[0].type_name()),
        )
        .into());
    };
    Ok(match text.trim().parse::<i64>() {
        Ok(n) => Value::Number(n),
        Err(_) => Value::Nil,
    })
}

pub(super) fn register(entries: &mut Vec<(Identifier, Value)>) {
    entries.push(entry("is_nil", is_nil));
    entries.push(entry("assert", assert));
    entries.push(entry("new", new));
    entries.push(entry("try_convert_string_to_int", try_convert_string_to_int));
}

pub(super) fn names(names: &mut Vec<Identifier>) {
    for name in ["is_nil", "assert", "new", "try_convert_string_to_int"] {
        names.push(Identifier::new(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TypeDefinition;
    use std::rc::Rc;

    #[test]
    fn is_nil_detects_nil_only() {
        assert_eq!(is_nil(&[Value::Nil]).unwrap().to_string(), "true");
        assert_eq!(is_nil(&[Value::Number(0)]).unwrap().to_string(), "false");
    }

    #[test]
    fn assert_passes_through_on_truthy_condition() {
        assert!(assert(&[Value::Boolean(true)]).is_ok());
    }

    #[test]
    fn assert_fails_on_falsey_condition_with_message() {
        let err = assert(&[Value::Boolean(false), Value::String("bad state".into())]).unwrap_err();
        assert!(err.error.to_string().contains("bad state"));
    }

    #[test]
    fn new_builds_an_object_from_a_type_definition() {
        let type_def = Value::TypeDefinition(Rc::new(TypeDefinition {
            name: "Person".into(),
            members: vec!["id".into(), "name".into()],
        }));
        let result = new(&[type_def, Value::Number(1), Value::String("Alice".into())]).unwrap();
        assert_eq!(result.to_string(), r#"{id = 1, name = "Alice"}"#);
    }

    #[test]
    fn new_rejects_arity_mismatch() {
        let type_def = Value::TypeDefinition(Rc::new(TypeDefinition {
            name: "Person".into(),
            members: vec!["id".into()],
        }));
        assert!(new(&[type_def, Value::Number(1), Value::Number(2)]).is_err());
    }

    #[test]
    fn try_convert_string_to_int_returns_nil_on_failure() {
        assert_eq!(
            try_convert_string_to_int(&[Value::String("not a number".into())]).unwrap().to_string(),
            "nil"
        );
        assert_eq!(
            try_convert_string_to_int(&[Value::String("42".into())]).unwrap().to_string(),
            "42"
        );
    }
}
