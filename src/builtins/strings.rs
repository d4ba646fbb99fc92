//! String/printing builtins (spec §6): `print`, `println`, `concat`,
//! `format`. All render arguments via `Value::display_human` (spec's
//! "human form" — strings print without quotes). Grounded on
//! `examples/TrevorS-lisp-llm-sandbox/src/builtins/console.rs` for the
//! print/println split.

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::Value;

use super::entry;

fn joined(args: &[Value]) -> String {
    args.iter().map(Value::display_human).collect::<Vec<_>>().concat()
}

fn print(args: &[Value]) -> Result<Value, Traced> {
    print!("{}", joined(args));
    Ok(Value::Nil)
}

fn println(args: &[Value]) -> Result<Value, Traced> {
    println!("{}", joined(args));
    Ok(Value::Nil)
}

fn concat(args: &[Value]) -> Result<Value, Traced> {
    Ok(Value::String(joined(args)))
}

/// Replaces each `{}` placeholder in the template (first argument) with the
/// corresponding remaining argument's human-readable form, in order.
fn format(args: &[Value]) -> Result<Value, Traced> {
    let (template, rest) = args.split_first().ok_or_else(|| {
        Traced::from(RaspError::execution(SourceLocation::unknown(), "'format' requires a template string"))
    })?;
    let Value::String(template) = template else {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'format' expects a string template, found a {}", template.type_name()),
        )
        .into());
    };

    let mut result = String::new();
    let mut values = rest.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' && chars.peek() == Some(&'}') {
            chars.next();
            match values.next() {
                Some(value) => result.push_str(&value.display_human()),
                None => {
                    return Err(RaspError::execution(
                        SourceLocation::unknown(),
                        "'format' has more placeholders than arguments",
                    )
                    .into())
                }
            }
        } else {
            result.push(c);
        }
    }
    Ok(Value::String(result))
}

pub(super) fn register(entries: &mut Vec<(Identifier, Value)>) {
    entries.push(entry("print", print));
    entries.push(entry("println", println));
    entries.push(entry("concat", concat));
    entries.push(entry("format", format));
}

pub(super) fn names(names: &mut Vec<Identifier>) {
    for name in ["print", "println", "concat", "format"] {
        names.push(Identifier::new(name));
    }
}
