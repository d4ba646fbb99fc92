//! Arithmetic builtins (spec §6): N-ary folds for `+`/`*`, binary `-`/`/`/`%`.
//! Grounded on `examples/TrevorS-lisp-llm-sandbox/src/builtins/arithmetic.rs`
//! for the fold-over-args shape; divisor-zero handling is new per spec.md
//! (the teacher used floats and never raised on division by zero).

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

fn require_min_args(args: &[Value], min: usize, name: &str) -> Result<(), Traced> {
    if args.len() < min {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'{name}' requires at least {min} argument(s), got {}", args.len()),
        )
        .into());
    }
    Ok(())
}

fn require_exact_args(args: &[Value], n: usize, name: &str) -> Result<(), Traced> {
    if args.len() != n {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'{name}' requires exactly {n} argument(s), got {}", args.len()),
        )
        .into());
    }
    Ok(())
}

fn add(args: &[Value]) -> Result<Value, Traced> {
    require_min_args(args, 2, "+")?;
    let mut total: i64 = 0;
    for arg in args {
        total += as_number(arg)?;
    }
    Ok(Value::Number(total))
}

fn multiply(args: &[Value]) -> Result<Value, Traced> {
    require_min_args(args, 2, "*")?;
    let mut total: i64 = 1;
    for arg in args {
        total *= as_number(arg)?;
    }
    Ok(Value::Number(total))
}

fn subtract(args: &[Value]) -> Result<Value, Traced> {
    require_exact_args(args, 2, "-")?;
    Ok(Value::Number(as_number(&args[0])? - as_number(&args[1])?))
}

fn divide(args: &[Value]) -> Result<Value, Traced> {
    require_exact_args(args, 2, "/")?;
    let (a, b) = (as_number(&args[0])?, as_number(&args[1])?);
    if b == 0 {
        return Err(RaspError::execution(SourceLocation::unknown(), "divide by zero").into());
    }
    Ok(Value::Number(a / b))
}

fn modulo(args: &[Value]) -> Result<Value, Traced> {
    require_exact_args(args, 2, "%")?;
    let (a, b) = (as_number(&args[0])?, as_number(&args[1])?);
    if b == 0 {
        return Err(RaspError::execution(SourceLocation::unknown(), "divide by zero").into());
    }
    Ok(Value::Number(a % b))
}

pub(super) fn register(entries: &mut Vec<(Identifier, Value)>) {
    entries.push(entry("+", add));
    entries.push(entry("*", multiply));
    entries.push(entry("-", subtract));
    entries.push(entry("/", divide));
    entries.push(entry("%", modulo));
}

pub(super) fn names(names: &mut Vec<Identifier>) {
    for name in ["+", "*", "-", "/", "%"] {
        names.push(Identifier::new(name));
    }
}
