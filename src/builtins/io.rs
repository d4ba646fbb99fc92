//! I/O builtins (spec §6): `read_line`, `time`. The only two stdlib
//! functions that touch the host environment rather than pure data.
//! `time` follows the teacher's general preference for `std::time` over a
//! vendored clock crate; `read_line` has no teacher precedent (the
//! teacher's `src/builtins/console.rs` only ever writes to stdout via
//! `builtin_print`/`builtin_println` — it never reads stdin), so this is
//! plain `std::io::stdin().lock().read_line` on its own merits.

use std::io::BufRead;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{RaspError, Traced};
use crate::identifier::Identifier;
use crate::location::SourceLocation;
use crate::value::Value;

use super::entry;

fn read_line(args: &[Value]) -> Result<Value, Traced> {
    if !args.is_empty() {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'read_line' takes no arguments, got {}", args.len()),
        )
        .into());
    }
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line);
    match read {
        Ok(0) => Ok(Value::Nil),
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Ok(Value::String(line))
        }
        Err(e) => Err(RaspError::execution(SourceLocation::unknown(), format!("failed to read stdin: {e}")).into()),
    }
}

fn time(args: &[Value]) -> Result<Value, Traced> {
    if !args.is_empty() {
        return Err(RaspError::execution(
            SourceLocation::unknown(),
            format!("'time' takes no arguments, got {}", args.len()),
        )
        .into());
    }
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| RaspError::execution(SourceLocation::unknown(), format!("system clock error: {e}")))?
        .as_secs();
    Ok(Value::Number(secs as i64))
}

pub(super) fn register(entries: &mut Vec<(Identifier, Value)>) {
    entries.push(entry("read_line", read_line));
    entries.push(entry("time", time));
}

pub(super) fn names(names: &mut Vec<Identifier>) {
    for name in ["read_line", "time"] {
        names.push(Identifier::new(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_returns_a_positive_number() {
        let result = time(&[]).unwrap();
        match result {
            Value::Number(n) => assert!(n > 0),
            _ => panic!("expected a Number"),
        }
    }

    #[test]
    fn read_line_rejects_arguments() {
        assert!(read_line(&[Value::Number(1)]).is_err());
    }
}
