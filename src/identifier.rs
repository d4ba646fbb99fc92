//! A validated identifier name. Grounded on
//! `examples/original_source/Rasp/src/identifier.cpp`: a fixed whitelist of
//! operator names, or `[A-Za-z][A-Za-z0-9_]*`.

use std::fmt;

const OPERATOR_WHITELIST: &[&str] = &[
    "+", "-", "/", "*", "%", "<", ">", "==", "!=", "<=", ">=", "&&", "||", "!",
];

/// An identifier that has already been checked against [`Identifier::is_valid`].
///
/// Constructing one from text that fails the check is a programmer error,
/// not a user-facing one — the lexer and compiler only ever build these from
/// text they have already classified, so failure here means a bug in this
/// crate, not in the source program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// Builds an `Identifier`, panicking if `name` is not valid.
    ///
    /// Use this only where the caller is certain `name` already passed
    /// [`Identifier::is_valid`] (e.g. the lexer classified it as such).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        assert!(
            Identifier::is_valid(&name),
            "illegal attempt to construct an invalid identifier '{name}'"
        );
        Identifier(name)
    }

    pub fn is_valid(name: &str) -> bool {
        if OPERATOR_WHITELIST.contains(&name) {
            return true;
        }

        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }

        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_alpha_alnum_underscore_names() {
        assert!(Identifier::is_valid("x"));
        assert!(Identifier::is_valid("countDown"));
        assert!(Identifier::is_valid("a_1"));
    }

    #[test]
    fn accepts_operator_whitelist() {
        for op in OPERATOR_WHITELIST {
            assert!(Identifier::is_valid(op), "{op} should be valid");
        }
    }

    #[test]
    fn rejects_leading_digit_and_empty() {
        assert!(!Identifier::is_valid("1x"));
        assert!(!Identifier::is_valid(""));
        assert!(!Identifier::is_valid("has space"));
    }

    #[test]
    #[should_panic]
    fn new_panics_on_invalid_name() {
        Identifier::new("1bad");
    }
}
