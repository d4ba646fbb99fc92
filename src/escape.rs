//! Escape tables shared by the lexer (unescaping string literals) and the
//! diagnostic printer (re-escaping them). Grounded on
//! `examples/original_source/Rasp/src/escape.h`: only `\\`, `\"`, `\n` are
//! supported escapes.

/// True if `c` is a character that may legally follow a backslash in a
/// string literal.
pub fn needs_escaping(c: char) -> bool {
    matches!(c, '\\' | '"' | 'n')
}

/// True if `c` itself needs to be re-escaped when printing a string in
/// diagnostic form.
pub fn needs_reescaping(c: char) -> bool {
    matches!(c, '\\' | '"' | '\n')
}

/// Converts an escape-sequence character (the one following `\`) into its
/// literal replacement.
pub fn unescape(c: char) -> char {
    match c {
        '\\' => '\\',
        '"' => '"',
        'n' => '\n',
        other => other,
    }
}

/// Converts a literal character into the character that follows `\` to
/// re-produce it.
pub fn reescape(c: char) -> char {
    match c {
        '\\' => '\\',
        '"' => '"',
        '\n' => 'n',
        other => other,
    }
}

/// Re-escapes `text` for diagnostic printing, wrapping it in double quotes.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if needs_reescaping(c) {
            out.push('\\');
            out.push(reescape(c));
        } else {
            out.push(c);
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_roundtrips_reescape() {
        for c in ['\\', '"', '\n'] {
            assert_eq!(unescape(reescape(c)), c);
        }
    }

    #[test]
    fn quote_wraps_and_escapes() {
        assert_eq!(quote("hi"), "\"hi\"");
        assert_eq!(quote("a\nb"), "\"a\\nb\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn needs_escaping_rejects_unknown_sequences() {
        assert!(!needs_escaping('t'));
        assert!(needs_escaping('n'));
    }
}
