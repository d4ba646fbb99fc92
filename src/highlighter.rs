//! REPL syntax highlighting. Implements rustyline's `Highlighter` trait to
//! colorize Rasp source as it is typed. Grounded on
//! `examples/TrevorS-lisp-llm-sandbox/src/highlighter.rs`'s character-by-
//! character tokenizer, trimmed to Rasp's keyword/builtin sets (no `#t`/`#f`,
//! no quote/quasiquote syntax, no floating-point literals).

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;
use std::collections::HashSet;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m";
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m";
const COLOR_BUILTIN: &str = "\x1b[36m";
const COLOR_NUMBER: &str = "\x1b[33m";
const COLOR_STRING: &str = "\x1b[32m";
const COLOR_BOOLEAN: &str = "\x1b[33m";
const COLOR_COMMENT: &str = "\x1b[90m";

pub struct RaspHelper;

impl RaspHelper {
    pub fn new() -> Self {
        RaspHelper
    }
}

impl Default for RaspHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for RaspHelper {}

impl Completer for RaspHelper {
    type Candidate = String;
}

impl Hinter for RaspHelper {
    type Hint = String;
}

impl Validator for RaspHelper {}

impl Highlighter for RaspHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let special_forms = special_forms();
        let builtins = builtins();
        let highlighted = highlight_line(line, &special_forms, &builtins);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn highlight_line(line: &str, special_forms: &HashSet<&'static str>, builtins: &HashSet<&'static str>) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '/' if i + 1 < chars.len() && (chars[i + 1] == '/' || chars[i + 1] == '*') => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
            }
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let num: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num);
                result.push_str(COLOR_RESET);
            }
            '-' if i + 1 < chars.len() && chars[i + 1].is_ascii_digit() => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let num: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num);
                result.push_str(COLOR_RESET);
            }
            '(' | ')' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }
            c if c.is_whitespace() => {
                result.push(c);
                i += 1;
            }
            _ => {
                let start = i;
                while i < chars.len() && !is_boundary(chars[i]) {
                    i += 1;
                }
                let symbol: String = chars[start..i].iter().collect();
                if symbol == "true" || symbol == "false" || symbol == "nil" {
                    result.push_str(COLOR_BOOLEAN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if special_forms.contains(symbol.as_str()) {
                    result.push_str(COLOR_SPECIAL_FORM);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(symbol.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&symbol);
                }
            }
        }
    }

    result
}

fn is_boundary(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')' || c == '"'
}

fn special_forms() -> HashSet<&'static str> {
    ["while", "if", "else", "var", "set", "inc", "type", "defun"]
        .iter()
        .copied()
        .collect()
}

fn builtins() -> HashSet<&'static str> {
    [
        "+", "-", "*", "/", "%", "<", ">", "<=", ">=", "==", "!=", "&&", "||", "!", "print",
        "println", "concat", "format", "array_new", "array_length", "array_element",
        "array_set_element", "is_nil", "assert", "new", "read_line", "time",
    ]
    .iter()
    .copied()
    .collect()
}
