//! Source location: a (filename, line) pair attached to tokens, instructions, and errors.

use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    filename: Rc<str>,
    line: u32,
}

impl SourceLocation {
    pub fn new(filename: impl Into<Rc<str>>, line: u32) -> Self {
        SourceLocation {
            filename: filename.into(),
            line,
        }
    }

    pub fn unknown() -> Self {
        SourceLocation::new("<unknown>", 0)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}
