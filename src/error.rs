//! Structured errors for the Rasp pipeline. Grounded on the teacher's
//! `thiserror`-based `EvalError` (`examples/TrevorS-lisp-llm-sandbox/src/error.rs`)
//! for style, and on `examples/original_source/Rasp/src/exceptions.h` /
//! `execution_error.h` / `interpreter.cpp`'s `buildStackTrace` for the four
//! error kinds and the call-frame stack-trace augmentation.

use thiserror::Error;

use crate::location::SourceLocation;

/// The four error kinds the pipeline can raise (spec §7).
#[derive(Error, Debug, Clone)]
pub enum RaspError {
    #[error("{location}: {message}")]
    LexError {
        location: SourceLocation,
        message: String,
    },

    #[error("{location}: {message}")]
    ParseError {
        location: SourceLocation,
        message: String,
    },

    #[error("{location}: {message}")]
    ExecutionError {
        location: SourceLocation,
        message: String,
    },

    /// An invariant the compiler should have enforced failed at run time —
    /// this indicates a bug in this crate, not in the source program.
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl RaspError {
    pub fn lex(location: SourceLocation, message: impl Into<String>) -> Self {
        RaspError::LexError {
            location,
            message: message.into(),
        }
    }

    pub fn parse(location: SourceLocation, message: impl Into<String>) -> Self {
        RaspError::ParseError {
            location,
            message: message.into(),
        }
    }

    pub fn execution(location: SourceLocation, message: impl Into<String>) -> Self {
        RaspError::ExecutionError {
            location,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RaspError::InternalError {
            message: message.into(),
        }
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            RaspError::LexError { location, .. }
            | RaspError::ParseError { location, .. }
            | RaspError::ExecutionError { location, .. } => Some(location),
            RaspError::InternalError { .. } => None,
        }
    }
}

/// Wraps a [`RaspError`] with the leaf-to-root call trace accumulated as it
/// propagates out through nested `Call` instructions. Each function boundary
/// it passes through pushes a `" at function: NAME"` frame, mirroring
/// `original_source/Rasp/src/interpreter.cpp`'s `buildStackTrace`.
#[derive(Debug, Clone)]
pub struct Traced {
    pub error: RaspError,
    pub trace: Vec<String>,
}

impl Traced {
    pub fn new(error: RaspError) -> Self {
        Traced {
            error,
            trace: Vec::new(),
        }
    }

    /// Pushes a call-frame entry. Called by the interpreter as an error
    /// unwinds through a `Call` dispatch.
    pub fn push_frame(&mut self, function_name: &str, location: &SourceLocation) {
        self.trace
            .push(format!("{location}: at function: {function_name}"));
    }
}

impl From<RaspError> for Traced {
    fn from(error: RaspError) -> Self {
        Traced::new(error)
    }
}

impl std::fmt::Display for Traced {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.error)?;
        for frame in &self.trace {
            writeln!(f, "  {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Traced {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

pub type RaspResult<T> = Result<T, Traced>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message_and_location() {
        let err = RaspError::execution(SourceLocation::new("f.rasp", 3), "divide by zero");
        assert_eq!(format!("{err}"), "f.rasp:3: divide by zero");
    }

    #[test]
    fn push_frame_accumulates_trace() {
        let mut traced = Traced::new(RaspError::internal("boom"));
        traced.push_frame("inner", &SourceLocation::new("f.rasp", 1));
        traced.push_frame("outer", &SourceLocation::new("f.rasp", 5));
        assert_eq!(traced.trace.len(), 2);
        assert!(traced.trace[0].contains("inner"));
        assert!(traced.trace[1].contains("outer"));
    }

    #[test]
    fn internal_error_has_no_location() {
        let err = RaspError::internal("bug");
        assert!(err.location().is_none());
    }
}
