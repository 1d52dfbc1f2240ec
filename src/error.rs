//! # Source locations and accumulating error lists
//!
//! A `Location` identifies a point in source text; an `AsmError` pairs a
//! message with one. Every pipeline stage (scanner, parser, analyzer,
//! emitter) appends to a shared `ErrorList` rather than returning on the
//! first problem, so a single run reports as many issues as it can find.
//!
//! The `Display` text of `ErrorList`/`AsmError` is a golden-test contract
//! (see `tests/golden_suite.rs`) — it is not cosmetic and must not drift.

use std::fmt;

/// A position in a named source file.
///
/// Equality is never required of a `Location`; it exists only to produce
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file_name: String,
    pub line: usize,
    pub byte_offset: usize,
}

impl Location {
    pub fn new(file_name: impl Into<String>, line: usize, byte_offset: usize) -> Self {
        Self {
            file_name: file_name.into(),
            line,
            byte_offset,
        }
    }
}

/// A single diagnostic, optionally anchored to a `Location`.
#[derive(Debug, Clone, PartialEq)]
pub struct AsmError {
    pub location: Option<Location>,
    pub message: String,
}

impl AsmError {
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location: Some(location),
            message: message.into(),
        }
    }

    pub fn without_location(message: impl Into<String>) -> Self {
        Self {
            location: None,
            message: message.into(),
        }
    }
}

/// Errors from one pipeline stage, tagged with a `kind` ("Syntax" or
/// "Emit") that prefixes each rendered line.
#[derive(Debug, Clone)]
pub struct ErrorList {
    pub kind: &'static str,
    errors: Vec<AsmError>,
}

impl ErrorList {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            errors: Vec::new(),
        }
    }

    pub fn push(&mut self, location: Location, message: impl Into<String>) {
        self.errors.push(AsmError::new(location, message));
    }

    pub fn push_unlocated(&mut self, message: impl Into<String>) {
        self.errors.push(AsmError::without_location(message));
    }

    pub fn extend(&mut self, other: ErrorList) {
        self.errors.extend(other.errors);
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AsmError> {
        self.errors.iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match &e.location {
                Some(loc) => write!(
                    f,
                    "{} error ({}: {}): {}",
                    self.kind, loc.file_name, loc.line, e.message
                )?,
                None => write!(f, "{} error: {}", self.kind, e.message)?,
            }
        }
        Ok(())
    }
}
