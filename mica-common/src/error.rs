//! Error handling for the Mica compiler
//!
//! This module defines the compiler-wide error type and the diagnostic
//! reporting machinery. Semantic analysis is fail-fast: the first error is
//! recorded in the `ErrorReporter` and the analysis pass unwinds through the
//! `Result` chain. Warnings (deprecation) are recorded without unwinding.

use crate::source_loc::{SourceLocation, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Semantic error at {location}: {message}")]
    Semantic {
        location: SourceLocation,
        message: String,
    },

    #[error("Type error at {location}: {message}")]
    Type {
        location: SourceLocation,
        message: String,
    },

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl CompilerError {
    pub fn semantic_error(message: String, location: SourceLocation) -> Self {
        CompilerError::Semantic { location, message }
    }

    pub fn type_error(message: String, location: SourceLocation) -> Self {
        CompilerError::Type { location, message }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::Io {
            message: err.to_string(),
        }
    }
}

impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::Internal { message }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with location and severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: SourceSpan,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
        }
    }

    pub fn warning(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.severity, self.message)?;

        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }

        Ok(())
    }
}

/// Collects diagnostics and maintains the error/warning counters.
///
/// The counter is the observable half of the fail-fast contract: every
/// aborted analysis pass leaves exactly one error recorded here.
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
        }
    }

    /// Record an error diagnostic
    pub fn error(&mut self, message: String, span: SourceSpan) -> &mut Diagnostic {
        let diagnostic = Diagnostic::error(message, span);
        self.diagnostics.push(diagnostic);
        self.error_count += 1;
        self.diagnostics.last_mut().unwrap()
    }

    /// Record a warning diagnostic
    pub fn warning(&mut self, message: String, span: SourceSpan) -> &mut Diagnostic {
        let diagnostic = Diagnostic::warning(message, span);
        self.diagnostics.push(diagnostic);
        self.warning_count += 1;
        self.diagnostics.last_mut().unwrap()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.error_count = 0;
        self.warning_count = 0;
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (e, 0) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (e, w) => format!(
                "{} error{} and {} warning{}",
                e,
                if e == 1 { "" } else { "s" },
                w,
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
