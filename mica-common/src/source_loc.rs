//! Source location tracking for error reporting
//!
//! Every expression node carries a span so diagnostics can point at the
//! offending construct. Locations are 1-based; line/column 0 means the
//! location is synthetic (compiler-generated nodes).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }

    /// Location with the default filename (common pattern in tests)
    pub fn new_simple(line: u32, column: u32) -> Self {
        Self::new("<input>", line, column)
    }

    /// A synthetic location for compiler-generated nodes
    pub fn synthetic() -> Self {
        Self::new("<generated>", 0, 0)
    }

    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// A span in a source file (from start to end location)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Create a span covering a single location
    pub fn from_location(location: SourceLocation) -> Self {
        Self {
            end: location.clone(),
            start: location,
        }
    }

    /// Span for compiler-generated nodes
    pub fn synthetic() -> Self {
        Self::from_location(SourceLocation::synthetic())
    }

    pub fn same_file(&self, other: &SourceSpan) -> bool {
        self.start.filename == other.start.filename
    }

    /// Extend this span to include another span
    pub fn extend(&self, other: &SourceSpan) -> SourceSpan {
        if !self.same_file(other) {
            return self.clone();
        }

        let start = if self.start.line < other.start.line
            || (self.start.line == other.start.line && self.start.column <= other.start.column)
        {
            self.start.clone()
        } else {
            other.start.clone()
        };

        let end = if self.end.line > other.end.line
            || (self.end.line == other.end.line && self.end.column >= other.end.column)
        {
            self.end.clone()
        } else {
            other.end.clone()
        };

        SourceSpan::new(start, end)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.filename != self.end.filename {
            write!(f, "{} to {}", self.start, self.end)
        } else if self.start.line == self.end.line {
            if self.start.column == self.end.column {
                write!(f, "{}:{}", self.start.filename, self.start.line)
            } else {
                write!(
                    f,
                    "{}:{}:{}-{}",
                    self.start.filename, self.start.line, self.start.column, self.end.column
                )
            }
        } else {
            write!(
                f,
                "{}:{}:{}-{}:{}",
                self.start.filename,
                self.start.line,
                self.start.column,
                self.end.line,
                self.end.column
            )
        }
    }
}

/// Trait for types that have a source location
pub trait HasSpan {
    fn span(&self) -> SourceSpan;
}
