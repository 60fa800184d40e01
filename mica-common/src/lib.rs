//! Mica Compiler - Common Types and Diagnostics
//!
//! Shared infrastructure for the Mica compiler crates: source location
//! tracking and the diagnostic/error reporting machinery.

pub mod error;
pub mod source_loc;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use source_loc::{SourceLocation, SourceSpan};
