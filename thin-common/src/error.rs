//! Error handling for the Thin compiler
//!
//! Every stage reports failures through [`CompilerError`]. Errors are fatal:
//! a single error aborts the compilation and no artifact is written.

use crate::source_loc::{SourceLocation, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type that encompasses all phases of compilation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Lexical error at {location}: {message}")]
    LexError {
        location: SourceLocation,
        message: String,
    },

    #[error("Parse error at {location}: {message}")]
    ParseError {
        location: SourceLocation,
        message: String,
    },

    #[error("Semantic error at {location}: {message}")]
    SemanticError {
        location: SourceLocation,
        message: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a lexer error
    pub fn lexer_error(message: String, location: SourceLocation) -> Self {
        CompilerError::LexError { location, message }
    }

    /// Create a parse error
    pub fn parse_error(message: String, location: SourceLocation) -> Self {
        CompilerError::ParseError { location, message }
    }

    /// Create a semantic (lowering) error
    pub fn semantic_error(message: String, location: SourceLocation) -> Self {
        CompilerError::SemanticError { location, message }
    }

    /// Create a validation error
    pub fn validation_error(message: String) -> Self {
        CompilerError::ValidationError { message }
    }

    /// Source location of the error, when the stage that produced it had one
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            CompilerError::LexError { location, .. }
            | CompilerError::ParseError { location, .. }
            | CompilerError::SemanticError { location, .. } => Some(location),
            CompilerError::ValidationError { .. }
            | CompilerError::IoError { .. }
            | CompilerError::InternalError { .. } => None,
        }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
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

/// A diagnostic message with optional location and severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Option<SourceSpan>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: String, span: Option<SourceSpan>) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
            notes: Vec::new(),
        }
    }

    pub fn warning(message: String, span: Option<SourceSpan>) -> Self {
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
        write!(f, "{}: {}", self.severity, self.message)?;

        for note in &self.notes {
            write!(f, "\n  note: {}", note)?;
        }

        Ok(())
    }
}

/// Error reporter for collecting and displaying diagnostics
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

    /// Record a diagnostic, updating the counters
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diagnostic);
    }

    /// Report a fatal compiler error
    pub fn report(&mut self, error: &CompilerError) {
        let span = error.location().cloned().map(SourceSpan::from_location);
        let mut diagnostic = Diagnostic::error(error.to_string(), span);

        if let CompilerError::ValidationError { .. } = error {
            diagnostic = diagnostic.with_note("the module was rejected before code generation".to_string());
        }

        self.push(diagnostic);
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

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => format!("{} warning{}", w, plural(w)),
            (e, 0) => format!("{} error{}", e, plural(e)),
            (e, w) => format!("{} error{} and {} warning{}", e, plural(e), w, plural(w)),
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CompilerError::parse_error(
            "Expected ), found ;".to_string(),
            SourceLocation::new_simple(2, 14),
        );
        assert_eq!(err.to_string(), "Parse error at <input>:2:14: Expected ), found ;");

        let err = CompilerError::validation_error("Function main: Invalid local index: 3".to_string());
        assert_eq!(err.to_string(), "Validation error: Function main: Invalid local index: 3");
        assert!(err.location().is_none());
    }

    #[test]
    fn test_reporter_counts_and_notes() {
        let mut reporter = ErrorReporter::new();
        assert!(!reporter.has_errors());

        reporter.report(&CompilerError::validation_error("bad".to_string()));
        assert!(reporter.has_errors());
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.diagnostics()[0].notes.len(), 1);
        assert!(reporter.diagnostics()[0].span.is_none());

        reporter.report(&CompilerError::semantic_error(
            "duplicate".to_string(),
            SourceLocation::new_simple(1, 1),
        ));
        assert!(reporter.diagnostics()[1].span.is_some());
    }

    #[test]
    fn test_summary() {
        let mut reporter = ErrorReporter::new();
        assert_eq!(reporter.summary(), "No errors or warnings");

        reporter.push(Diagnostic::error("Error 1".to_string(), None));
        assert_eq!(reporter.summary(), "1 error");

        reporter.push(Diagnostic::error("Error 2".to_string(), None));
        reporter.push(Diagnostic::warning("Warning 1".to_string(), None));
        assert_eq!(reporter.summary(), "2 errors and 1 warning");
        assert_eq!(reporter.warning_count(), 1);
    }

    #[test]
    fn test_diagnostic_with_notes() {
        let diag = Diagnostic::error("Test error".to_string(), None)
            .with_note("first".to_string())
            .with_note("second".to_string());

        assert_eq!(format!("{}", diag), "error: Test error\n  note: first\n  note: second");
    }
}
