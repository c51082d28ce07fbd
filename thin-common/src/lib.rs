//! Thin Compiler - Common Types and Utilities
//!
//! This crate contains the error definitions and source location types
//! shared by the frontend, the IR validator, the backends and the driver.

pub mod error;
pub mod source_loc;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use source_loc::{SourceLocation, SourceSpan};
