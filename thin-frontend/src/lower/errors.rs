//! Lowering error types

use thin_common::{CompilerError, SourceLocation};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoweringError {
    #[error("The global name \"{name}\" is already defined")]
    DuplicateGlobal { name: String, location: SourceLocation },

    #[error("The argument name \"{name}\" is already defined")]
    DuplicateArgument { name: String, location: SourceLocation },

    #[error("The argument name \"{name}\" is already defined globally")]
    ArgumentShadowsGlobal { name: String, location: SourceLocation },

    #[error("Invalid {what}: expected a name, found {found}")]
    InvalidName {
        what: &'static str,
        found: &'static str,
        location: SourceLocation,
    },

    #[error("Must initialize global variable \"{name}\" to a constant")]
    NonConstantGlobal { name: String, location: SourceLocation },

    #[error("Invalid top-level {found}: expected a global variable or a function")]
    InvalidGlobal { found: &'static str, location: SourceLocation },

    #[error("Nested functions are not supported")]
    NestedFunction { location: SourceLocation },

    #[error("Invalid assignment target: {found}")]
    InvalidAssignmentTarget { found: &'static str, location: SourceLocation },

    #[error("Invalid call target: {found}")]
    InvalidCallTarget { found: &'static str, location: SourceLocation },

    #[error("Cannot indirectly reference function: {name}")]
    FunctionAsValue { name: String, location: SourceLocation },

    #[error("Cannot call variable: {name}")]
    CallToVariable { name: String, location: SourceLocation },

    #[error("The function \"{name}\" takes {expected} arguments, got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        location: SourceLocation,
    },

    #[error("Integer literal out of range: {value}")]
    IntegerOutOfRange { value: i64, location: SourceLocation },
}

impl LoweringError {
    pub fn location(&self) -> &SourceLocation {
        match self {
            LoweringError::DuplicateGlobal { location, .. }
            | LoweringError::DuplicateArgument { location, .. }
            | LoweringError::ArgumentShadowsGlobal { location, .. }
            | LoweringError::InvalidName { location, .. }
            | LoweringError::NonConstantGlobal { location, .. }
            | LoweringError::InvalidGlobal { location, .. }
            | LoweringError::NestedFunction { location }
            | LoweringError::InvalidAssignmentTarget { location, .. }
            | LoweringError::InvalidCallTarget { location, .. }
            | LoweringError::FunctionAsValue { location, .. }
            | LoweringError::CallToVariable { location, .. }
            | LoweringError::ArgumentCount { location, .. }
            | LoweringError::IntegerOutOfRange { location, .. } => location,
        }
    }
}

impl From<LoweringError> for CompilerError {
    fn from(err: LoweringError) -> Self {
        let location = err.location().clone();
        CompilerError::semantic_error(err.to_string(), location)
    }
}
