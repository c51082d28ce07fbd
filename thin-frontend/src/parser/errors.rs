//! Parse error types for the script parser

use crate::lexer::Token;
use thin_common::{CompilerError, SourceLocation};

/// Parse error types specific to the parser
#[derive(Debug, Clone)]
pub enum ParseError {
    UnexpectedToken {
        expected: String,
        found: Token,
    },
    UnexpectedEndOfFile {
        expected: String,
        location: SourceLocation,
    },
    /// Nesting past [`MAX_DEPTH`](super::MAX_DEPTH)
    TooDeep {
        location: SourceLocation,
    },
}

impl From<ParseError> for CompilerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnexpectedToken { expected, found } => CompilerError::parse_error(
                format!("Expected {}, found {}", expected, found.token_type),
                found.span.start,
            ),
            ParseError::UnexpectedEndOfFile { expected, location } => CompilerError::parse_error(
                format!("Unexpected end of file, expected {expected}"),
                location,
            ),
            ParseError::TooDeep { location } => {
                CompilerError::parse_error("Expression nested too deeply".to_string(), location)
            }
        }
    }
}
