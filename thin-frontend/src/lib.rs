//! Thin Compiler - Frontend
//!
//! This crate turns script source into an IR module:
//! - Lexer: tokenizes script source
//! - Parser: builds the untyped syntax tree by precedence climbing
//! - Lowering: resolves names and lays out the data segment, producing IR

pub mod lexer;
pub mod lower;
pub mod parser;

pub use lexer::{Lexer, Token, TokenType};
pub use lower::{lower_program, LoweringError, LoweringOptions};
pub use parser::{BinaryOp, Expression, ExpressionKind, ParseError, Parser, Program};

use thin_common::CompilerError;
use thin_ir::Module;

/// High-level frontend interface
pub struct Frontend;

impl Frontend {
    /// Parse script source into a syntax tree
    pub fn parse_source(source: &str) -> Result<Program, CompilerError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;

        let mut parser = Parser::new(tokens);
        parser.parse_program()
    }

    /// Compile script source to an (unvalidated) IR module
    pub fn compile_to_ir(source: &str, options: &LoweringOptions) -> Result<Module, CompilerError> {
        let program = Self::parse_source(source)?;
        lower_program(&program, options)
    }

    /// Tokenize source code (for debugging)
    pub fn tokenize_source(source: &str) -> Result<Vec<Token>, CompilerError> {
        let mut lexer = Lexer::new(source);
        lexer.tokenize()
    }
}
