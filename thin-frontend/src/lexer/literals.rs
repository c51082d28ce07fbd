//! Literal parsing for the script lexer
//!
//! Integer, character and string literals. Escapes inside character and
//! string literals use a backslash; `\n`, `\t`, `\r` and `\0` map to control
//! characters and any other escaped character stands for itself.

use crate::lexer::{Lexer, TokenType};
use thin_common::CompilerError;

impl Lexer {
    /// Tokenize a decimal integer literal
    pub fn tokenize_integer(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();
        let mut number = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let value = number
            .parse::<i64>()
            .map_err(|_| CompilerError::lexer_error(format!("Invalid integer literal: {number}"), start))?;

        Ok(TokenType::IntLiteral(value))
    }

    /// Read one possibly escaped character after an opening quote
    fn read_escaped(&mut self, what: &str) -> Result<char, CompilerError> {
        match self.advance() {
            Some('\\') => match self.advance() {
                Some('n') => Ok('\n'),
                Some('t') => Ok('\t'),
                Some('r') => Ok('\r'),
                Some('0') => Ok('\0'),
                Some(c) => Ok(c),
                None => Err(CompilerError::lexer_error(
                    format!("Unterminated {what} literal"),
                    self.current_location(),
                )),
            },
            Some(c) => Ok(c),
            None => Err(CompilerError::lexer_error(
                format!("Unterminated {what} literal"),
                self.current_location(),
            )),
        }
    }

    /// Tokenize a character literal
    pub fn tokenize_char_literal(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();
        self.advance(); // opening quote

        if self.current_char() == Some('\'') {
            return Err(CompilerError::lexer_error("Empty character literal".to_string(), start));
        }

        let ch = self.read_escaped("character")?;

        if self.current_char() != Some('\'') {
            return Err(CompilerError::lexer_error(
                "Unterminated character literal".to_string(),
                start,
            ));
        }

        self.advance();
        Ok(TokenType::CharLiteral(ch))
    }

    /// Tokenize a string literal
    pub fn tokenize_string_literal(&mut self) -> Result<TokenType, CompilerError> {
        let start = self.current_location();
        self.advance(); // opening quote
        let mut string = String::new();

        loop {
            match self.current_char() {
                Some('"') => {
                    self.advance();
                    return Ok(TokenType::StringLiteral(string));
                }
                Some(_) => string.push(self.read_escaped("string")?),
                None => {
                    return Err(CompilerError::lexer_error(
                        "Unterminated string literal".to_string(),
                        start,
                    ));
                }
            }
        }
    }
}
