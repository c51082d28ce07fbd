//! Script Lexer
//!
//! Tokenizes script source into a stream of tokens. Whitespace and `//` line
//! comments are skipped; operators are matched longest first.

pub mod literals;
pub mod token;

pub use token::{Token, TokenType};

use std::collections::HashMap;
use thin_common::{CompilerError, SourceLocation, SourceSpan};

/// Script Lexer
pub struct Lexer {
    pub(crate) input: Vec<char>,
    pub(crate) position: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    /// Create a new lexer
    pub fn new(input: &str) -> Self {
        let keywords = [
            ("def", TokenType::Def),
            ("if", TokenType::If),
            ("else", TokenType::Else),
            ("while", TokenType::While),
            ("return", TokenType::Return),
        ];

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords: keywords.into_iter().collect(),
        }
    }

    /// Get current character
    pub(crate) fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    /// Peek ahead n characters
    pub(crate) fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    /// Advance to next character
    pub(crate) fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        SourceLocation::new_simple(self.line, self.column)
    }

    /// Skip whitespace and line comments
    fn skip_trivia(&mut self) {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char(1) == Some('/') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// Tokenize an identifier or keyword
    fn tokenize_identifier(&mut self) -> TokenType {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match self.keywords.get(identifier.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenType::Identifier(identifier),
        }
    }

    /// Consume the current character as `token`
    fn single(&mut self, token: TokenType) -> TokenType {
        self.advance();
        token
    }

    /// Consume the current character and pick `double` if the next one is
    /// `second`, otherwise `single`
    fn one_or_two(&mut self, second: char, double: TokenType, single: TokenType) -> TokenType {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Get next token
    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_trivia();

        let start_location = self.current_location();

        let token_type = match self.current_char() {
            None => TokenType::EndOfFile,

            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.tokenize_identifier(),
            Some(ch) if ch.is_ascii_digit() => self.tokenize_integer()?,
            Some('\'') => self.tokenize_char_literal()?,
            Some('"') => self.tokenize_string_literal()?,

            Some('&') => self.one_or_two('&', TokenType::AmpersandAmpersand, TokenType::Ampersand),
            Some('|') => self.one_or_two('|', TokenType::PipePipe, TokenType::Pipe),
            Some('=') => self.one_or_two('=', TokenType::EqualEqual, TokenType::Equal),

            Some('!') => {
                if self.peek_char(1) != Some('=') {
                    return Err(CompilerError::lexer_error(
                        "Unexpected character: !".to_string(),
                        start_location,
                    ));
                }
                self.advance();
                self.advance();
                TokenType::BangEqual
            }

            Some('<') => {
                self.advance();
                match self.current_char() {
                    Some('<') => self.single(TokenType::LeftShift),
                    Some('=') => self.single(TokenType::LessEqual),
                    _ => TokenType::Less,
                }
            }

            Some('>') => {
                self.advance();
                match self.current_char() {
                    Some('>') => self.single(TokenType::RightShift),
                    Some('=') => self.single(TokenType::GreaterEqual),
                    _ => TokenType::Greater,
                }
            }

            Some('+') => self.single(TokenType::Plus),
            Some('-') => self.single(TokenType::Minus),
            Some('*') => self.single(TokenType::Star),
            Some('/') => self.single(TokenType::Slash),
            Some('%') => self.single(TokenType::Percent),
            Some('^') => self.single(TokenType::Caret),
            Some('?') => self.single(TokenType::Question),
            Some(':') => self.single(TokenType::Colon),
            Some('(') => self.single(TokenType::LeftParen),
            Some(')') => self.single(TokenType::RightParen),
            Some('{') => self.single(TokenType::LeftBrace),
            Some('}') => self.single(TokenType::RightBrace),
            Some('[') => self.single(TokenType::LeftBracket),
            Some(']') => self.single(TokenType::RightBracket),
            Some(';') => self.single(TokenType::Semicolon),
            Some(',') => self.single(TokenType::Comma),
            Some('.') => self.single(TokenType::Dot),

            Some(ch) => {
                return Err(CompilerError::lexer_error(
                    format!("Unexpected character: {ch}"),
                    start_location,
                ));
            }
        };

        let end_location = self.current_location();
        Ok(Token::new(token_type, SourceSpan::new(start_location, end_location)))
    }

    /// Tokenize entire input into a vector of tokens ending with `EndOfFile`
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token()?;
            let is_eof = token.token_type == TokenType::EndOfFile;
            tokens.push(token);

            if is_eof {
                break;
            }
        }

        log::trace!("Lexed {} tokens", tokens.len());
        Ok(tokens)
    }
}
