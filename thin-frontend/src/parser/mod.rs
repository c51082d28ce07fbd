//! Script Parser
//!
//! Recursive descent over the token stream with precedence climbing for
//! infix operators. `def`, blocks, `if`, `while`, `return` and parenthesized
//! expressions are all primary expressions. Precedence levels:
//!
//! | Level | Operators |
//! |---|---|
//! | 1 | `=` (right associative), `? :` |
//! | 2 | `\|\|` |
//! | 3 | `&&` |
//! | 4 | `\|` |
//! | 5 | `&` |
//! | 6 | `^` |
//! | 7 | `==` `!=` |
//! | 8 | `<` `>` `<=` `>=` |
//! | 9 | `<<` `>>` |
//! | 10 | `+` `-` |
//! | 11 | `*` `/` `%` |
//! | 12 | `.` `[]` |
//!
//! Calls bind as postfix at every level. A `;` may follow any statement.
//!
//! Every primary expression and every operator applied within one
//! expression counts one level of nesting; past [`MAX_DEPTH`] parsing
//! fails, which bounds the recursion of every later pass.

pub mod ast;
pub mod errors;

pub use ast::{BinaryOp, Expression, ExpressionKind, Program};
pub use errors::ParseError;

use crate::lexer::{Token, TokenType};
use std::collections::VecDeque;
use std::ops::ControlFlow;
use thin_common::{CompilerError, SourceLocation};

/// Level of `=` and `? :`
const ASSIGN_LEVEL: u8 = 1;
/// Level of `.` and `[]`
const MEMBER_LEVEL: u8 = 12;

/// Deepest nesting accepted in one top-level item
pub const MAX_DEPTH: usize = 512;

/// Script Parser
pub struct Parser {
    tokens: VecDeque<Token>,
    end_location: SourceLocation,
    depth: usize,
}

impl Parser {
    /// Create a new parser over a token stream produced by the lexer
    pub fn new(tokens: Vec<Token>) -> Self {
        let end_location = tokens
            .last()
            .map(|t| t.span.end.clone())
            .unwrap_or_else(|| SourceLocation::new_simple(1, 1));

        Self {
            tokens: tokens.into(),
            end_location,
            depth: 0,
        }
    }

    fn peek_type(&self) -> &TokenType {
        self.tokens.front().map_or(&TokenType::EndOfFile, |t| &t.token_type)
    }

    /// Get current token and advance; yields `EndOfFile` forever at the end
    fn advance(&mut self) -> Token {
        match self.tokens.pop_front() {
            Some(token) => token,
            None => Token::eof(self.end_location.clone()),
        }
    }

    fn check(&self, token_type: &TokenType) -> bool {
        self.peek_type() == token_type
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType, context: &str) -> Result<Token, ParseError> {
        let token = self.advance();
        if token.token_type == token_type {
            return Ok(token);
        }

        let expected = format!("{token_type} in {context}");
        match token.token_type {
            TokenType::EndOfFile => Err(ParseError::UnexpectedEndOfFile {
                expected,
                location: token.span.start,
            }),
            _ => Err(ParseError::UnexpectedToken { expected, found: token }),
        }
    }

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program, CompilerError> {
        let mut items = Vec::new();

        while !self.check(&TokenType::EndOfFile) {
            items.push(self.statement()?);
        }

        log::debug!("Parsed {} top-level items", items.len());
        Ok(Program { items })
    }

    /// Parse a single expression
    pub fn parse_expression(&mut self) -> Result<Expression, CompilerError> {
        Ok(self.expression(0)?)
    }

    /// An expression with an optional `;` terminator
    fn statement(&mut self) -> Result<Expression, ParseError> {
        let expression = self.expression(0)?;
        self.match_token(&TokenType::Semicolon);
        Ok(expression)
    }

    /// One level deeper, or [`ParseError::TooDeep`] past the limit
    fn descend(&mut self, location: &SourceLocation) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                location: location.clone(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn expression(&mut self, level: u8) -> Result<Expression, ParseError> {
        let entry = self.depth;
        let result = self.operator_chain(level);
        self.depth = entry;
        result
    }

    fn operator_chain(&mut self, level: u8) -> Result<Expression, ParseError> {
        let mut node = self.prefix()?;
        loop {
            self.descend(&node.location)?;
            match self.infix(node, level)? {
                ControlFlow::Continue(next) => node = next,
                ControlFlow::Break(done) => return Ok(done),
            }
        }
    }

    /// Comma-separated expressions up to and including `)`
    fn arguments(&mut self, context: &str) -> Result<Vec<Expression>, ParseError> {
        let mut arguments = Vec::new();
        while !self.check(&TokenType::RightParen) {
            arguments.push(self.expression(0)?);
            if !self.match_token(&TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RightParen, context)?;
        Ok(arguments)
    }

    fn prefix(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();
        let location = token.span.start.clone();
        self.descend(&location)?;

        let kind = match token.token_type {
            TokenType::LeftParen => {
                let value = self.expression(0)?;
                self.expect(TokenType::RightParen, "parenthesized expression")?;
                return Ok(value);
            }

            TokenType::Def => {
                let name = self.prefix()?;
                self.expect(TokenType::LeftParen, "function definition")?;
                let params = self.arguments("function definition")?;
                let body = self.statement()?;
                ExpressionKind::Def {
                    name: Box::new(name),
                    params,
                    body: Box::new(body),
                }
            }

            TokenType::LeftBrace => {
                let mut items = Vec::new();
                while !self.check(&TokenType::RightBrace) && !self.check(&TokenType::EndOfFile) {
                    items.push(self.statement()?);
                }
                self.expect(TokenType::RightBrace, "block")?;
                ExpressionKind::Block(items)
            }

            TokenType::If => {
                self.expect(TokenType::LeftParen, "if")?;
                let test = self.expression(0)?;
                self.expect(TokenType::RightParen, "if")?;
                let then = self.statement()?;
                let otherwise = if self.match_token(&TokenType::Else) {
                    Some(Box::new(self.statement()?))
                } else {
                    None
                };
                ExpressionKind::If {
                    test: Box::new(test),
                    then: Box::new(then),
                    otherwise,
                }
            }

            TokenType::While => {
                self.expect(TokenType::LeftParen, "while")?;
                let test = self.expression(0)?;
                self.expect(TokenType::RightParen, "while")?;
                let body = self.statement()?;
                ExpressionKind::While {
                    test: Box::new(test),
                    body: Box::new(body),
                }
            }

            TokenType::Return => ExpressionKind::Return(Box::new(self.expression(0)?)),

            TokenType::IntLiteral(value) => ExpressionKind::IntLiteral(value),
            TokenType::CharLiteral(ch) => ExpressionKind::IntLiteral(ch as i64),
            TokenType::StringLiteral(text) => ExpressionKind::StringLiteral(text),
            TokenType::Identifier(name) => ExpressionKind::Identifier(name),

            TokenType::EndOfFile => {
                return Err(ParseError::UnexpectedEndOfFile {
                    expected: "expression".to_string(),
                    location,
                });
            }

            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "expression".to_string(),
                    found: Token::new(other, token.span),
                });
            }
        };

        Ok(Expression::new(kind, location))
    }

    /// Extend `node` with one postfix or infix operator if it binds tighter
    /// than `level`
    fn infix(&mut self, node: Expression, level: u8) -> Result<ControlFlow<Expression, Expression>, ParseError> {
        let location = node.location.clone();
        let next = self.peek_type().clone();

        let kind = match next {
            TokenType::LeftParen => {
                self.advance();
                let arguments = self.arguments("call")?;
                ExpressionKind::Call {
                    function: Box::new(node),
                    arguments,
                }
            }

            TokenType::LeftBracket if level < MEMBER_LEVEL => {
                self.advance();
                let index = self.expression(0)?;
                self.expect(TokenType::RightBracket, "index expression")?;
                ExpressionKind::Index {
                    base: Box::new(node),
                    index: Box::new(index),
                }
            }

            TokenType::Dot if level < MEMBER_LEVEL => {
                self.advance();
                let index = self.expression(MEMBER_LEVEL)?;
                ExpressionKind::Member {
                    base: Box::new(node),
                    index: Box::new(index),
                }
            }

            TokenType::Question if level <= ASSIGN_LEVEL => {
                self.advance();
                let then = self.expression(0)?;
                self.expect(TokenType::Colon, "conditional expression")?;
                let otherwise = self.expression(0)?;
                ExpressionKind::Conditional {
                    test: Box::new(node),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                }
            }

            TokenType::Equal if level < ASSIGN_LEVEL => {
                self.advance();
                let value = self.expression(0)?;
                ExpressionKind::Assign {
                    target: Box::new(node),
                    value: Box::new(value),
                }
            }

            other => match binary_op(&other) {
                Some(op) if level < op.level() => {
                    self.advance();
                    let right = self.expression(op.level())?;
                    ExpressionKind::Binary {
                        op,
                        left: Box::new(node),
                        right: Box::new(right),
                    }
                }
                _ => return Ok(ControlFlow::Break(node)),
            },
        };

        Ok(ControlFlow::Continue(Expression::new(kind, location)))
    }
}

fn binary_op(token_type: &TokenType) -> Option<BinaryOp> {
    let op = match token_type {
        TokenType::PipePipe => BinaryOp::LogicalOr,
        TokenType::AmpersandAmpersand => BinaryOp::LogicalAnd,
        TokenType::Pipe => BinaryOp::BitOr,
        TokenType::Ampersand => BinaryOp::BitAnd,
        TokenType::Caret => BinaryOp::BitXor,
        TokenType::EqualEqual => BinaryOp::Equal,
        TokenType::BangEqual => BinaryOp::NotEqual,
        TokenType::Less => BinaryOp::Less,
        TokenType::Greater => BinaryOp::Greater,
        TokenType::LessEqual => BinaryOp::LessEqual,
        TokenType::GreaterEqual => BinaryOp::GreaterEqual,
        TokenType::LeftShift => BinaryOp::LeftShift,
        TokenType::RightShift => BinaryOp::RightShift,
        TokenType::Plus => BinaryOp::Add,
        TokenType::Minus => BinaryOp::Sub,
        TokenType::Star => BinaryOp::Mul,
        TokenType::Slash => BinaryOp::Div,
        TokenType::Percent => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse_expression_from_str(input: &str) -> Result<Expression, CompilerError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(tokens);
        parser.parse_expression()
    }

    fn parse_program_from_str(input: &str) -> Result<Program, CompilerError> {
        let mut lexer = Lexer::new(input);
        let tokens = lexer.tokenize()?;
        Parser::new(tokens).parse_program()
    }

    /// Fully parenthesized rendering of the tree
    fn render(expr: &Expression) -> String {
        match &expr.kind {
            ExpressionKind::IntLiteral(v) => v.to_string(),
            ExpressionKind::StringLiteral(s) => format!("{s:?}"),
            ExpressionKind::Identifier(n) => n.clone(),
            ExpressionKind::Binary { op, left, right } => {
                format!("({:?} {} {})", op, render(left), render(right))
            }
            ExpressionKind::Assign { target, value } => format!("(= {} {})", render(target), render(value)),
            ExpressionKind::Index { base, index } => format!("([] {} {})", render(base), render(index)),
            ExpressionKind::Member { base, index } => format!("(. {} {})", render(base), render(index)),
            ExpressionKind::Conditional { test, then, otherwise } => {
                format!("(? {} {} {})", render(test), render(then), render(otherwise))
            }
            ExpressionKind::Call { function, arguments } => {
                let args: Vec<String> = arguments.iter().map(render).collect();
                format!("(call {} [{}])", render(function), args.join(" "))
            }
            ExpressionKind::Def { name, params, body } => {
                let params: Vec<String> = params.iter().map(render).collect();
                format!("(def {} [{}] {})", render(name), params.join(" "), render(body))
            }
            ExpressionKind::Block(items) => {
                let items: Vec<String> = items.iter().map(render).collect();
                format!("{{{}}}", items.join(" "))
            }
            ExpressionKind::If { test, then, otherwise } => match otherwise {
                Some(otherwise) => format!("(if {} {} {})", render(test), render(then), render(otherwise)),
                None => format!("(if {} {})", render(test), render(then)),
            },
            ExpressionKind::While { test, body } => format!("(while {} {})", render(test), render(body)),
            ExpressionKind::Return(value) => format!("(return {})", render(value)),
        }
    }

    fn rendered(input: &str) -> String {
        render(&parse_expression_from_str(input).unwrap())
    }

    #[test]
    fn test_operator_precedence() {
        assert_eq!(rendered("2 + 3 * 4"), "(Add 2 (Mul 3 4))");
        assert_eq!(rendered("1 - 2 - 3"), "(Sub (Sub 1 2) 3)");
        assert_eq!(rendered("a < b == c"), "(Equal (Less a b) c)");
        assert_eq!(rendered("a || b && c | d"), "(LogicalOr a (LogicalAnd b (BitOr c d)))");
        assert_eq!(rendered("1 << 2 + 3"), "(LeftShift 1 (Add 2 3))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(rendered("a = b = 1 + 2"), "(= a (= b (Add 1 2)))");
        assert_eq!(rendered("a = b ? c : d"), "(= a (? b c d))");
    }

    #[test]
    fn test_member_and_index() {
        assert_eq!(rendered("p.x.y"), "(. (. p x) y)");
        assert_eq!(rendered("s[i + 1]"), "([] s (Add i 1))");
        assert_eq!(rendered("p.1 + 2"), "(Add (. p 1) 2)");
        assert_eq!(rendered("p.x = 3"), "(= (. p x) 3)");
    }

    #[test]
    fn test_calls() {
        assert_eq!(rendered("f()"), "(call f [])");
        assert_eq!(rendered("f(1, g(2), 'a')"), "(call f [1 (call g [2]) 97])");
        assert_eq!(rendered("1 + f(2) * 3"), "(Add 1 (Mul (call f [2]) 3))");
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            rendered("if (x) { y = 1; } else return 2"),
            "(if x {(= y 1)} (return 2))"
        );
        assert_eq!(rendered("if (x) y; else z;"), "(if x y z)");
        assert_eq!(rendered("while (i < 10) i = i + 1"), "(while (Less i 10) (= i (Add i 1)))");
    }

    #[test]
    fn test_program_with_optional_semicolons() {
        let program = parse_program_from_str("x = 5; def add(a, b) { return a + b; } def main() add(x, 3)").unwrap();
        let items: Vec<String> = program.items.iter().map(render).collect();
        assert_eq!(
            items,
            vec![
                "(= x 5)".to_string(),
                "(def add [a b] {(return (Add a b))})".to_string(),
                "(def main [] (call add [x 3]))".to_string(),
            ]
        );
    }

    #[test]
    fn test_errors() {
        let err = parse_expression_from_str("(1 + 2").unwrap_err();
        assert!(err.to_string().contains("Unexpected end of file"));

        let err = parse_expression_from_str("* 3").unwrap_err();
        assert!(matches!(err, CompilerError::ParseError { .. }));
        assert!(err.to_string().contains("Expected expression, found *"));

        assert!(parse_program_from_str("{ a = 1").is_err());
        assert!(parse_program_from_str("c ? 1 2").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(rendered(&nested(100)), "1");

        let err = parse_expression_from_str(&nested(100_000)).unwrap_err();
        assert!(matches!(err, CompilerError::ParseError { .. }));
        assert!(err.to_string().contains("Expression nested too deeply"), "{err}");

        let chain = vec!["1"; 2 * MAX_DEPTH].join(" + ");
        let err = parse_program_from_str(&format!("def main() {chain}")).unwrap_err();
        assert!(err.to_string().contains("Expression nested too deeply"), "{err}");

        let blocks = format!("def main() {}1{}", "{".repeat(MAX_DEPTH), "}".repeat(MAX_DEPTH));
        assert!(parse_program_from_str(&blocks).is_err());

        // The limit applies per item
        let items = vec![nested(100); 10].join(";");
        assert_eq!(parse_program_from_str(&items).unwrap().items.len(), 10);
    }
}
