//! Untyped syntax tree
//!
//! Everything in the script language is an expression, including `def`,
//! blocks and control flow. A program is a list of top-level expressions.

use thin_common::SourceLocation;

/// Two-operand operators, lowest precedence first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    LogicalOr,  // ||
    LogicalAnd, // &&
    BitOr,      // |
    BitAnd,     // &
    BitXor,     // ^
    Equal,      // ==
    NotEqual,   // !=
    Less,       // <
    Greater,    // >
    LessEqual,  // <=
    GreaterEqual, // >=
    LeftShift,  // <<
    RightShift, // >>
    Add,        // +
    Sub,        // -
    Mul,        // *
    Div,        // /
    Mod,        // %
}

impl BinaryOp {
    /// Binding level in the precedence table
    pub fn level(self) -> u8 {
        match self {
            BinaryOp::LogicalOr => 2,
            BinaryOp::LogicalAnd => 3,
            BinaryOp::BitOr => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::BitXor => 6,
            BinaryOp::Equal | BinaryOp::NotEqual => 7,
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => 8,
            BinaryOp::LeftShift | BinaryOp::RightShift => 9,
            BinaryOp::Add | BinaryOp::Sub => 10,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpressionKind {
    IntLiteral(i64),
    StringLiteral(String),
    Identifier(String),

    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `target = value`
    Assign {
        target: Box<Expression>,
        value: Box<Expression>,
    },

    /// `base[index]`, byte addressed
    Index {
        base: Box<Expression>,
        index: Box<Expression>,
    },

    /// `base.index`, word addressed
    Member {
        base: Box<Expression>,
        index: Box<Expression>,
    },

    /// `test ? then : otherwise`
    Conditional {
        test: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },

    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// `def name(params) body`
    Def {
        name: Box<Expression>,
        params: Vec<Expression>,
        body: Box<Expression>,
    },

    Block(Vec<Expression>),

    If {
        test: Box<Expression>,
        then: Box<Expression>,
        otherwise: Option<Box<Expression>>,
    },

    While {
        test: Box<Expression>,
        body: Box<Expression>,
    },

    Return(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub location: SourceLocation,
}

impl Expression {
    pub fn new(kind: ExpressionKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// Name of an identifier expression
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExpressionKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Short description used in diagnostics
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            ExpressionKind::IntLiteral(_) => "integer literal",
            ExpressionKind::StringLiteral(_) => "string literal",
            ExpressionKind::Identifier(_) => "identifier",
            ExpressionKind::Binary { .. } => "binary expression",
            ExpressionKind::Assign { .. } => "assignment",
            ExpressionKind::Index { .. } => "index expression",
            ExpressionKind::Member { .. } => "member expression",
            ExpressionKind::Conditional { .. } => "conditional expression",
            ExpressionKind::Call { .. } => "call",
            ExpressionKind::Def { .. } => "function definition",
            ExpressionKind::Block(_) => "block",
            ExpressionKind::If { .. } => "if",
            ExpressionKind::While { .. } => "while",
            ExpressionKind::Return(_) => "return",
        }
    }
}

/// Parsed program: the top-level expressions in source order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub items: Vec<Expression>,
}
