//! Node kinds
//!
//! Each kind fixes the result type of the node and the number of children it
//! takes. Every consumer of the IR matches on [`Kind`] exhaustively, so adding
//! a kind forces the validator and both backends to handle it.

use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of IR operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    // Void-typed calls and the empty statement
    VoidCall,
    VoidCallImport,
    Nop,

    // Constants and locals
    I32Const,
    I32LoadLocal,
    I32StoreLocal,

    // Memory
    I32Load,
    I32Load8S,
    I32Load8U,
    I32Load16S,
    I32Load16U,
    I32Store,
    I32Store8,
    I32Store16,

    // Arithmetic and bitwise
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,

    // Comparisons (result is 0 or 1)
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32LeS,
    I32LeU,
    I32GtS,
    I32GtU,
    I32GeS,
    I32GeU,

    // Value-producing calls and selection
    I32Call,
    I32CallImport,
    I32Select,

    // Control flow
    Block,
    If,
    While,
    Return,
}

/// Number of children a kind takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many children
    Fixed(usize),
    /// Determined by the callee signature
    Call,
    /// Any number of children
    Variadic,
}

impl Kind {
    /// Result type of every node of this kind
    pub fn result_type(self) -> Type {
        match self {
            Kind::VoidCall | Kind::VoidCallImport | Kind::Nop => Type::Void,

            Kind::I32Const
            | Kind::I32LoadLocal
            | Kind::I32StoreLocal
            | Kind::I32Load
            | Kind::I32Load8S
            | Kind::I32Load8U
            | Kind::I32Load16S
            | Kind::I32Load16U
            | Kind::I32Store
            | Kind::I32Store8
            | Kind::I32Store16
            | Kind::I32Add
            | Kind::I32Sub
            | Kind::I32Mul
            | Kind::I32DivS
            | Kind::I32DivU
            | Kind::I32RemS
            | Kind::I32RemU
            | Kind::I32And
            | Kind::I32Or
            | Kind::I32Xor
            | Kind::I32Shl
            | Kind::I32ShrS
            | Kind::I32ShrU
            | Kind::I32Eq
            | Kind::I32Ne
            | Kind::I32LtS
            | Kind::I32LtU
            | Kind::I32LeS
            | Kind::I32LeU
            | Kind::I32GtS
            | Kind::I32GtU
            | Kind::I32GeS
            | Kind::I32GeU
            | Kind::I32Call
            | Kind::I32CallImport
            | Kind::I32Select => Type::I32,

            Kind::Block | Kind::If | Kind::While | Kind::Return => Type::Void,
        }
    }

    /// Child count this kind requires
    pub fn arity(self) -> Arity {
        match self {
            Kind::Nop | Kind::I32Const | Kind::I32LoadLocal => Arity::Fixed(0),
            Kind::I32StoreLocal
            | Kind::I32Load
            | Kind::I32Load8S
            | Kind::I32Load8U
            | Kind::I32Load16S
            | Kind::I32Load16U
            | Kind::Return => Arity::Fixed(1),
            Kind::I32Store | Kind::I32Store8 | Kind::I32Store16 | Kind::While => Arity::Fixed(2),
            Kind::I32Add
            | Kind::I32Sub
            | Kind::I32Mul
            | Kind::I32DivS
            | Kind::I32DivU
            | Kind::I32RemS
            | Kind::I32RemU
            | Kind::I32And
            | Kind::I32Or
            | Kind::I32Xor
            | Kind::I32Shl
            | Kind::I32ShrS
            | Kind::I32ShrU
            | Kind::I32Eq
            | Kind::I32Ne
            | Kind::I32LtS
            | Kind::I32LtU
            | Kind::I32LeS
            | Kind::I32LeU
            | Kind::I32GtS
            | Kind::I32GtU
            | Kind::I32GeS
            | Kind::I32GeU => Arity::Fixed(2),
            Kind::I32Select | Kind::If => Arity::Fixed(3),
            Kind::VoidCall | Kind::VoidCallImport | Kind::I32Call | Kind::I32CallImport => Arity::Call,
            Kind::Block => Arity::Variadic,
        }
    }

    /// Memory access whose immediate is a byte offset
    pub fn has_offset(self) -> bool {
        matches!(
            self,
            Kind::I32Load
                | Kind::I32Load8S
                | Kind::I32Load8U
                | Kind::I32Load16S
                | Kind::I32Load16U
                | Kind::I32Store
                | Kind::I32Store8
                | Kind::I32Store16
        )
    }

    /// Textual mnemonic used by the IR listing
    pub fn name(self) -> &'static str {
        match self {
            Kind::VoidCall => "void.call",
            Kind::VoidCallImport => "void.call_import",
            Kind::Nop => "nop",
            Kind::I32Const => "i32.const",
            Kind::I32LoadLocal => "local.get",
            Kind::I32StoreLocal => "local.set",
            Kind::I32Load => "i32.load",
            Kind::I32Load8S => "i32.load8_s",
            Kind::I32Load8U => "i32.load8_u",
            Kind::I32Load16S => "i32.load16_s",
            Kind::I32Load16U => "i32.load16_u",
            Kind::I32Store => "i32.store",
            Kind::I32Store8 => "i32.store8",
            Kind::I32Store16 => "i32.store16",
            Kind::I32Add => "i32.add",
            Kind::I32Sub => "i32.sub",
            Kind::I32Mul => "i32.mul",
            Kind::I32DivS => "i32.div_s",
            Kind::I32DivU => "i32.div_u",
            Kind::I32RemS => "i32.rem_s",
            Kind::I32RemU => "i32.rem_u",
            Kind::I32And => "i32.and",
            Kind::I32Or => "i32.or",
            Kind::I32Xor => "i32.xor",
            Kind::I32Shl => "i32.shl",
            Kind::I32ShrS => "i32.shr_s",
            Kind::I32ShrU => "i32.shr_u",
            Kind::I32Eq => "i32.eq",
            Kind::I32Ne => "i32.ne",
            Kind::I32LtS => "i32.lt_s",
            Kind::I32LtU => "i32.lt_u",
            Kind::I32LeS => "i32.le_s",
            Kind::I32LeU => "i32.le_u",
            Kind::I32GtS => "i32.gt_s",
            Kind::I32GtU => "i32.gt_u",
            Kind::I32GeS => "i32.ge_s",
            Kind::I32GeU => "i32.ge_u",
            Kind::I32Call => "i32.call",
            Kind::I32CallImport => "i32.call_import",
            Kind::I32Select => "i32.select",
            Kind::Block => "block",
            Kind::If => "if",
            Kind::While => "while",
            Kind::Return => "return",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
