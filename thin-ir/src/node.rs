//! Instruction tree
//!
//! A [`Node`] is a kind tag, an integer immediate and an ordered list of
//! children. Nodes form a strict tree. The constructors below build
//! well-shaped nodes; the validator still checks every tree because modules
//! may also arrive deserialized.

use crate::kind::Kind;
use crate::types::Type;
use serde::{Deserialize, Serialize};

/// IR instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub kind: Kind,
    /// Constant value, byte offset, local slot or callee id depending on `kind`
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: Kind, value: i64, children: Vec<Node>) -> Self {
        Self { kind, value, children }
    }

    /// Static result type, known from the kind alone
    pub fn result_type(&self) -> Type {
        self.kind.result_type()
    }

    pub fn nop() -> Self {
        Self::new(Kind::Nop, 0, Vec::new())
    }

    pub fn i32_const(value: i32) -> Self {
        Self::new(Kind::I32Const, value as i64, Vec::new())
    }

    pub fn load_local(index: u32) -> Self {
        Self::new(Kind::I32LoadLocal, index as i64, Vec::new())
    }

    pub fn store_local(index: u32, value: Node) -> Self {
        Self::new(Kind::I32StoreLocal, index as i64, vec![value])
    }

    /// Memory load; `kind` must be one of the load kinds
    pub fn load(kind: Kind, address: Node, offset: u32) -> Self {
        Self::new(kind, offset as i64, vec![address])
    }

    /// Memory store; `kind` must be one of the store kinds
    pub fn store(kind: Kind, address: Node, offset: u32, value: Node) -> Self {
        Self::new(kind, offset as i64, vec![address, value])
    }

    /// Two-operand operator; `kind` must be a binary kind
    pub fn binary(kind: Kind, left: Node, right: Node) -> Self {
        Self::new(kind, 0, vec![left, right])
    }

    pub fn add(left: Node, right: Node) -> Self {
        Self::binary(Kind::I32Add, left, right)
    }

    pub fn shl(left: Node, right: Node) -> Self {
        Self::binary(Kind::I32Shl, left, right)
    }

    pub fn call(id: u32, args: Vec<Node>) -> Self {
        Self::new(Kind::I32Call, id as i64, args)
    }

    pub fn void_call(id: u32, args: Vec<Node>) -> Self {
        Self::new(Kind::VoidCall, id as i64, args)
    }

    pub fn call_import(id: u32, args: Vec<Node>) -> Self {
        Self::new(Kind::I32CallImport, id as i64, args)
    }

    pub fn void_call_import(id: u32, args: Vec<Node>) -> Self {
        Self::new(Kind::VoidCallImport, id as i64, args)
    }

    /// Evaluates only the chosen arm
    pub fn select(test: Node, then: Node, otherwise: Node) -> Self {
        Self::new(Kind::I32Select, 0, vec![test, then, otherwise])
    }

    pub fn block(children: Vec<Node>) -> Self {
        Self::new(Kind::Block, 0, children)
    }

    pub fn if_else(test: Node, then: Node, otherwise: Node) -> Self {
        Self::new(Kind::If, 0, vec![test, then, otherwise])
    }

    pub fn while_loop(test: Node, body: Node) -> Self {
        Self::new(Kind::While, 0, vec![test, body])
    }

    pub fn ret(value: Node) -> Self {
        Self::new(Kind::Return, 0, vec![value])
    }
}
