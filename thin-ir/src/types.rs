//! IR Type System
//!
//! The IR only knows two types: `Void` for nodes that produce nothing and
//! `I32` for 32-bit two's-complement integers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    I32,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::I32 => write!(f, "i32"),
        }
    }
}

/// Shape of a callable: argument types in order plus the return type.
///
/// Two signatures are equal when they have the same argument count, the same
/// argument types in the same order and the same return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    pub arg_types: Vec<Type>,
    pub return_type: Type,
}

impl Signature {
    pub fn new(arg_types: Vec<Type>, return_type: Type) -> Self {
        Self { arg_types, return_type }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, arg) in self.arg_types.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}
