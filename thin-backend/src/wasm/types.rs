//! Deduplicated function type table

use crate::wasm::opcodes::{FUNC, I32};
use crate::writer::ByteWriter;
use std::collections::HashMap;
use thin_ir::{Signature, Type};

/// Distinct signatures in first-seen order
#[derive(Debug, Default)]
pub struct TypeTable {
    signatures: Vec<Signature>,
    indices: HashMap<Signature, u32>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `signature`, adding it if this is its first use
    pub fn index_of(&mut self, signature: Signature) -> u32 {
        if let Some(&index) = self.indices.get(&signature) {
            return index;
        }

        let index = self.signatures.len() as u32;
        self.signatures.push(signature.clone());
        self.indices.insert(signature, index);
        index
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Type section payload
    pub fn encode(&self, out: &mut ByteWriter) {
        out.append_var_u(self.signatures.len() as u32);

        for signature in &self.signatures {
            out.append_byte(FUNC);
            out.append_var_u(signature.arg_types.len() as u32);
            // Void arguments never get here: the validator rejects them
            for _ in &signature.arg_types {
                out.append_byte(I32);
            }
            match signature.return_type {
                Type::I32 => {
                    out.append_var_u(1);
                    out.append_byte(I32);
                }
                Type::Void => out.append_var_u(0),
            }
        }
    }
}
