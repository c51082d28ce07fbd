//! Module, Functions and Imports
//!
//! Defines the top-level compilation unit handed from the frontend to the
//! validator and the backends.

use crate::node::Node;
use crate::types::{Signature, Type};
use serde::{Deserialize, Serialize};

/// Function defined in the module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub id: u32,
    pub arg_types: Vec<Type>,
    pub return_type: Type,
    /// Extra i32 slots after the arguments in the shared local index space
    pub local_count: u32,
    pub is_exported: bool,
    pub body: Node,
}

impl Function {
    pub fn new(name: String, id: u32, arg_types: Vec<Type>, return_type: Type) -> Self {
        Self {
            name,
            id,
            arg_types,
            return_type,
            local_count: 0,
            is_exported: false,
            body: Node::block(Vec::new()),
        }
    }

    pub fn signature(&self) -> Signature {
        Signature::new(self.arg_types.clone(), self.return_type)
    }

    /// Total number of addressable slots: arguments followed by locals
    pub fn slot_count(&self) -> usize {
        self.arg_types.len() + self.local_count as usize
    }
}

/// Host-provided function resolved at load time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Namespace the host looks the name up in
    pub location: String,
    pub name: String,
    pub id: u32,
    pub arg_types: Vec<Type>,
    pub return_type: Type,
}

impl Import {
    pub fn signature(&self) -> Signature {
        Signature::new(self.arg_types.clone(), self.return_type)
    }
}

/// IR Module - a complete compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Module {
    /// Initial memory contents starting at address 0
    pub data: Vec<u8>,
    pub imports: Vec<Import>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Half-open range of the data segment with leading and trailing zero
    /// bytes removed; empty when the whole segment is zero
    pub fn data_range(&self) -> std::ops::Range<usize> {
        let start = self.data.iter().position(|&b| b != 0).unwrap_or(self.data.len());
        let end = self.data.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_lookup() {
        let mut module = Module::new();
        module.add_function(Function::new("main".to_string(), 0, Vec::new(), Type::I32));
        module.add_import(Import {
            location: "lib".to_string(),
            name: "write".to_string(),
            id: 0,
            arg_types: vec![Type::I32],
            return_type: Type::I32,
        });

        assert!(module.get_function("main").is_some());
        assert!(module.get_function("write").is_none());
        assert_eq!(
            module.imports[0].signature(),
            Signature::new(vec![Type::I32], Type::I32)
        );
    }

    #[test]
    fn test_data_range() {
        let mut module = Module::new();
        assert_eq!(module.data_range(), 0..0);

        module.data = vec![0, 0, 0, 0];
        assert!(module.data_range().is_empty());

        module.data = vec![0, 0, 0, 0, 5, 0, 0, 0, 7, 0, 0, 0];
        assert_eq!(module.data_range(), 4..9);

        module.data = vec![1, 0, 2];
        assert_eq!(module.data_range(), 0..3);
    }

    #[test]
    fn test_slot_count() {
        let mut function = Function::new("f".to_string(), 3, vec![Type::I32, Type::I32], Type::I32);
        function.local_count = 3;
        assert_eq!(function.slot_count(), 5);
    }
}
