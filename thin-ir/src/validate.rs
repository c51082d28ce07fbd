//! IR validation
//!
//! Every module is validated before either backend runs. Validation is a
//! read-only walk over all function bodies: it checks each node's result type
//! against its context, its child count, its immediate and, for calls, the
//! callee signature. The first violation aborts validation.
//!
//! On success the returned [`Mapping`] resolves call ids to their targets;
//! the backends rely on it and index it without further checks.

use crate::kind::{Arity, Kind};
use crate::module::{Function, Import, Module};
use crate::node::Node;
use crate::types::Type;
use log::debug;
use std::collections::{HashMap, HashSet};
use thin_common::CompilerError;
use thiserror::Error;

/// Validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Import {name}: Duplicate id: {id}")]
    DuplicateImportId { name: String, id: u32 },

    #[error("Function {name}: Duplicate id: {id}")]
    DuplicateFunctionId { name: String, id: u32 },

    #[error("Function {name}: Duplicate name: {name}")]
    DuplicateFunctionName { name: String },

    #[error("{owner}: Invalid argument type at position {index}: void")]
    VoidArgument { owner: String, index: usize },

    #[error("Function {function}: Cannot use {kind} in context expecting {expected}")]
    TypeMismatch {
        function: String,
        kind: Kind,
        expected: Type,
        found: Type,
    },

    #[error("Function {function}: Invalid node: {kind} expects {expected} children, got {found}")]
    BadArity {
        function: String,
        kind: Kind,
        expected: usize,
        found: usize,
    },

    #[error("Function {function}: Invalid offset for {kind}: {offset}")]
    InvalidOffset { function: String, kind: Kind, offset: i64 },

    #[error("Function {function}: Invalid constant: {value}")]
    InvalidConstant { function: String, value: i64 },

    #[error("Function {function}: Invalid local index: {index} (function has {count} slots)")]
    LocalOutOfRange { function: String, index: i64, count: usize },

    #[error("Function {function}: Invalid function id: {id}")]
    UnknownFunction { function: String, id: i64 },

    #[error("Function {function}: Invalid import id: {id}")]
    UnknownImport { function: String, id: i64 },

    #[error("Function {function}: Invalid call to {callee}: expected {expected} arguments, got {found} instead")]
    ArgumentCount {
        function: String,
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("Function {function}: Invalid call to {callee}: expected return type of {expected}, got {found} instead")]
    CallReturnType {
        function: String,
        callee: String,
        expected: Type,
        found: Type,
    },
}

impl From<ValidationError> for CompilerError {
    fn from(err: ValidationError) -> Self {
        CompilerError::validation_error(err.to_string())
    }
}

/// Read-only id lookup produced by a successful validation
#[derive(Debug, Clone, Default)]
pub struct Mapping<'m> {
    pub imports: HashMap<u32, &'m Import>,
    pub functions: HashMap<u32, &'m Function>,
    /// Declaration position of each import id
    import_positions: HashMap<u32, u32>,
    /// Declaration position of each function id
    function_positions: HashMap<u32, u32>,
}

impl<'m> Mapping<'m> {
    /// Function with the given id; the id must come from a validated call
    pub fn function(&self, id: u32) -> &'m Function {
        self.functions[&id]
    }

    /// Import with the given id; the id must come from a validated call
    pub fn import(&self, id: u32) -> &'m Import {
        self.imports[&id]
    }

    /// Index of the import among the module's imports
    pub fn import_position(&self, id: u32) -> u32 {
        self.import_positions[&id]
    }

    /// Index of the function among the module's functions
    pub fn function_position(&self, id: u32) -> u32 {
        self.function_positions[&id]
    }
}

/// Validate a module, returning the id lookup on success
pub fn validate(module: &Module) -> Result<Mapping<'_>, ValidationError> {
    let mut imports = HashMap::new();
    let mut import_positions = HashMap::new();

    for (position, item) in module.imports.iter().enumerate() {
        import_positions.insert(item.id, position as u32);
        if imports.insert(item.id, item).is_some() {
            return Err(ValidationError::DuplicateImportId {
                name: item.name.clone(),
                id: item.id,
            });
        }
        check_arguments(&format!("Import {}", item.name), &item.arg_types)?;
    }

    let mut names = HashSet::new();
    let mut functions = HashMap::new();
    let mut function_positions = HashMap::new();

    for (position, item) in module.functions.iter().enumerate() {
        if !names.insert(item.name.as_str()) {
            return Err(ValidationError::DuplicateFunctionName { name: item.name.clone() });
        }
        function_positions.insert(item.id, position as u32);
        if functions.insert(item.id, item).is_some() {
            return Err(ValidationError::DuplicateFunctionId {
                name: item.name.clone(),
                id: item.id,
            });
        }
        check_arguments(&format!("Function {}", item.name), &item.arg_types)?;
    }

    let mapping = Mapping {
        imports,
        functions,
        import_positions,
        function_positions,
    };

    for item in &module.functions {
        let validator = FunctionValidator { mapping: &mapping, function: item };
        validator.validate_node(&item.body, None)?;
    }

    debug!(
        "Validated module: {} imports, {} functions",
        mapping.imports.len(),
        mapping.functions.len()
    );

    Ok(mapping)
}

fn check_arguments(owner: &str, arg_types: &[Type]) -> Result<(), ValidationError> {
    match arg_types.iter().position(|t| *t == Type::Void) {
        Some(index) => Err(ValidationError::VoidArgument { owner: owner.to_string(), index }),
        None => Ok(()),
    }
}

/// Per-function context for the recursive walk
struct FunctionValidator<'a, 'm> {
    mapping: &'a Mapping<'m>,
    function: &'m Function,
}

impl FunctionValidator<'_, '_> {
    fn name(&self) -> String {
        self.function.name.clone()
    }

    /// Check `node` and its subtree. `expected` is `None` where the context
    /// discards the result.
    fn validate_node(&self, node: &Node, expected: Option<Type>) -> Result<(), ValidationError> {
        let kind = node.kind;
        let found = kind.result_type();

        if let Some(expected) = expected {
            if expected != found {
                return Err(ValidationError::TypeMismatch {
                    function: self.name(),
                    kind,
                    expected,
                    found,
                });
            }
        }

        if let Arity::Fixed(count) = kind.arity() {
            if node.children.len() != count {
                return Err(ValidationError::BadArity {
                    function: self.name(),
                    kind,
                    expected: count,
                    found: node.children.len(),
                });
            }
        }

        match kind {
            Kind::Nop => Ok(()),

            Kind::I32Const => {
                if node.value < i32::MIN as i64 || node.value > u32::MAX as i64 {
                    return Err(ValidationError::InvalidConstant {
                        function: self.name(),
                        value: node.value,
                    });
                }
                Ok(())
            }

            Kind::I32LoadLocal | Kind::I32StoreLocal => {
                let count = self.function.slot_count();
                if node.value < 0 || node.value >= count as i64 {
                    return Err(ValidationError::LocalOutOfRange {
                        function: self.name(),
                        index: node.value,
                        count,
                    });
                }
                self.validate_children(node, Some(Type::I32))
            }

            Kind::I32Load
            | Kind::I32Load8S
            | Kind::I32Load8U
            | Kind::I32Load16S
            | Kind::I32Load16U
            | Kind::I32Store
            | Kind::I32Store8
            | Kind::I32Store16 => {
                if node.value < 0 || node.value > u32::MAX as i64 {
                    return Err(ValidationError::InvalidOffset {
                        function: self.name(),
                        kind,
                        offset: node.value,
                    });
                }
                self.validate_children(node, Some(Type::I32))
            }

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
            | Kind::I32GeU
            | Kind::I32Select => self.validate_children(node, Some(Type::I32)),

            Kind::VoidCall | Kind::I32Call => {
                let callee = u32::try_from(node.value)
                    .ok()
                    .and_then(|id| self.mapping.functions.get(&id))
                    .ok_or_else(|| ValidationError::UnknownFunction {
                        function: self.name(),
                        id: node.value,
                    })?;
                self.validate_call(node, &callee.name, &callee.arg_types, callee.return_type)
            }

            Kind::VoidCallImport | Kind::I32CallImport => {
                let callee = u32::try_from(node.value)
                    .ok()
                    .and_then(|id| self.mapping.imports.get(&id))
                    .ok_or_else(|| ValidationError::UnknownImport {
                        function: self.name(),
                        id: node.value,
                    })?;
                self.validate_call(node, &callee.name, &callee.arg_types, callee.return_type)
            }

            Kind::Block => self.validate_children(node, None),

            Kind::If => {
                self.validate_node(&node.children[0], Some(Type::I32))?;
                self.validate_node(&node.children[1], None)?;
                self.validate_node(&node.children[2], None)
            }

            Kind::While => {
                self.validate_node(&node.children[0], Some(Type::I32))?;
                self.validate_node(&node.children[1], None)
            }

            Kind::Return => self.validate_node(&node.children[0], Some(self.function.return_type)),
        }
    }

    fn validate_children(&self, node: &Node, expected: Option<Type>) -> Result<(), ValidationError> {
        for child in &node.children {
            self.validate_node(child, expected)?;
        }
        Ok(())
    }

    fn validate_call(
        &self,
        node: &Node,
        callee: &str,
        arg_types: &[Type],
        return_type: Type,
    ) -> Result<(), ValidationError> {
        if node.children.len() != arg_types.len() {
            return Err(ValidationError::ArgumentCount {
                function: self.name(),
                callee: callee.to_string(),
                expected: arg_types.len(),
                found: node.children.len(),
            });
        }

        for (child, arg_type) in node.children.iter().zip(arg_types) {
            self.validate_node(child, Some(*arg_type))?;
        }

        let expected = node.kind.result_type();
        if return_type != expected {
            return Err(ValidationError::CallReturnType {
                function: self.name(),
                callee: callee.to_string(),
                expected,
                found: return_type,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn function(name: &str, id: u32, args: usize, body: Node) -> Function {
        let mut function = Function::new(name.to_string(), id, vec![Type::I32; args], Type::I32);
        function.body = body;
        function
    }

    fn module_with(functions: Vec<Function>) -> Module {
        Module {
            data: vec![0; 16],
            imports: Vec::new(),
            functions,
        }
    }

    #[test]
    fn test_valid_module_mapping() {
        let add = function(
            "add",
            7,
            2,
            Node::block(vec![Node::ret(Node::add(Node::load_local(0), Node::load_local(1)))]),
        );
        let main = function(
            "main",
            3,
            0,
            Node::block(vec![Node::ret(Node::call(7, vec![Node::i32_const(5), Node::i32_const(3)]))]),
        );
        let module = module_with(vec![add, main]);

        let mapping = validate(&module).unwrap();
        assert_eq!(mapping.functions.len(), 2);
        assert_eq!(mapping.function(7).name, "add");
        assert_eq!(mapping.function(3).name, "main");
        assert_eq!(mapping.function_position(7), 0);
        assert_eq!(mapping.function_position(3), 1);
        assert!(mapping.imports.is_empty());
    }

    #[test]
    fn test_store_local_checks_value_type() {
        let mut f = function("f", 0, 0, Node::block(vec![Node::store_local(0, Node::nop())]));
        f.local_count = 1;
        let err = validate(&module_with(vec![f])).unwrap_err();
        assert!(matches!(err, ValidationError::TypeMismatch { kind: Kind::Nop, .. }));
    }

    #[test]
    fn test_local_index_includes_arguments() {
        let mut f = function("f", 0, 2, Node::block(vec![Node::ret(Node::load_local(2))]));
        assert!(matches!(
            validate(&module_with(vec![f.clone()])),
            Err(ValidationError::LocalOutOfRange { index: 2, count: 2, .. })
        ));

        f.local_count = 1;
        assert!(validate(&module_with(vec![f])).is_ok());
    }

    #[test]
    fn test_negative_offset_rejected() {
        let mut load = Node::load(Kind::I32Load, Node::i32_const(0), 0);
        load.value = -4;
        let f = function("f", 0, 0, Node::block(vec![Node::ret(load)]));
        assert!(matches!(
            validate(&module_with(vec![f])),
            Err(ValidationError::InvalidOffset { offset: -4, .. })
        ));
    }

    #[test]
    fn test_constant_range() {
        let mut constant = Node::i32_const(0);
        constant.value = u32::MAX as i64;
        let f = function("f", 0, 0, Node::block(vec![Node::ret(constant.clone())]));
        assert!(validate(&module_with(vec![f])).is_ok());

        constant.value = u32::MAX as i64 + 1;
        let f = function("f", 0, 0, Node::block(vec![Node::ret(constant)]));
        assert!(matches!(
            validate(&module_with(vec![f])),
            Err(ValidationError::InvalidConstant { .. })
        ));
    }
}
