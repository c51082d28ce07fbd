//! Thin Compiler - Backend
//!
//! Two code generators over the same validated IR:
//! - `wasm`: a WebAssembly binary module
//! - `js`: a JavaScript factory function over a typed-array heap
//!
//! Both keep 32-bit wraparound, signed/unsigned distinctions and
//! short-circuit selection identical. `runner` bundles both artifacts into
//! a Node.js script.

pub mod js;
pub mod memory;
pub mod runner;
pub mod wasm;
pub mod writer;

pub use js::TextOptions;
pub use memory::MemoryModel;
pub use runner::build_runner;
pub use wasm::BinaryOptions;
pub use writer::ByteWriter;

use thin_common::CompilerError;
use thin_ir::Module;

/// Compile a module to WebAssembly bytes
pub fn compile_wasm(module: &Module, options: &BinaryOptions) -> Result<Vec<u8>, CompilerError> {
    wasm::compile(module, options)
}

/// Compile a module to JavaScript source
pub fn compile_js(module: &Module, options: &TextOptions) -> Result<String, CompilerError> {
    js::compile(module, options)
}

/// Export names the generated modules use for themselves
fn reserved_exports(memory: MemoryModel) -> &'static [&'static str] {
    match memory {
        MemoryModel::Fixed => &["memory"],
        MemoryModel::Growable { .. } => &["memory", "alloc"],
    }
}

/// Exported functions may not shadow the runtime's own exports
pub(crate) fn check_export_names(module: &Module, memory: MemoryModel) -> Result<(), CompilerError> {
    let reserved = reserved_exports(memory);

    match module
        .functions
        .iter()
        .find(|f| f.is_exported && reserved.contains(&f.name.as_str()))
    {
        Some(function) => Err(CompilerError::validation_error(format!(
            "Function {}: Export name is reserved: {}",
            function.name, function.name
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thin_ir::{Function, Type};

    #[test]
    fn test_reserved_export_names() {
        let mut module = Module::new();
        let mut alloc = Function::new("alloc".to_string(), 0, vec![Type::I32], Type::I32);
        alloc.is_exported = true;
        module.add_function(alloc);

        assert!(check_export_names(&module, MemoryModel::Fixed).is_ok());
        let err = check_export_names(&module, MemoryModel::growable()).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Function alloc: Export name is reserved: alloc");

        module.functions[0].name = "memory".to_string();
        assert!(compile_js(&module, &TextOptions::default()).is_err());
        assert!(compile_wasm(&module, &BinaryOptions::default()).is_err());
    }
}
