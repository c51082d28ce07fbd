//! JavaScript text backend
//!
//! Produces a factory expression `(function(imports) { ... })`. Calling it
//! with `{location: {name: callable}}` returns the export object: every
//! exported function under its source name, `memory.buffer`, and `alloc`
//! when memory is growable.
//!
//! Loads and stores index typed-array views directly, so 16- and 32-bit
//! accesses assume natural alignment. Integer division by zero yields 0
//! instead of trapping, and out-of-bounds accesses read `undefined` or
//! write nothing.

pub mod emit;
pub mod runtime;

use crate::memory::MemoryModel;
use log::debug;
use runtime::quote;
use std::fmt::{self, Write};
use thin_common::CompilerError;
use thin_ir::{validate, Module};

/// Text backend configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextOptions {
    pub memory: MemoryModel,
}

/// Compile a module to JavaScript source. The module is validated first.
pub fn compile(module: &Module, options: &TextOptions) -> Result<String, CompilerError> {
    let mapping = validate(module)?;
    crate::check_export_names(module, options.memory)?;

    let mut out = String::new();
    write_module(&mut out, module, options.memory).map_err(|_| CompilerError::InternalError {
        message: "JavaScript emission found a void node in value position".to_string(),
    })?;

    debug!(
        "JavaScript module: {} imports, {} functions, {} bytes",
        mapping.imports.len(),
        mapping.functions.len(),
        out.len()
    );

    Ok(out)
}

fn write_module(out: &mut String, module: &Module, memory: MemoryModel) -> fmt::Result {
    runtime::write_prelude(out, module, memory.is_growable())?;

    for function in &module.functions {
        emit::emit_function(out, function)?;
        if function.is_exported {
            writeln!(out, "  exports[{}] = f{};", quote(&function.name), function.id)?;
        }
    }

    if let MemoryModel::Growable { max_bytes } = memory {
        runtime::write_allocator(out, module, max_bytes)?;
    }

    runtime::write_epilogue(out)
}
