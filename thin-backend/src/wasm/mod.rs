//! WebAssembly binary module backend
//!
//! Serializes a validated module as:
//!
//! ```text
//! magic, version
//! type     distinct signatures, first-seen order
//! import   location, name, type index
//! function type index per function
//! memory   one memory sized to the data segment
//! global   free pointer (growable memory only)
//! export   "memory", exported functions, "alloc" (growable memory only)
//! code     function bodies
//! data     the data segment with leading/trailing zeros trimmed
//! ```

pub mod code;
pub mod opcodes;
pub mod section;
pub mod types;

use crate::memory::{heap_start, pages_for, MemoryModel, PAGE_SIZE};
use crate::writer::ByteWriter;
use code::{allocator_body, compile_function, function_index};
use log::{debug, trace};
use opcodes::{ExternalKind, Opcode, SectionId, I32, MAGIC, VERSION};
use section::Section;
use thin_common::CompilerError;
use thin_ir::{validate, Module, Signature, Type};
use types::TypeTable;

/// Binary backend configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryOptions {
    pub memory: MemoryModel,
}

/// Compile a module to WebAssembly bytes. The module is validated first.
pub fn compile(module: &Module, options: &BinaryOptions) -> Result<Vec<u8>, CompilerError> {
    let mapping = validate(module)?;
    crate::check_export_names(module, options.memory)?;

    let mut types = TypeTable::new();

    let mut imports = Section::new(SectionId::Import);
    imports.payload.append_var_u(module.imports.len() as u32);
    for import in &module.imports {
        imports.payload.append_name(&import.location);
        imports.payload.append_name(&import.name);
        imports.payload.append_byte(ExternalKind::Function as u8);
        imports.payload.append_var_u(types.index_of(import.signature()));
    }

    let allocator_count = u32::from(options.memory.is_growable());
    let function_count = module.functions.len() as u32 + allocator_count;

    let mut functions = Section::new(SectionId::Function);
    functions.payload.append_var_u(function_count);
    for function in &module.functions {
        functions.payload.append_var_u(types.index_of(function.signature()));
    }
    if options.memory.is_growable() {
        let signature = Signature::new(vec![Type::I32], Type::I32);
        functions.payload.append_var_u(types.index_of(signature));
    }

    let memory = encode_memory(module, options.memory);

    let mut exports = Section::new(SectionId::Export);
    let exported = module.functions.iter().filter(|f| f.is_exported).count() as u32;
    exports.payload.append_var_u(1 + exported + allocator_count);
    exports.payload.append_name("memory");
    exports.payload.append_byte(ExternalKind::Memory as u8);
    exports.payload.append_var_u(0);
    for function in module.functions.iter().filter(|f| f.is_exported) {
        exports.payload.append_name(&function.name);
        exports.payload.append_byte(ExternalKind::Function as u8);
        exports.payload.append_var_u(function_index(&mapping, function.id));
    }
    if options.memory.is_growable() {
        exports.payload.append_name("alloc");
        exports.payload.append_byte(ExternalKind::Function as u8);
        exports.payload.append_var_u(module.imports.len() as u32 + module.functions.len() as u32);
    }

    let mut code = Section::new(SectionId::Code);
    code.payload.append_var_u(function_count);
    for function in &module.functions {
        let body = compile_function(function, &mapping);
        trace!("Function {}: {} bytes of code", function.name, body.len());
        code.payload.append_sized(&body);
    }
    if options.memory.is_growable() {
        code.payload.append_sized(&allocator_body(0));
    }

    let data = encode_data(module);

    let mut type_section = Section::new(SectionId::Type);
    types.encode(&mut type_section.payload);

    let mut sections = vec![type_section, imports, functions, memory];
    if options.memory.is_growable() {
        sections.push(encode_free_pointer(module));
    }
    sections.extend([exports, code, data]);

    let mut out = ByteWriter::new();
    out.append_u32_le(MAGIC);
    out.append_u32_le(VERSION);
    for section in &sections {
        trace!("Section {:?}: {} bytes", section.id, section.payload.len());
        section.write_to(&mut out);
    }

    debug!(
        "Binary module: {} types, {} imports, {} functions, {} bytes",
        types.len(),
        module.imports.len(),
        function_count,
        out.len()
    );

    Ok(out.into_bytes())
}

fn encode_memory(module: &Module, model: MemoryModel) -> Section {
    let mut section = Section::new(SectionId::Memory);
    let pages = pages_for(module.data.len());
    section.payload.append_var_u(1);

    match model {
        MemoryModel::Fixed => {
            section.payload.append_var_u(0);
            section.payload.append_var_u(pages);
        }
        MemoryModel::Growable { max_bytes } => {
            // Doubling needs at least one page to start from
            let initial = pages.max(1);
            let maximum = ((max_bytes as usize / PAGE_SIZE) as u32).max(initial);
            section.payload.append_var_u(1);
            section.payload.append_var_u(initial);
            section.payload.append_var_u(maximum);
        }
    }

    section
}

/// Mutable i32 global holding the next free address
fn encode_free_pointer(module: &Module) -> Section {
    let mut section = Section::new(SectionId::Global);
    section.payload.append_var_u(1);
    section.payload.append_byte(I32);
    section.payload.append_byte(1);
    section.payload.append_byte(Opcode::I32Const.to_u8());
    section.payload.append_var_s(heap_start(module.data.len()) as i32);
    section.payload.append_byte(Opcode::End.to_u8());
    section
}

fn encode_data(module: &Module) -> Section {
    let mut section = Section::new(SectionId::Data);
    let range = module.data_range();

    if range.is_empty() {
        section.payload.append_var_u(0);
        return section;
    }

    section.payload.append_var_u(1);
    // Memory index
    section.payload.append_var_u(0);
    section.payload.append_byte(Opcode::I32Const.to_u8());
    section.payload.append_var_s(range.start as i32);
    section.payload.append_byte(Opcode::End.to_u8());
    section.payload.append_var_u(range.len() as u32);
    section.payload.append_bytes(&module.data[range]);
    section
}
