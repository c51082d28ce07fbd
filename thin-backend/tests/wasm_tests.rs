//! Tests for the WebAssembly binary backend

use pretty_assertions::assert_eq;
use thin_backend::{compile_wasm, BinaryOptions, ByteWriter, MemoryModel};
use thin_common::CompilerError;
use thin_frontend::{Frontend, LoweringOptions};
use thin_ir::{Function, Import, Kind, Module, Node, Type};
use wasm_encoder::Encode;

fn add_function() -> Function {
    let mut add = Function::new("add".to_string(), 0, vec![Type::I32, Type::I32], Type::I32);
    add.is_exported = true;
    add.body = Node::block(vec![Node::ret(Node::add(Node::load_local(0), Node::load_local(1)))]);
    add
}

/// Decode an unsigned LEB128 at `pos`, advancing it
fn read_var_u(bytes: &[u8], pos: &mut usize) -> u32 {
    let mut result = 0u32;
    let mut shift = 0;
    loop {
        let byte = bytes[*pos];
        *pos += 1;
        result |= u32::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return result;
        }
        shift += 7;
    }
}

/// (id, payload) for every section after the preamble
fn sections(bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
    let mut pos = 8;
    let mut sections = Vec::new();
    while pos < bytes.len() {
        let id = bytes[pos];
        pos += 1;
        let len = read_var_u(bytes, &mut pos) as usize;
        sections.push((id, bytes[pos..pos + len].to_vec()));
        pos += len;
    }
    sections
}

fn section(bytes: &[u8], id: u8) -> Vec<u8> {
    sections(bytes)
        .into_iter()
        .find(|(section_id, _)| *section_id == id)
        .map(|(_, payload)| payload)
        .expect("section should be present")
}

#[test]
fn test_minimal_module_is_byte_exact() {
    let mut module = Module::new();
    module.add_function(add_function());

    let bytes = compile_wasm(&module, &BinaryOptions::default()).unwrap();

    #[rustfmt::skip]
    let expected = vec![
        0x00, 0x61, 0x73, 0x6D, 0x01, 0x00, 0x00, 0x00,
        // type: (i32, i32) -> i32
        0x01, 0x07, 0x01, 0x60, 0x02, 0x7F, 0x7F, 0x01, 0x7F,
        // import: none
        0x02, 0x01, 0x00,
        // function: type 0
        0x03, 0x02, 0x01, 0x00,
        // memory: no pages
        0x05, 0x03, 0x01, 0x00, 0x00,
        // export: memory, add
        0x07, 0x10, 0x02,
        0x06, b'm', b'e', b'm', b'o', b'r', b'y', 0x02, 0x00,
        0x03, b'a', b'd', b'd', 0x00, 0x00,
        // code
        0x0A, 0x0C, 0x01, 0x0A, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6A, 0x0F, 0x41, 0x00, 0x0B,
        // data: no segments
        0x0B, 0x01, 0x00,
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn test_add_program_through_the_pipeline() {
    let source = "x = 5; def add(a, b) { return a + b; } def main() { return add(x, 3); }";
    let module = Frontend::compile_to_ir(source, &LoweringOptions::default()).unwrap();
    let bytes = compile_wasm(&module, &BinaryOptions::default()).unwrap();

    let ids: Vec<u8> = sections(&bytes).iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![1, 2, 3, 5, 7, 10, 11]);

    // 128 KiB of memory
    assert_eq!(section(&bytes, 5), vec![1, 0, 2]);
    // One segment holding the global at address 4
    assert_eq!(section(&bytes, 11), vec![1, 0, 0x41, 4, 0x0B, 1, 5]);

    let code = section(&bytes, 10);
    // main: call add(i32.load offset=0 (i32.const 4), i32.const 3)
    let main_body = [0x00, 0x41, 0x04, 0x28, 0x02, 0x00, 0x41, 0x03, 0x10, 0x00, 0x0F, 0x41, 0x00, 0x0B];
    assert!(code.windows(main_body.len()).any(|w| w == main_body));
}

#[test]
fn test_type_table_is_shared_by_imports_and_functions() {
    let mut module = Module::new();
    for (id, name, args) in [(0, "write", 1), (1, "read", 0), (2, "log", 1)] {
        module.add_import(Import {
            location: "lib".to_string(),
            name: name.to_string(),
            id,
            arg_types: vec![Type::I32; args],
            return_type: Type::I32,
        });
    }
    let mut main = Function::new("main".to_string(), 0, Vec::new(), Type::I32);
    main.body = Node::block(vec![Node::call_import(0, vec![Node::call_import(1, Vec::new())])]);
    module.add_function(main);

    let bytes = compile_wasm(&module, &BinaryOptions::default()).unwrap();

    assert_eq!(section(&bytes, 1), vec![2, 0x60, 1, 0x7F, 1, 0x7F, 0x60, 0, 1, 0x7F]);
    assert_eq!(
        section(&bytes, 2),
        vec![
            3, //
            3, b'l', b'i', b'b', 5, b'w', b'r', b'i', b't', b'e', 0, 0, //
            3, b'l', b'i', b'b', 4, b'r', b'e', b'a', b'd', 0, 1, //
            3, b'l', b'i', b'b', 3, b'l', b'o', b'g', 0, 0,
        ]
    );
    assert_eq!(section(&bytes, 3), vec![1, 1]);
    // Unexported function: only the memory export
    assert_eq!(section(&bytes, 7), vec![1, 6, b'm', b'e', b'm', b'o', b'r', b'y', 2, 0]);
    // Calls resolve to import indices; the unused result is dropped
    assert_eq!(section(&bytes, 10), vec![1, 9, 0, 0x10, 1, 0x10, 0, 0x1A, 0x41, 0, 0x0B]);
}

#[test]
fn test_short_circuit_is_a_typed_if() {
    let module =
        Frontend::compile_to_ir("def f() { return a() && b(); }", &LoweringOptions::default()).unwrap();
    let bytes = compile_wasm(&module, &BinaryOptions::default()).unwrap();

    let code = section(&bytes, 10);
    // call a; if (result i32) call b else i32.const 0 end
    let select = [0x10, 0x00, 0x04, 0x7F, 0x10, 0x01, 0x05, 0x41, 0x00, 0x0B];
    assert!(code.windows(select.len()).any(|w| w == select));
}

#[test]
fn test_data_is_trimmed_and_placed_at_its_offset() {
    let mut module = Module::new();
    module.data = vec![0; 70000];
    module.data[100] = 1;
    module.data[103] = 2;

    let bytes = compile_wasm(&module, &BinaryOptions::default()).unwrap();
    assert_eq!(section(&bytes, 5), vec![1, 0, 2]);
    assert_eq!(section(&bytes, 11), vec![1, 0, 0x41, 0xE4, 0x00, 0x0B, 4, 1, 0, 0, 2]);
}

#[test]
fn test_growable_memory_adds_global_and_allocator() {
    let mut module = Module::new();
    module.data = vec![0; 131072];
    module.add_function(add_function());

    let options = BinaryOptions {
        memory: MemoryModel::growable(),
    };
    let bytes = compile_wasm(&module, &options).unwrap();

    let ids: Vec<u8> = sections(&bytes).iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, vec![1, 2, 3, 5, 6, 7, 10, 11]);

    // (i32, i32) -> i32 for add, (i32) -> i32 for alloc
    assert_eq!(section(&bytes, 3), vec![2, 0, 1]);
    // 2 initial pages, 4096 maximum
    assert_eq!(section(&bytes, 5), vec![1, 1, 2, 0x80, 0x20]);
    // mut i32 free pointer starting after the data
    assert_eq!(section(&bytes, 6), vec![1, 0x7F, 1, 0x41, 0x80, 0x80, 0x08, 0x0B]);

    let exports = section(&bytes, 7);
    assert_eq!(exports[0], 3);
    assert!(exports.ends_with(&[5, b'a', b'l', b'l', b'o', b'c', 0, 1]));

    let code = section(&bytes, 10);
    assert_eq!(code[0], 2);
    // alloc grows with memory.size / memory.grow
    assert!(code.windows(4).any(|w| w == [0x3F, 0x00, 0x40, 0x00]));
}

#[test]
fn test_invalid_module_is_rejected() {
    let mut module = Module::new();
    let mut f = Function::new("f".to_string(), 0, Vec::new(), Type::I32);
    f.body = Node::ret(Node::nop());
    module.add_function(f);

    let err = compile_wasm(&module, &BinaryOptions::default()).unwrap_err();
    assert!(matches!(err, CompilerError::ValidationError { .. }));
    assert!(err.to_string().contains("Cannot use nop in context expecting i32"));

    let mut module = Module::new();
    let mut f = Function::new("f".to_string(), 0, Vec::new(), Type::I32);
    f.body = Node::new(Kind::I32Call, 9, Vec::new());
    module.add_function(f);
    assert!(compile_wasm(&module, &BinaryOptions::default()).is_err());
}

#[test]
fn test_leb128_matches_wasm_encoder() {
    let unsigned = [0u32, 1, 63, 64, 127, 128, 255, 300, 16383, 16384, 624485, 1 << 28, u32::MAX];
    for value in unsigned {
        let mut ours = ByteWriter::new();
        ours.append_var_u(value);
        let mut reference = Vec::new();
        value.encode(&mut reference);
        assert_eq!(ours.as_bytes(), reference.as_slice(), "unsigned {value}");
    }

    let signed = [0i32, 1, -1, 63, 64, -64, -65, 8191, -8192, 8192, -123456, i32::MAX, i32::MIN];
    for value in signed {
        let mut ours = ByteWriter::new();
        ours.append_var_s(value);
        let mut reference = Vec::new();
        value.encode(&mut reference);
        assert_eq!(ours.as_bytes(), reference.as_slice(), "signed {value}");
    }

    let mut ours = ByteWriter::new();
    ours.append_name("memory");
    let mut reference = Vec::new();
    "memory".encode(&mut reference);
    assert_eq!(ours.as_bytes(), reference.as_slice());
}
