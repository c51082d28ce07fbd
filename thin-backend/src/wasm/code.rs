//! Function body compilation
//!
//! Each node is emitted in one of two positions. In value position it
//! leaves exactly one i32 on the operand stack. In discard position it
//! leaves nothing: non-void results are dropped, and stores skip the copy
//! of the stored value they would otherwise produce.

use crate::wasm::opcodes::{Opcode, I32, VOID_BLOCK};
use crate::writer::ByteWriter;
use thin_ir::{Function, Kind, Mapping, Node, Type};

/// Binary-format index of a function: imports take the first indices,
/// functions follow in declaration order
pub fn function_index(mapping: &Mapping<'_>, id: u32) -> u32 {
    mapping.imports.len() as u32 + mapping.function_position(id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Value,
    Discard,
}

struct CodeCompiler<'a, 'm> {
    mapping: &'a Mapping<'m>,
    code: ByteWriter,
    /// Extra local used to hand back the value of a memory store
    scratch: u32,
    uses_scratch: bool,
}

/// Compile one function into a code-section entry body (locals and
/// instructions, without the size prefix)
pub fn compile_function(function: &Function, mapping: &Mapping<'_>) -> ByteWriter {
    let mut compiler = CodeCompiler {
        mapping,
        code: ByteWriter::new(),
        scratch: function.slot_count() as u32,
        uses_scratch: false,
    };

    compiler.emit(&function.body, Position::Discard);

    if function.return_type == Type::I32 {
        compiler.op(Opcode::I32Const);
        compiler.code.append_var_s(0);
    }
    compiler.op(Opcode::End);

    let local_count = function.local_count + u32::from(compiler.uses_scratch);
    let mut body = ByteWriter::new();
    if local_count > 0 {
        body.append_var_u(1);
        body.append_var_u(local_count);
        body.append_byte(I32);
    } else {
        body.append_var_u(0);
    }
    body.append_bytes(compiler.code.as_bytes());
    body
}

impl CodeCompiler<'_, '_> {
    fn op(&mut self, opcode: Opcode) {
        self.code.append_byte(opcode.to_u8());
    }

    fn emit(&mut self, node: &Node, position: Position) {
        let children = &node.children;

        match node.kind {
            Kind::Nop => self.op(Opcode::Nop),

            Kind::VoidCall | Kind::I32Call => {
                self.emit_values(children);
                self.op(Opcode::Call);
                let index = function_index(self.mapping, node.value as u32);
                self.code.append_var_u(index);
            }
            Kind::VoidCallImport | Kind::I32CallImport => {
                self.emit_values(children);
                self.op(Opcode::Call);
                let index = self.mapping.import_position(node.value as u32);
                self.code.append_var_u(index);
            }

            Kind::I32Const => {
                self.op(Opcode::I32Const);
                // u32 constants are encoded by their two's-complement bits
                self.code.append_var_s(node.value as i32);
            }
            Kind::I32LoadLocal => {
                self.op(Opcode::LocalGet);
                self.code.append_var_u(node.value as u32);
            }
            Kind::I32StoreLocal => {
                self.emit(&children[0], Position::Value);
                self.op(match position {
                    Position::Value => Opcode::LocalTee,
                    Position::Discard => Opcode::LocalSet,
                });
                self.code.append_var_u(node.value as u32);
                return;
            }

            Kind::I32Load => self.load(node, Opcode::I32Load),
            Kind::I32Load8S => self.load(node, Opcode::I32Load8S),
            Kind::I32Load8U => self.load(node, Opcode::I32Load8U),
            Kind::I32Load16S => self.load(node, Opcode::I32Load16S),
            Kind::I32Load16U => self.load(node, Opcode::I32Load16U),

            Kind::I32Store => return self.store(node, Opcode::I32Store, position),
            Kind::I32Store8 => return self.store(node, Opcode::I32Store8, position),
            Kind::I32Store16 => return self.store(node, Opcode::I32Store16, position),

            Kind::I32Add => self.binary(node, Opcode::I32Add),
            Kind::I32Sub => self.binary(node, Opcode::I32Sub),
            Kind::I32Mul => self.binary(node, Opcode::I32Mul),
            Kind::I32DivS => self.binary(node, Opcode::I32DivS),
            Kind::I32DivU => self.binary(node, Opcode::I32DivU),
            Kind::I32RemS => self.binary(node, Opcode::I32RemS),
            Kind::I32RemU => self.binary(node, Opcode::I32RemU),
            Kind::I32And => self.binary(node, Opcode::I32And),
            Kind::I32Or => self.binary(node, Opcode::I32Or),
            Kind::I32Xor => self.binary(node, Opcode::I32Xor),
            Kind::I32Shl => self.binary(node, Opcode::I32Shl),
            Kind::I32ShrS => self.binary(node, Opcode::I32ShrS),
            Kind::I32ShrU => self.binary(node, Opcode::I32ShrU),
            Kind::I32Eq => self.binary(node, Opcode::I32Eq),
            Kind::I32Ne => self.binary(node, Opcode::I32Ne),
            Kind::I32LtS => self.binary(node, Opcode::I32LtS),
            Kind::I32LtU => self.binary(node, Opcode::I32LtU),
            Kind::I32LeS => self.binary(node, Opcode::I32LeS),
            Kind::I32LeU => self.binary(node, Opcode::I32LeU),
            Kind::I32GtS => self.binary(node, Opcode::I32GtS),
            Kind::I32GtU => self.binary(node, Opcode::I32GtU),
            Kind::I32GeS => self.binary(node, Opcode::I32GeS),
            Kind::I32GeU => self.binary(node, Opcode::I32GeU),

            Kind::I32Select => {
                self.emit(&children[0], Position::Value);
                self.op(Opcode::If);
                self.code.append_byte(I32);
                self.emit(&children[1], Position::Value);
                self.op(Opcode::Else);
                self.emit(&children[2], Position::Value);
                self.op(Opcode::End);
            }

            Kind::Block => {
                for child in children {
                    self.emit(child, Position::Discard);
                }
            }
            Kind::If => {
                self.emit(&children[0], Position::Value);
                self.op(Opcode::If);
                self.code.append_byte(VOID_BLOCK);
                self.emit(&children[1], Position::Discard);
                if children[2].kind != Kind::Nop {
                    self.op(Opcode::Else);
                    self.emit(&children[2], Position::Discard);
                }
                self.op(Opcode::End);
            }
            Kind::While => {
                self.emit(&children[0], Position::Value);
                self.op(Opcode::If);
                self.code.append_byte(VOID_BLOCK);
                self.op(Opcode::Loop);
                self.code.append_byte(VOID_BLOCK);
                self.emit(&children[1], Position::Discard);
                self.emit(&children[0], Position::Value);
                self.op(Opcode::BrIf);
                self.code.append_var_u(0);
                self.op(Opcode::End);
                self.op(Opcode::End);
            }
            Kind::Return => {
                let value = &children[0];
                let position = match value.result_type() {
                    Type::I32 => Position::Value,
                    Type::Void => Position::Discard,
                };
                self.emit(value, position);
                self.op(Opcode::Return);
            }
        }

        if position == Position::Discard && node.result_type() == Type::I32 {
            self.op(Opcode::Drop);
        }
    }

    fn emit_values(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.emit(node, Position::Value);
        }
    }

    fn binary(&mut self, node: &Node, opcode: Opcode) {
        self.emit_values(&node.children);
        self.op(opcode);
    }

    fn load(&mut self, node: &Node, opcode: Opcode) {
        self.emit(&node.children[0], Position::Value);
        self.memory_access(opcode, node.value);
    }

    /// Stores in value position keep a copy of the value in the scratch
    /// local and push it back after the store
    fn store(&mut self, node: &Node, opcode: Opcode, position: Position) {
        self.emit_values(&node.children);

        match position {
            Position::Discard => self.memory_access(opcode, node.value),
            Position::Value => {
                self.uses_scratch = true;
                self.op(Opcode::LocalTee);
                self.code.append_var_u(self.scratch);
                self.memory_access(opcode, node.value);
                self.op(Opcode::LocalGet);
                self.code.append_var_u(self.scratch);
            }
        }
    }

    fn memory_access(&mut self, opcode: Opcode, offset: i64) {
        self.op(opcode);
        self.code.append_var_u(opcode.alignment().unwrap_or(0));
        self.code.append_var_u(offset as u32);
    }
}

/// Body of the exported `alloc(size)` bump allocator.
///
/// Rounds the request up to 8 bytes, doubles the memory until the new end
/// fits and traps when the memory cannot grow further.
pub fn allocator_body(free_pointer: u32) -> ByteWriter {
    const SIZE: u32 = 0;
    const START: u32 = 1;
    const END: u32 = 2;

    let mut body = ByteWriter::new();
    let op = |body: &mut ByteWriter, opcode: Opcode| body.append_byte(opcode.to_u8());

    // Two extra locals: start, end
    body.append_var_u(1);
    body.append_var_u(2);
    body.append_byte(I32);

    op(&mut body, Opcode::GlobalGet);
    body.append_var_u(free_pointer);
    op(&mut body, Opcode::LocalTee);
    body.append_var_u(START);
    op(&mut body, Opcode::LocalGet);
    body.append_var_u(SIZE);
    op(&mut body, Opcode::I32Add);
    op(&mut body, Opcode::I32Const);
    body.append_var_s(7);
    op(&mut body, Opcode::I32Add);
    op(&mut body, Opcode::I32Const);
    body.append_var_s(-8);
    op(&mut body, Opcode::I32And);
    op(&mut body, Opcode::LocalSet);
    body.append_var_u(END);

    // Wrapped past the top of the address space
    op(&mut body, Opcode::LocalGet);
    body.append_var_u(END);
    op(&mut body, Opcode::LocalGet);
    body.append_var_u(START);
    op(&mut body, Opcode::I32LtU);
    op(&mut body, Opcode::If);
    body.append_byte(VOID_BLOCK);
    op(&mut body, Opcode::Unreachable);
    op(&mut body, Opcode::End);

    op(&mut body, Opcode::Block);
    body.append_byte(VOID_BLOCK);
    op(&mut body, Opcode::Loop);
    body.append_byte(VOID_BLOCK);

    // end <= memory.size * 65536
    op(&mut body, Opcode::LocalGet);
    body.append_var_u(END);
    op(&mut body, Opcode::MemorySize);
    body.append_byte(0);
    op(&mut body, Opcode::I32Const);
    body.append_var_s(16);
    op(&mut body, Opcode::I32Shl);
    op(&mut body, Opcode::I32LeU);
    op(&mut body, Opcode::BrIf);
    body.append_var_u(1);

    op(&mut body, Opcode::MemorySize);
    body.append_byte(0);
    op(&mut body, Opcode::MemoryGrow);
    body.append_byte(0);
    op(&mut body, Opcode::I32Const);
    body.append_var_s(-1);
    op(&mut body, Opcode::I32Eq);
    op(&mut body, Opcode::If);
    body.append_byte(VOID_BLOCK);
    op(&mut body, Opcode::Unreachable);
    op(&mut body, Opcode::End);
    op(&mut body, Opcode::Br);
    body.append_var_u(0);

    op(&mut body, Opcode::End);
    op(&mut body, Opcode::End);

    op(&mut body, Opcode::LocalGet);
    body.append_var_u(END);
    op(&mut body, Opcode::GlobalSet);
    body.append_var_u(free_pointer);
    op(&mut body, Opcode::LocalGet);
    body.append_var_u(START);
    op(&mut body, Opcode::End);

    body
}
