//! Module sections

use crate::wasm::opcodes::SectionId;
use crate::writer::ByteWriter;

/// One section under construction: `[id][length][payload]` once written
#[derive(Debug)]
pub struct Section {
    pub id: SectionId,
    pub payload: ByteWriter,
}

impl Section {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            payload: ByteWriter::new(),
        }
    }

    pub fn write_to(&self, out: &mut ByteWriter) {
        out.append_byte(self.id as u8);
        out.append_sized(&self.payload);
    }
}
