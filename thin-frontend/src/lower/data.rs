//! Initial data segment layout
//!
//! Globals and string constants are laid out from address 0. The first word
//! is reserved so no object lives at address 0. Every entry keeps the segment
//! length a multiple of four.

use std::collections::HashMap;

/// Bytes reserved at the start of the segment
const RESERVED: usize = 4;

#[derive(Debug)]
pub struct DataSegment {
    bytes: Vec<u8>,
    /// String contents to their address
    strings: HashMap<Vec<u8>, u32>,
}

impl DataSegment {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; RESERVED],
            strings: HashMap::new(),
        }
    }

    /// Append a little-endian word and return its address
    pub fn push_word(&mut self, value: i32) -> u32 {
        let address = self.bytes.len() as u32;
        self.bytes.extend_from_slice(&value.to_le_bytes());
        address
    }

    /// Address of a NUL-terminated UTF-8 copy of `text`, shared between
    /// identical strings
    pub fn intern_string(&mut self, text: &str) -> u32 {
        if let Some(&address) = self.strings.get(text.as_bytes()) {
            return address;
        }

        let address = self.bytes.len() as u32;
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }

        self.strings.insert(text.as_bytes().to_vec(), address);
        address
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Final memory image: the laid out bytes zero-filled to at least
    /// `memory_size`
    pub fn into_memory(mut self, memory_size: usize) -> Vec<u8> {
        if self.bytes.len() < memory_size {
            self.bytes.resize(memory_size, 0);
        }
        self.bytes
    }
}

impl Default for DataSegment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_layout() {
        let mut data = DataSegment::new();
        assert_eq!(data.push_word(-2), 4);
        assert_eq!(data.intern_string("hi"), 8);
        assert_eq!(data.intern_string("four"), 12);
        assert_eq!(data.intern_string("hi"), 8);
        assert_eq!(data.push_word(0x0102), 20);
        assert_eq!(data.len(), 24);

        let memory = data.into_memory(32);
        assert_eq!(
            memory[..24].to_vec(),
            vec![
                0, 0, 0, 0, //
                0xFE, 0xFF, 0xFF, 0xFF, //
                b'h', b'i', 0, 0, //
                b'f', b'o', b'u', b'r', 0, 0, 0, 0, //
                0x02, 0x01, 0, 0,
            ]
        );
        assert_eq!(memory.len(), 32);
    }

    #[test]
    fn test_memory_grows_past_requested_size() {
        let mut data = DataSegment::new();
        data.intern_string("abcdefgh");
        assert_eq!(data.into_memory(8).len(), 16);
    }

    #[test]
    fn test_utf8_strings() {
        let mut data = DataSegment::new();
        let address = data.intern_string("é");
        let memory = data.into_memory(0);
        assert_eq!(&memory[address as usize..address as usize + 4], &[0xC3, 0xA9, 0, 0]);
    }
}
