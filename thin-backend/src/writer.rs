//! Growable byte buffer with the integer encodings the binary format uses

/// Append-only byte sink
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn append_byte(&mut self, value: u8) {
        self.bytes.push(value);
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Fixed-width little-endian word
    pub fn append_u32_le(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Unsigned LEB128
    pub fn append_var_u(&mut self, mut value: u32) {
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.append_byte(byte);
                return;
            }
            self.append_byte(byte | 0x80);
        }
    }

    /// Signed LEB128
    pub fn append_var_s(&mut self, mut value: i32) {
        loop {
            let byte = (value & 0x7F) as u8;
            // Arithmetic shift keeps the sign
            value >>= 7;
            let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
            if done {
                self.append_byte(byte);
                return;
            }
            self.append_byte(byte | 0x80);
        }
    }

    /// Length-prefixed UTF-8 string
    pub fn append_name(&mut self, name: &str) {
        self.append_var_u(name.len() as u32);
        self.append_bytes(name.as_bytes());
    }

    /// Length-prefixed nested buffer
    pub fn append_sized(&mut self, other: &ByteWriter) {
        self.append_var_u(other.len() as u32);
        self.append_bytes(other.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_u(value: u32) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.append_var_u(value);
        writer.into_bytes()
    }

    fn var_s(value: i32) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.append_var_s(value);
        writer.into_bytes()
    }

    #[test]
    fn test_unsigned_leb128() {
        assert_eq!(var_u(0), vec![0x00]);
        assert_eq!(var_u(127), vec![0x7F]);
        assert_eq!(var_u(128), vec![0x80, 0x01]);
        assert_eq!(var_u(624485), vec![0xE5, 0x8E, 0x26]);
        assert_eq!(var_u(u32::MAX), vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_signed_leb128() {
        assert_eq!(var_s(0), vec![0x00]);
        assert_eq!(var_s(63), vec![0x3F]);
        assert_eq!(var_s(64), vec![0xC0, 0x00]);
        assert_eq!(var_s(-1), vec![0x7F]);
        assert_eq!(var_s(-64), vec![0x40]);
        assert_eq!(var_s(-65), vec![0xBF, 0x7F]);
        assert_eq!(var_s(-123456), vec![0xC0, 0xBB, 0x78]);
        assert_eq!(var_s(i32::MIN), vec![0x80, 0x80, 0x80, 0x80, 0x78]);
    }

    #[test]
    fn test_fixed_width_and_names() {
        let mut writer = ByteWriter::new();
        writer.append_u32_le(0x6d736100);
        writer.append_name("lib");
        assert_eq!(writer.as_bytes(), &[0x00, 0x61, 0x73, 0x6D, 3, b'l', b'i', b'b']);

        let mut outer = ByteWriter::new();
        outer.append_sized(&writer);
        assert_eq!(outer.len(), 9);
        assert_eq!(outer.as_bytes()[0], 8);
    }
}
