//! Binary format constants

/// Module preamble: `\0asm`
pub const MAGIC: u32 = 0x6d736100;
pub const VERSION: u32 = 1;

/// Value type byte for i32
pub const I32: u8 = 0x7F;
/// Block type byte for blocks that produce nothing
pub const VOID_BLOCK: u8 = 0x40;
/// Leading byte of a function type
pub const FUNC: u8 = 0x60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SectionId {
    Type = 1,
    Import = 2,
    Function = 3,
    Memory = 5,
    Global = 6,
    Export = 7,
    Code = 10,
    Data = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExternalKind {
    Function = 0,
    Memory = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    // Control
    Unreachable = 0x00,
    Nop = 0x01,
    Block = 0x02,
    Loop = 0x03,
    If = 0x04,
    Else = 0x05,
    End = 0x0B,
    Br = 0x0C,
    BrIf = 0x0D,
    Return = 0x0F,
    Call = 0x10,
    Drop = 0x1A,

    // Variables
    LocalGet = 0x20,
    LocalSet = 0x21,
    LocalTee = 0x22,
    GlobalGet = 0x23,
    GlobalSet = 0x24,

    // Memory
    I32Load = 0x28,
    I32Load8S = 0x2C,
    I32Load8U = 0x2D,
    I32Load16S = 0x2E,
    I32Load16U = 0x2F,
    I32Store = 0x36,
    I32Store8 = 0x3A,
    I32Store16 = 0x3B,
    MemorySize = 0x3F,
    MemoryGrow = 0x40,

    // Numeric
    I32Const = 0x41,
    I32Eqz = 0x45,
    I32Eq = 0x46,
    I32Ne = 0x47,
    I32LtS = 0x48,
    I32LtU = 0x49,
    I32GtS = 0x4A,
    I32GtU = 0x4B,
    I32LeS = 0x4C,
    I32LeU = 0x4D,
    I32GeS = 0x4E,
    I32GeU = 0x4F,
    I32Add = 0x6A,
    I32Sub = 0x6B,
    I32Mul = 0x6C,
    I32DivS = 0x6D,
    I32DivU = 0x6E,
    I32RemS = 0x6F,
    I32RemU = 0x70,
    I32And = 0x71,
    I32Or = 0x72,
    I32Xor = 0x73,
    I32Shl = 0x74,
    I32ShrS = 0x75,
    I32ShrU = 0x76,
}

impl Opcode {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// log2 of the natural alignment for memory accesses
    pub fn alignment(self) -> Option<u32> {
        match self {
            Opcode::I32Load | Opcode::I32Store => Some(2),
            Opcode::I32Load16S | Opcode::I32Load16U | Opcode::I32Store16 => Some(1),
            Opcode::I32Load8S | Opcode::I32Load8U | Opcode::I32Store8 => Some(0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_values() {
        assert_eq!(MAGIC.to_le_bytes(), *b"\0asm");
        assert_eq!(Opcode::End.to_u8(), 0x0B);
        assert_eq!(Opcode::I32ShrU.to_u8(), 0x76);
        assert_eq!(SectionId::Data as u8, 11);
        assert_eq!(Opcode::I32Store16.alignment(), Some(1));
        assert_eq!(Opcode::I32Add.alignment(), None);
    }
}
