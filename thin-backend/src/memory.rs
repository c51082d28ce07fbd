//! Memory capability shared by both backends

use serde::{Deserialize, Serialize};

/// Size of one binary-format memory page
pub const PAGE_SIZE: usize = 65536;

/// Default ceiling for growable memory (256 MiB)
pub const DEFAULT_MAX_BYTES: u32 = 256 * 1024 * 1024;

/// Whether generated code may grow its memory at run time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryModel {
    /// Memory stays at the size of the data segment
    #[default]
    Fixed,
    /// A bump allocator (`alloc`) is exported; the memory doubles on
    /// overflow up to `max_bytes`
    Growable { max_bytes: u32 },
}

impl MemoryModel {
    pub fn growable() -> Self {
        MemoryModel::Growable {
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    pub fn is_growable(&self) -> bool {
        matches!(self, MemoryModel::Growable { .. })
    }
}

/// Pages needed to hold `bytes`
pub fn pages_for(bytes: usize) -> u32 {
    bytes.div_ceil(PAGE_SIZE) as u32
}

/// First address handed out by the allocator: the end of the data segment
/// rounded up to 8
pub fn heap_start(data_len: usize) -> u32 {
    ((data_len + 7) & !7) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages() {
        assert_eq!(pages_for(0), 0);
        assert_eq!(pages_for(1), 1);
        assert_eq!(pages_for(PAGE_SIZE), 1);
        assert_eq!(pages_for(128 * 1024), 2);
        assert_eq!(pages_for(128 * 1024 + 1), 3);
    }

    #[test]
    fn test_heap_start_alignment() {
        assert_eq!(heap_start(0), 0);
        assert_eq!(heap_start(5), 8);
        assert_eq!(heap_start(16), 16);
        assert!(MemoryModel::growable().is_growable());
        assert!(!MemoryModel::default().is_growable());
    }
}
