//! Memory layout of the captured virtual machine
//!
//! This module centralizes the byte-level layout used for decoding heap
//! objects: pointer width, header sizes, and the positions of the array
//! bookkeeping words inside an array header.

use serde::Serialize;

use crate::error::{Error, Result};

/// Bit layout of the `flags` word in a captured type record
pub mod type_flags {
    /// Type is a value type (struct / primitive)
    pub const VALUE_TYPE: u32 = 1 << 0;
    /// Type is an array
    pub const ARRAY: u32 = 1 << 1;
    /// Array rank lives in the upper 16 bits
    pub const ARRAY_RANK_MASK: u32 = 0xFFFF_0000;
    pub const ARRAY_RANK_SHIFT: u32 = 16;
}

/// Layout constants for string objects
pub mod string {
    /// Size of the character count that follows the object header
    pub const LENGTH_PREFIX: u64 = 4;
    /// Size of one UTF-16 code unit
    pub const CHAR_SIZE: u64 = 2;
}

/// Layout of the array bounds record pointed to by an array header
pub mod bounds {
    /// Each dimension record holds a length and a lower bound, both pointer sized
    pub const WORDS_PER_DIMENSION: u64 = 2;
}

/// Byte layout of the captured runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VmLayout {
    pointer_size: u32,
    object_header_size: u32,
    array_header_size: u32,
    array_bounds_offset: u32,
    array_size_offset: u32,
    heap_format_version: u32,
}

impl VmLayout {
    /// Create a layout, rejecting pointer widths the decoder cannot handle
    pub fn new(
        pointer_size: u32,
        object_header_size: u32,
        array_header_size: u32,
        array_bounds_offset: u32,
        array_size_offset: u32,
        heap_format_version: u32,
    ) -> Result<Self> {
        if pointer_size != 4 && pointer_size != 8 {
            return Err(Error::InvalidPointerSize(pointer_size));
        }

        Ok(Self {
            pointer_size,
            object_header_size,
            array_header_size,
            array_bounds_offset,
            array_size_offset,
            heap_format_version,
        })
    }

    /// Typical 64-bit Mono layout (16-byte object header, 32-byte array header)
    pub fn mono_64() -> Self {
        Self {
            pointer_size: 8,
            object_header_size: 16,
            array_header_size: 32,
            array_bounds_offset: 16,
            array_size_offset: 24,
            heap_format_version: 0,
        }
    }

    /// Typical 32-bit Mono layout
    pub fn mono_32() -> Self {
        Self {
            pointer_size: 4,
            object_header_size: 8,
            array_header_size: 16,
            array_bounds_offset: 8,
            array_size_offset: 12,
            heap_format_version: 0,
        }
    }

    pub fn pointer_size(&self) -> u64 {
        self.pointer_size as u64
    }

    pub fn object_header_size(&self) -> u64 {
        self.object_header_size as u64
    }

    pub fn array_header_size(&self) -> u64 {
        self.array_header_size as u64
    }

    pub fn array_bounds_offset(&self) -> u64 {
        self.array_bounds_offset as u64
    }

    pub fn array_size_offset(&self) -> u64 {
        self.array_size_offset as u64
    }

    pub fn heap_format_version(&self) -> u32 {
        self.heap_format_version
    }

    /// Truncate an address to the pointer width.
    ///
    /// 32-bit targets report addresses padded to 64 bits; the upper half is noise.
    pub fn mask_address(&self, address: u64) -> u64 {
        if self.pointer_size == 4 {
            address & 0xFFFF_FFFF
        } else {
            address
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_pointer_size() {
        let err = VmLayout::new(2, 8, 16, 8, 12, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidPointerSize(2)));
        assert!(VmLayout::new(16, 8, 16, 8, 12, 0).is_err());
    }

    #[test]
    fn test_accepts_supported_pointer_sizes() {
        assert_eq!(VmLayout::new(4, 8, 16, 8, 12, 1).unwrap().pointer_size(), 4);
        assert_eq!(VmLayout::new(8, 16, 32, 16, 24, 1).unwrap().pointer_size(), 8);
    }

    #[test]
    fn test_mask_address() {
        let narrow = VmLayout::mono_32();
        assert_eq!(narrow.mask_address(0xFFFF_FFFF_0000_1000), 0x1000);

        let wide = VmLayout::mono_64();
        assert_eq!(wide.mask_address(0xFFFF_FFFF_0000_1000), 0xFFFF_FFFF_0000_1000);
    }
}
