use crate::error::{Error, Result};

/// Little-endian reads over captured bytes.
///
/// Implementors only provide [`read_bytes`](ReadMemory::read_bytes); every
/// scalar helper is derived from it.
pub trait ReadMemory {
    /// Borrow `size` bytes starting at `address`
    fn read_bytes(&self, address: u64, size: usize) -> Result<&[u8]>;

    fn read_u8(&self, address: u64) -> Result<u8> {
        Ok(self.read_bytes(address, 1)?[0])
    }

    fn read_i32(&self, address: u64) -> Result<i32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(i32::from_le_bytes(to_array(bytes, address)?))
    }

    fn read_u32(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        Ok(u32::from_le_bytes(to_array(bytes, address)?))
    }

    fn read_u64(&self, address: u64) -> Result<u64> {
        let bytes = self.read_bytes(address, 8)?;
        Ok(u64::from_le_bytes(to_array(bytes, address)?))
    }

    /// Read a pointer of the given width (4 or 8 bytes), zero-extended to u64
    fn read_pointer(&self, address: u64, pointer_size: u64) -> Result<u64> {
        match pointer_size {
            4 => self.read_u32(address).map(u64::from),
            8 => self.read_u64(address),
            other => Err(Error::InvalidPointerSize(other as u32)),
        }
    }
}

fn to_array<const N: usize>(bytes: &[u8], address: u64) -> Result<[u8; N]> {
    bytes
        .try_into()
        .map_err(|_| Error::read_failed(address, format!("expected {} bytes", N)))
}

/// A type's static field bytes, addressed by offset from the start of the blob
#[derive(Debug, Clone, Copy)]
pub struct StaticBlob<'a> {
    bytes: &'a [u8],
}

impl<'a> StaticBlob<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl ReadMemory for StaticBlob<'_> {
    fn read_bytes(&self, address: u64, size: usize) -> Result<&[u8]> {
        let start = usize::try_from(address)
            .map_err(|_| Error::read_failed(address, "offset out of range"))?;
        start
            .checked_add(size)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or_else(|| {
                Error::read_failed(
                    address,
                    format!("{} bytes past end of {}-byte static blob", size, self.bytes.len()),
                )
            })
    }
}
