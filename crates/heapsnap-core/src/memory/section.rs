//! Heap section index
//!
//! Captured heap memory arrives as a list of `(start, bytes)` ranges. The
//! index keeps them sorted by start address so any pointer can be mapped back
//! to the range holding it with a binary search.

use tracing::debug;

use super::layout::VmLayout;
use super::reader::ReadMemory;
use crate::error::{Error, Result};

/// A contiguous captured byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySection {
    start: u64,
    bytes: Vec<u8>,
}

impl MemorySection {
    pub fn new(start: u64, bytes: Vec<u8>) -> Self {
        Self { start, bytes }
    }

    /// First address covered (inclusive)
    pub fn start(&self) -> u64 {
        self.start
    }

    /// First address past the section (exclusive), saturating at the top of the address space
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.bytes.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Half-open containment test on unsigned addresses.
    ///
    /// `address - start` is only evaluated once `address >= start`, so the
    /// comparison stays valid for sections ending at the top of the address space.
    pub fn contains(&self, address: u64) -> bool {
        address >= self.start && address - self.start < self.bytes.len() as u64
    }

    /// Number of bytes available from `address` to the end of the section
    pub fn remaining(&self, address: u64) -> u64 {
        if self.contains(address) {
            self.bytes.len() as u64 - (address - self.start)
        } else {
            0
        }
    }

    fn slice(&self, address: u64, size: usize) -> Option<&[u8]> {
        if !self.contains(address) {
            return None;
        }
        let offset = (address - self.start) as usize;
        offset
            .checked_add(size)
            .and_then(|end| self.bytes.get(offset..end))
    }
}

/// Sorted, non-overlapping set of heap sections
#[derive(Debug, Clone, Default)]
pub struct SectionIndex {
    sections: Vec<MemorySection>,
}

impl SectionIndex {
    /// Build the index, masking addresses to the layout's pointer width.
    ///
    /// Empty sections are dropped. Overlapping sections violate the capture
    /// format and are rejected.
    pub fn new(sections: Vec<MemorySection>, layout: &VmLayout) -> Result<Self> {
        let mut sections: Vec<MemorySection> = sections
            .into_iter()
            .filter(|section| !section.is_empty())
            .map(|section| MemorySection {
                start: layout.mask_address(section.start),
                bytes: section.bytes,
            })
            .collect();

        sections.sort_by_key(|section| section.start);

        for pair in sections.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.contains(next.start) {
                return Err(Error::InvalidCapture(format!(
                    "Heap sections overlap: [0x{:X}, 0x{:X}) and [0x{:X}, 0x{:X})",
                    prev.start,
                    prev.end(),
                    next.start,
                    next.end()
                )));
            }
        }

        debug!(
            "Indexed {} heap sections ({} bytes)",
            sections.len(),
            sections.iter().map(|s| s.len() as u64).sum::<u64>()
        );

        Ok(Self { sections })
    }

    /// Find the section covering `address`, or `None` for a dangling pointer
    pub fn find(&self, address: u64) -> Option<&MemorySection> {
        let idx = self
            .sections
            .partition_point(|section| section.start <= address);
        if idx == 0 {
            return None;
        }

        let candidate = &self.sections[idx - 1];
        candidate.contains(address).then_some(candidate)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemorySection> {
        self.sections.iter()
    }

    pub fn total_bytes(&self) -> u64 {
        self.sections.iter().map(|s| s.len() as u64).sum()
    }
}

impl ReadMemory for SectionIndex {
    /// Reads never span two sections, even when they happen to be adjacent
    fn read_bytes(&self, address: u64, size: usize) -> Result<&[u8]> {
        let section = self
            .find(address)
            .ok_or_else(|| Error::read_failed(address, "address not in any heap section"))?;
        section.slice(address, size).ok_or_else(|| {
            Error::read_failed(
                address,
                format!(
                    "{} bytes overrun section [0x{:X}, 0x{:X})",
                    size,
                    section.start(),
                    section.end()
                ),
            )
        })
    }
}
