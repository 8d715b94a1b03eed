//! Synthetic capture construction
//!
//! Lays out types, vtables and heap objects the way a Mono-style runtime does,
//! so graph and diff behaviour can be exercised without a real capture.
//!
//! Address map:
//!
//! ```text
//! 0x0400_0000  type-info addresses (identity keys only, not backed by memory)
//! 0x0800_0000  vtable section: one two-pointer block per type
//! 0x1000_0000  heap section: objects in allocation order, 8-byte aligned
//! ```
//!
//! The write helpers panic on addresses outside the heap section; the builder
//! is meant for tests and demos, not for decoding real captures.

use super::{NO_TYPE_INDEX, RawCapture, RawField, RawLayout, RawSection, RawType};
use crate::memory::VmLayout;
use crate::memory::layout::type_flags;

const TYPE_INFO_BASE: u64 = 0x0400_0000;
const TYPE_INFO_STRIDE: u64 = 0x40;
const VTABLE_BASE: u64 = 0x0800_0000;
const HEAP_BASE: u64 = 0x1000_0000;
const ALIGNMENT: u64 = 8;

#[derive(Debug, Clone)]
struct TypeDraft {
    raw: RawType,
    /// Next free instance offset (boxed, so it includes the object header)
    next_offset: u64,
    fixed_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CaptureBuilder {
    layout: VmLayout,
    types: Vec<TypeDraft>,
    heap: Vec<u8>,
    vtables: Vec<u8>,
    roots: Vec<u64>,
    extra_sections: Vec<RawSection>,
}

impl CaptureBuilder {
    pub fn new(layout: VmLayout) -> Self {
        Self {
            layout,
            types: Vec::new(),
            heap: Vec::new(),
            vtables: Vec::new(),
            roots: Vec::new(),
            extra_sections: Vec::new(),
        }
    }

    pub fn layout(&self) -> &VmLayout {
        &self.layout
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    /// Add an atomic value type: a struct whose only field is of its own type
    pub fn add_primitive(&mut self, name: &str, size: u64) -> usize {
        let index = self.push_type(name, "mscorlib", type_flags::VALUE_TYPE, NO_TYPE_INDEX);
        let header = self.layout.object_header_size();
        let draft = &mut self.types[index];
        draft.raw.fields.push(RawField {
            name: "m_value".to_string(),
            offset: header as i32,
            type_index: index as i32,
            is_static: false,
        });
        draft.fixed_size = Some(size);
        draft.next_offset = header + size;
        index
    }

    /// Add a composite value type; fields are appended with [`add_field`](Self::add_field)
    pub fn add_struct(&mut self, name: &str, assembly: &str) -> usize {
        self.push_type(name, assembly, type_flags::VALUE_TYPE, NO_TYPE_INDEX)
    }

    /// Add a reference type. Fields of `base` must already be laid out.
    pub fn add_class(&mut self, name: &str, assembly: &str, base: Option<usize>) -> usize {
        let base_index = base.map_or(NO_TYPE_INDEX, |b| b as i32);
        let index = self.push_type(name, assembly, 0, base_index);
        if let Some(base) = base {
            self.types[index].next_offset = self.types[base].next_offset;
        }
        index
    }

    /// Add the runtime's string type (no walkable fields)
    pub fn add_string_type(&mut self, name: &str) -> usize {
        let index = self.push_type(name, "mscorlib", 0, NO_TYPE_INDEX);
        let size = self.layout.object_header_size() + 4 + 2;
        self.types[index].fixed_size = Some(size);
        index
    }

    pub fn add_array(&mut self, name: &str, element: usize, rank: u32) -> usize {
        let flags = type_flags::ARRAY | (rank << type_flags::ARRAY_RANK_SHIFT);
        let index = self.push_type(name, "mscorlib", flags, element as i32);
        let element_size = self.element_size(element);
        self.types[index].fixed_size = Some(element_size);
        index
    }

    /// Append an instance field at the next free offset, returning that offset
    pub fn add_field(&mut self, owner: usize, name: &str, field_type: usize) -> u64 {
        let offset = self.types[owner].next_offset;
        let size = self.element_size(field_type);
        self.add_field_at(owner, name, field_type, offset);
        self.types[owner].next_offset = offset + size;
        offset
    }

    /// Add an instance field at an explicit (boxed) offset
    pub fn add_field_at(&mut self, owner: usize, name: &str, field_type: usize, offset: u64) {
        self.types[owner].raw.fields.push(RawField {
            name: name.to_string(),
            offset: offset as i32,
            type_index: field_type as i32,
            is_static: false,
        });
    }

    /// Add a static field, growing the owner's static blob; returns the blob offset
    pub fn add_static_field(&mut self, owner: usize, name: &str, field_type: usize) -> u64 {
        let size = self.element_size(field_type);
        let draft = &mut self.types[owner];
        let offset = draft.raw.static_bytes.len() as u64;
        draft.raw.static_bytes.resize((offset + size) as usize, 0);
        draft.raw.fields.push(RawField {
            name: name.to_string(),
            offset: offset as i32,
            type_index: field_type as i32,
            is_static: true,
        });
        offset
    }

    /// Store a pointer into a type's static blob
    pub fn set_static_pointer(&mut self, owner: usize, offset: u64, target: u64) {
        let bytes = self.pointer_bytes(target);
        self.set_static_bytes(owner, offset, &bytes);
    }

    pub fn set_static_bytes(&mut self, owner: usize, offset: u64, bytes: &[u8]) {
        let blob = &mut self.types[owner].raw.static_bytes;
        let start = offset as usize;
        blob[start..start + bytes.len()].copy_from_slice(bytes);
    }

    /// Override the type-info address of a type
    pub fn set_type_info_address(&mut self, ty: usize, address: u64) {
        self.types[ty].raw.type_info_address = address;
        let slot = self.vtable_address(ty);
        let bytes = self.pointer_bytes(address);
        let start = (slot - VTABLE_BASE) as usize;
        self.vtables[start..start + bytes.len()].copy_from_slice(&bytes);
    }

    pub fn type_info_address(&self, ty: usize) -> u64 {
        self.types[ty].raw.type_info_address
    }

    pub fn vtable_address(&self, ty: usize) -> u64 {
        VTABLE_BASE + ty as u64 * self.layout.pointer_size() * 2
    }

    /// Byte offset of a field, searching base classes as well
    pub fn field_offset(&self, ty: usize, name: &str) -> Option<u64> {
        let mut current = Some(ty);
        while let Some(index) = current {
            let raw = &self.types[index].raw;
            if let Some(field) = raw.fields.iter().find(|f| f.name == name && !f.is_static) {
                return Some(field.offset as u64);
            }
            current = usize::try_from(raw.base_or_element_type_index).ok();
        }
        None
    }

    // ==========================================================================
    // Heap
    // ==========================================================================

    /// Reserve zeroed heap bytes
    pub fn alloc_raw(&mut self, size: u64) -> u64 {
        let offset = (self.heap.len() as u64).next_multiple_of(ALIGNMENT);
        let end = offset + size.max(1);
        self.heap.resize(end.next_multiple_of(ALIGNMENT) as usize, 0);
        HEAP_BASE + offset
    }

    /// Allocate an instance of a reference type with its vtable pointer set
    pub fn alloc_object(&mut self, ty: usize) -> u64 {
        let size = self.declared_size(ty);
        let address = self.alloc_raw(size);
        self.write_pointer(address, self.vtable_address(ty));
        address
    }

    /// Allocate a string object holding `text` as UTF-16 plus a terminator
    pub fn alloc_string(&mut self, string_type: usize, text: &str) -> u64 {
        let units: Vec<u16> = text.encode_utf16().collect();
        let header = self.layout.object_header_size();
        let size = header + 4 + (units.len() as u64 + 1) * 2;
        let address = self.alloc_raw(size);
        self.write_pointer(address, self.vtable_address(string_type));
        self.write_i32(address + header, units.len() as i32);
        let chars: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        self.write_bytes(address + header + 4, &chars);
        address
    }

    /// Allocate a one-dimensional array (null bounds pointer, length in the size word)
    pub fn alloc_array(&mut self, array_type: usize, length: u64) -> u64 {
        let element_size = self.array_element_size(array_type);
        let address = self.alloc_raw(self.layout.array_header_size() + element_size * length);
        self.write_pointer(address, self.vtable_address(array_type));
        self.write_pointer(address + self.layout.array_bounds_offset(), 0);
        self.write_pointer(address + self.layout.array_size_offset(), length);
        address
    }

    /// Allocate an array whose dimensions live in a separate bounds record
    pub fn alloc_multi_array(&mut self, array_type: usize, dimensions: &[u64]) -> u64 {
        let pointer = self.layout.pointer_size();
        let bounds = self.alloc_raw(dimensions.len() as u64 * pointer * 2);
        for (i, length) in dimensions.iter().enumerate() {
            self.write_pointer(bounds + i as u64 * pointer * 2, *length);
        }

        let total: u64 = dimensions.iter().product();
        let element_size = self.array_element_size(array_type);
        let address = self.alloc_raw(self.layout.array_header_size() + element_size * total);
        self.write_pointer(address, self.vtable_address(array_type));
        self.write_pointer(address + self.layout.array_bounds_offset(), bounds);
        self.write_pointer(address + self.layout.array_size_offset(), total);
        address
    }

    /// Point a reference field of `object` at `target`
    ///
    /// # Panics
    ///
    /// Panics if `ty` has no instance field called `name`.
    pub fn set_field(&mut self, object: u64, ty: usize, name: &str, target: u64) {
        let offset = self
            .field_offset(ty, name)
            .unwrap_or_else(|| panic!("type {} has no field {}", self.types[ty].raw.name, name));
        self.write_pointer(object + offset, target);
    }

    /// Point element `index` of a reference-type array at `target`
    pub fn set_element(&mut self, array: u64, index: u64, target: u64) {
        let address =
            array + self.layout.array_header_size() + index * self.layout.pointer_size();
        self.write_pointer(address, target);
    }

    pub fn add_root(&mut self, address: u64) {
        self.roots.push(address);
    }

    /// Add an extra section outside the builder-managed heap
    pub fn add_section(&mut self, start: u64, bytes: Vec<u8>) {
        self.extra_sections.push(RawSection { start, bytes });
    }

    pub fn write_pointer(&mut self, address: u64, value: u64) {
        let bytes = self.pointer_bytes(value);
        self.write_bytes(address, &bytes);
    }

    pub fn write_i32(&mut self, address: u64, value: i32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// # Panics
    ///
    /// Panics if the write falls outside the heap section.
    pub fn write_bytes(&mut self, address: u64, bytes: &[u8]) {
        let start = address
            .checked_sub(HEAP_BASE)
            .map(|offset| offset as usize)
            .filter(|start| start + bytes.len() <= self.heap.len())
            .unwrap_or_else(|| panic!("write at 0x{:X} outside the heap section", address));
        self.heap[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn build(&self) -> RawCapture {
        let types = (0..self.types.len())
            .map(|index| {
                let mut raw = self.types[index].raw.clone();
                raw.size = self.declared_size(index) as i32;
                raw
            })
            .collect();

        let mut sections = Vec::new();
        if !self.heap.is_empty() {
            sections.push(RawSection {
                start: HEAP_BASE,
                bytes: self.heap.clone(),
            });
        }
        if !self.vtables.is_empty() {
            sections.push(RawSection {
                start: VTABLE_BASE,
                bytes: self.vtables.clone(),
            });
        }
        sections.extend(self.extra_sections.iter().cloned());

        RawCapture {
            layout: RawLayout::from(&self.layout),
            sections,
            types,
            gc_handles: self.roots.clone(),
        }
    }

    // ==========================================================================
    // Internals
    // ==========================================================================

    fn push_type(&mut self, name: &str, assembly: &str, flags: u32, base: i32) -> usize {
        let index = self.types.len();
        let type_info_address = TYPE_INFO_BASE + index as u64 * TYPE_INFO_STRIDE;
        self.types.push(TypeDraft {
            raw: RawType {
                name: name.to_string(),
                assembly: assembly.to_string(),
                type_info_address,
                base_or_element_type_index: base,
                flags,
                size: 0,
                fields: Vec::new(),
                static_bytes: Vec::new(),
            },
            next_offset: self.layout.object_header_size(),
            fixed_size: None,
        });

        let mut block = self.pointer_bytes(type_info_address);
        block.resize(self.layout.pointer_size() as usize * 2, 0);
        self.vtables.extend_from_slice(&block);
        index
    }

    fn is_value_type(&self, ty: usize) -> bool {
        self.types[ty].raw.flags & type_flags::VALUE_TYPE != 0
    }

    /// Size recorded in the type record: boxed size for classes, unboxed for value types
    fn declared_size(&self, ty: usize) -> u64 {
        let draft = &self.types[ty];
        if let Some(size) = draft.fixed_size {
            return size;
        }
        if self.is_value_type(ty) {
            draft.next_offset - self.layout.object_header_size()
        } else {
            draft.next_offset
        }
    }

    /// Bytes a value of `ty` occupies when stored inline
    fn element_size(&self, ty: usize) -> u64 {
        if self.is_value_type(ty) {
            self.declared_size(ty)
        } else {
            self.layout.pointer_size()
        }
    }

    fn array_element_size(&self, array_type: usize) -> u64 {
        let element = self.types[array_type].raw.base_or_element_type_index as usize;
        self.element_size(element)
    }

    fn pointer_bytes(&self, value: u64) -> Vec<u8> {
        if self.layout.pointer_size() == 4 {
            (value as u32).to_le_bytes().to_vec()
        } else {
            value.to_le_bytes().to_vec()
        }
    }
}
