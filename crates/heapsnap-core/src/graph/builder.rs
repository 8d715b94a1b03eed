//! Object graph builder
//!
//! # Walk Strategy
//!
//! Objects are memoized by address the moment they are created, before any
//! of their fields are read. Newly created objects are pushed onto an
//! explicit worklist and their fields are scanned when popped, so deep or
//! cyclic heaps never grow the call stack. A second arrival at an address
//! (cycle, shared child) only records the edge.
//!
//! ```text
//!   resolve(addr) ──► section? ──► vtable section? ──► type? ──► object
//!        │ no           │ no            │ no
//!        ▼              ▼               ▼
//!   unresolved[addr] = SectionNotFound | VtableSectionNotFound | TypeNotFound
//! ```
//!
//! Value-type fields are not pointers: their nested fields are read in place.
//! Embedded instance fields subtract the object header from their (boxed)
//! offset; top-level static fields index the static blob directly.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use encoding_rs::UTF_16LE;
use tracing::{debug, trace, warn};

use super::object::{ManagedObject, ObjectId, ReferenceFrom, ReferenceTo, UnresolvedReason};
use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::memory::layout::{bounds, string};
use crate::memory::{ReadMemory, SectionIndex, StaticBlob, VmLayout};
use crate::types::{FieldDescriptor, TypeCatalog, TypeDescriptor};

/// Deepest chain of value types embedded in each other that will be followed
const MAX_VALUE_NESTING: usize = 64;

/// Object scheduled for a field scan
#[derive(Debug, Clone, Copy)]
struct Pending {
    id: ObjectId,
    /// Element count for arrays, read once while sizing
    array_length: u64,
}

/// Source of an edge discovered during a scan
#[derive(Debug, Clone, Copy)]
enum Origin {
    Object(ObjectId),
    Static,
}

/// Walk result handed over to a [`Snapshot`](crate::snapshot::Snapshot)
#[derive(Debug, Default)]
pub struct GraphParts {
    pub objects: Vec<ManagedObject>,
    pub by_address: HashMap<u64, ObjectId>,
    pub unresolved: HashMap<u64, UnresolvedReason>,
}

pub struct GraphBuilder<'a> {
    layout: &'a VmLayout,
    sections: &'a SectionIndex,
    types: &'a TypeCatalog,
    string_type: Option<usize>,
    preview_length: usize,
    objects: Vec<ManagedObject>,
    by_address: HashMap<u64, ObjectId>,
    unresolved: HashMap<u64, UnresolvedReason>,
    pending: Vec<Pending>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        layout: &'a VmLayout,
        sections: &'a SectionIndex,
        types: &'a TypeCatalog,
        config: &AnalyzerConfig,
    ) -> Self {
        let string_type = types.find_by_name(&config.string_type_name).map(|t| t.index());
        if string_type.is_none() {
            debug!(
                "String type {} not in catalog, strings will not be decoded",
                config.string_type_name
            );
        }

        Self {
            layout,
            sections,
            types,
            string_type,
            preview_length: config.preview_length,
            objects: Vec::new(),
            by_address: HashMap::new(),
            unresolved: HashMap::new(),
            pending: Vec::new(),
        }
    }

    /// Walk the whole graph: GC handles first, then every type's statics.
    ///
    /// `cancel` is polled between top-level roots only.
    pub fn build(mut self, gc_handles: &[u64], cancel: Option<&AtomicBool>) -> Result<GraphParts> {
        let is_cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Relaxed));

        for (index, &handle) in gc_handles.iter().enumerate() {
            if is_cancelled() {
                return Err(Error::Cancelled);
            }

            let address = self.layout.mask_address(handle);
            if let Some(id) = self.resolve(address)? {
                self.objects[id.0]
                    .references_from
                    .push(ReferenceFrom::GcRoot { index });
            }
            self.drain()?;
        }
        debug!(
            "Walked {} GC handles: {} objects",
            gc_handles.len(),
            self.objects.len()
        );

        let types = self.types;
        for ty in types.iter() {
            if is_cancelled() {
                return Err(Error::Cancelled);
            }
            if ty.static_bytes().is_empty() {
                continue;
            }
            self.scan_statics(ty)?;
            self.drain()?;
        }

        debug!(
            "Object graph complete: {} objects, {} unresolved addresses",
            self.objects.len(),
            self.unresolved.len()
        );

        Ok(self.finish())
    }

    /// Resolve an address and walk everything reachable from it.
    ///
    /// Returns `None` for null, dangling or untyped addresses. Calling this
    /// twice for the same address returns the same id.
    pub fn analyze_object(&mut self, address: u64) -> Result<Option<ObjectId>> {
        let address = self.layout.mask_address(address);
        let id = self.resolve(address)?;
        self.drain()?;
        Ok(id)
    }

    pub fn object(&self, id: ObjectId) -> &ManagedObject {
        &self.objects[id.0]
    }

    pub fn unresolved(&self, address: u64) -> Option<UnresolvedReason> {
        self.unresolved.get(&address).copied()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn finish(self) -> GraphParts {
        GraphParts {
            objects: self.objects,
            by_address: self.by_address,
            unresolved: self.unresolved,
        }
    }

    // ==========================================================================
    // Resolution
    // ==========================================================================

    /// Map an address to its object, creating and scheduling it on first sight
    fn resolve(&mut self, address: u64) -> Result<Option<ObjectId>> {
        if address == 0 || self.unresolved.contains_key(&address) {
            return Ok(None);
        }
        if let Some(&id) = self.by_address.get(&address) {
            return Ok(Some(id));
        }

        let ty = match self.identify(address) {
            Ok(ty) => ty,
            Err(reason) => {
                trace!("Unresolved 0x{:X}: {}", address, reason);
                self.unresolved.insert(address, reason);
                return Ok(None);
            }
        };

        let (size, value, array_length) = self.measure(address, ty)?;
        let id = ObjectId(self.objects.len());
        self.objects.push(ManagedObject {
            address,
            type_index: ty.index(),
            size,
            value,
            references_from: Vec::new(),
            references_to: Vec::new(),
        });
        self.by_address.insert(address, id);
        self.pending.push(Pending { id, array_length });

        Ok(Some(id))
    }

    /// Follow object → vtable → type info → catalog entry
    fn identify(&self, address: u64) -> std::result::Result<&'a TypeDescriptor, UnresolvedReason> {
        let pointer = self.layout.pointer_size();
        let sections = self.sections;

        if sections.find(address).is_none() {
            return Err(UnresolvedReason::SectionNotFound);
        }
        let vtable = sections
            .read_pointer(address, pointer)
            .map_err(|_| UnresolvedReason::SectionNotFound)?;
        let vtable = self.layout.mask_address(vtable);

        if sections.find(vtable).is_none() {
            return Err(UnresolvedReason::VtableSectionNotFound);
        }
        let type_info = sections
            .read_pointer(vtable, pointer)
            .map_err(|_| UnresolvedReason::VtableSectionNotFound)?;

        self.types
            .type_by_address(self.layout.mask_address(type_info))
            .ok_or(UnresolvedReason::TypeNotFound)
    }

    /// Compute `(size, decoded value, array length)` for a new object
    fn measure(&self, address: u64, ty: &TypeDescriptor) -> Result<(u64, Option<String>, u64)> {
        if Some(ty.index()) == self.string_type {
            let (size, value) = self.measure_string(address);
            return Ok((size, value, 0));
        }

        if ty.is_array() {
            let length = self.read_array_length(address, ty)?;
            let element_size = self.element_size(ty);
            let size = self
                .layout
                .array_header_size()
                .saturating_add(element_size.saturating_mul(length));
            return Ok((size, None, length));
        }

        Ok((ty.size(), None, 0))
    }

    /// Strings: 4-byte length after the header, then UTF-16 units and a terminator
    fn measure_string(&self, address: u64) -> (u64, Option<String>) {
        let header = self.layout.object_header_size();
        let empty_size = header + string::LENGTH_PREFIX + string::CHAR_SIZE;

        let length = address
            .checked_add(header)
            .and_then(|at| self.sections.read_i32(at).ok())
            .filter(|&len| len >= 0)
            .map(|len| len as u64);
        let Some(length) = length else {
            debug!("String at 0x{:X} has no readable length", address);
            return (empty_size, None);
        };

        let size = header + string::LENGTH_PREFIX + (length + 1) * string::CHAR_SIZE;

        let Some(chars_at) = address.checked_add(header + string::LENGTH_PREFIX) else {
            debug!("String at 0x{:X} runs past the address space", address);
            return (size, None);
        };
        let available = self
            .sections
            .find(chars_at)
            .map_or(0, |section| section.remaining(chars_at) / string::CHAR_SIZE);

        // One extra char decides the marker, and each char may be a surrogate pair
        let wanted = (self.preview_length as u64).saturating_add(1).saturating_mul(2);
        let readable = length.min(available).min(wanted);
        let cut_short = readable < length;

        let value = self
            .sections
            .read_bytes(chars_at, (readable * string::CHAR_SIZE) as usize)
            .ok()
            .map(|mut bytes| {
                if cut_short && ends_with_high_surrogate(bytes) {
                    bytes = &bytes[..bytes.len() - string::CHAR_SIZE as usize];
                }
                let (decoded, _) = UTF_16LE.decode_without_bom_handling(bytes);
                preview(&decoded, self.preview_length, cut_short)
            });

        (size, value)
    }

    /// Element count from the bounds record, or from the size word for 1-D arrays
    fn read_array_length(&self, address: u64, ty: &TypeDescriptor) -> Result<u64> {
        let pointer = self.layout.pointer_size();
        let malformed = |message: String| Error::MalformedArray { address, message };
        let offset = |base: u64, by: u64, what: &str| {
            base.checked_add(by)
                .ok_or_else(|| malformed(format!("{} past the end of the address space", what)))
        };

        let bounds_at = offset(address, self.layout.array_bounds_offset(), "bounds pointer")?;
        let bounds_ptr = self
            .sections
            .read_pointer(bounds_at, pointer)
            .map_err(|e| malformed(format!("unreadable bounds pointer: {}", e)))?;

        if bounds_ptr == 0 {
            let size_at = offset(address, self.layout.array_size_offset(), "size word")?;
            return self
                .sections
                .read_pointer(size_at, pointer)
                .map_err(|e| malformed(format!("unreadable size word: {}", e)));
        }

        let bounds_ptr = self.layout.mask_address(bounds_ptr);
        let rank = ty.array_rank().max(1) as u64;
        let mut length = 1u64;
        for dimension in 0..rank {
            let record = offset(
                bounds_ptr,
                dimension * pointer * bounds::WORDS_PER_DIMENSION,
                "bounds record",
            )?;
            let dimension_length = self
                .sections
                .read_pointer(record, pointer)
                .map_err(|e| malformed(format!("unreadable bounds for dimension {}: {}", dimension, e)))?;
            length = length.saturating_mul(dimension_length);
        }

        Ok(length)
    }

    fn element_size(&self, array: &TypeDescriptor) -> u64 {
        match array.base_or_element().and_then(|i| self.types.get(i)) {
            Some(element) if element.is_value_type() => element.size(),
            _ => self.layout.pointer_size(),
        }
    }

    // ==========================================================================
    // Scanning
    // ==========================================================================

    fn drain(&mut self) -> Result<()> {
        while let Some(pending) = self.pending.pop() {
            self.scan_object(pending)?;
        }
        Ok(())
    }

    fn scan_object(&mut self, pending: Pending) -> Result<()> {
        let object = &self.objects[pending.id.0];
        let (address, type_index) = (object.address, object.type_index);
        if Some(type_index) == self.string_type {
            return Ok(());
        }

        let types = self.types;
        let Some(ty) = types.get(type_index) else {
            return Ok(());
        };

        let origin = Origin::Object(pending.id);
        let sections = self.sections;
        if ty.is_array() {
            self.scan_array(address, ty, pending.array_length, origin)
        } else {
            self.scan_fields(sections, address, false, ty.instance_fields(), "", origin, 0)
        }
    }

    fn scan_array(
        &mut self,
        address: u64,
        ty: &'a TypeDescriptor,
        length: u64,
        origin: Origin,
    ) -> Result<()> {
        let types = self.types;
        let sections = self.sections;
        let Some(element) = ty.base_or_element().and_then(|i| types.get(i)) else {
            debug!("Array {} at 0x{:X} has no element type", ty.name(), address);
            return Ok(());
        };

        let element_size = self.element_size(ty);
        if element_size == 0 || (element.is_value_type() && element.is_atomic()) {
            return Ok(());
        }

        let Some(data) = address.checked_add(self.layout.array_header_size()) else {
            debug!("Array {} at 0x{:X} has no room for elements", ty.name(), address);
            return Ok(());
        };
        let available = sections
            .find(data)
            .map_or(0, |section| section.remaining(data) / element_size);
        let count = length.min(available);
        if count < length {
            debug!(
                "Array {} at 0x{:X}: {} of {} elements captured",
                ty.name(),
                address,
                count,
                length
            );
        }

        for i in 0..count {
            let cursor = data + i * element_size;
            let path = format!("[{}]", i);
            if element.is_value_type() {
                self.scan_fields(sections, cursor, true, element.instance_fields(), &path, origin, 1)?;
            } else {
                self.link_pointer(sections, cursor, path, origin)?;
            }
        }

        Ok(())
    }

    /// Walk all static fields of one type, rooted at address 0
    fn scan_statics(&mut self, ty: &'a TypeDescriptor) -> Result<()> {
        let blob = StaticBlob::new(ty.static_bytes());
        self.scan_fields(&blob, 0, false, ty.static_fields(), ty.name(), Origin::Static, 0)
    }

    /// Read every field at `base`.
    ///
    /// `embedded` marks value-type storage, whose instance offsets must have
    /// the object header removed.
    #[allow(clippy::too_many_arguments)]
    fn scan_fields<'f, R: ReadMemory>(
        &mut self,
        reader: &R,
        base: u64,
        embedded: bool,
        fields: impl Iterator<Item = &'f FieldDescriptor>,
        prefix: &str,
        origin: Origin,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_VALUE_NESTING {
            warn!("Value types nested deeper than {} at {}", MAX_VALUE_NESTING, prefix);
            return Ok(());
        }

        let types = self.types;
        let header = self.layout.object_header_size();

        for field in fields {
            let Some(field_type) = types.get(field.type_index) else {
                continue;
            };

            let offset = if embedded && !field.is_static {
                match field.offset.checked_sub(header) {
                    Some(offset) => offset,
                    None => {
                        trace!("Field {} offset inside object header", field.name);
                        continue;
                    }
                }
            } else {
                field.offset
            };
            let address = base.wrapping_add(offset);
            let path = join_path(prefix, &field.name);

            if field_type.is_value_type() {
                if field_type.is_atomic() {
                    continue;
                }
                self.scan_fields(
                    reader,
                    address,
                    true,
                    field_type.instance_fields(),
                    &path,
                    origin,
                    depth + 1,
                )?;
            } else {
                self.link_pointer(reader, address, path, origin)?;
            }
        }

        Ok(())
    }

    /// Read a pointer slot and record the edge it forms
    fn link_pointer<R: ReadMemory>(
        &mut self,
        reader: &R,
        slot: u64,
        path: String,
        origin: Origin,
    ) -> Result<()> {
        let target = match reader.read_pointer(slot, self.layout.pointer_size()) {
            Ok(target) => self.layout.mask_address(target),
            Err(e) => {
                trace!("Skipping {}: {}", path, e);
                return Ok(());
            }
        };

        if target == 0 {
            if let Origin::Object(id) = origin {
                self.objects[id.0]
                    .references_to
                    .push(ReferenceTo { path, address: 0 });
            }
            return Ok(());
        }

        let Some(target_id) = self.resolve(target)? else {
            return Ok(());
        };

        let from = match origin {
            Origin::Object(id) => {
                let source = &mut self.objects[id.0];
                source.references_to.push(ReferenceTo {
                    path: path.clone(),
                    address: target,
                });
                ReferenceFrom::Object {
                    address: source.address,
                    path,
                }
            }
            Origin::Static => ReferenceFrom::Static { path },
        };
        self.objects[target_id.0].references_from.push(from);

        Ok(())
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// Truncate to `max_chars` characters, marking the cut with "...".
///
/// `cut_short` means the text is already missing its tail.
fn preview(text: &str, max_chars: usize, cut_short: bool) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None if cut_short => format!("{}...", text),
        None => text.to_string(),
    }
}

fn ends_with_high_surrogate(bytes: &[u8]) -> bool {
    match bytes {
        [.., low, high] => (0xD800..=0xDBFF).contains(&u16::from_le_bytes([*low, *high])),
        _ => false,
    }
}
