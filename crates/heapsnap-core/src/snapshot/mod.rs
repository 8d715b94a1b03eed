//! Snapshot aggregate
//!
//! A [`Snapshot`] owns everything decoded from one capture: the layout, the
//! section index, the type catalog and the object graph. It is built once and
//! read-only afterwards, so a built snapshot can be shared across threads.

mod path;
mod summary;

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

use tracing::info;

use crate::capture::RawCapture;
use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::graph::{GraphBuilder, ManagedObject, ObjectId, UnresolvedReason};
use crate::memory::{MemorySection, SectionIndex, VmLayout};
use crate::types::{TypeCatalog, TypeDescriptor};

pub use path::PathStep;
pub use summary::TypeSummary;

#[derive(Debug)]
pub struct Snapshot {
    layout: VmLayout,
    sections: SectionIndex,
    types: TypeCatalog,
    gc_handles: Vec<u64>,
    objects: Vec<ManagedObject>,
    by_address: HashMap<u64, ObjectId>,
    unresolved: HashMap<u64, UnresolvedReason>,
}

impl Snapshot {
    /// Decode a capture and walk its object graph
    pub fn build(capture: RawCapture, config: &AnalyzerConfig) -> Result<Self> {
        Self::build_inner(capture, config, None)
    }

    /// Like [`build`](Self::build), aborting with `Error::Cancelled` once
    /// `cancel` is set (checked between top-level roots)
    pub fn build_with_cancel(
        capture: RawCapture,
        config: &AnalyzerConfig,
        cancel: &AtomicBool,
    ) -> Result<Self> {
        Self::build_inner(capture, config, Some(cancel))
    }

    fn build_inner(
        capture: RawCapture,
        config: &AnalyzerConfig,
        cancel: Option<&AtomicBool>,
    ) -> Result<Self> {
        let layout = capture.layout.to_layout()?;
        let sections = SectionIndex::new(
            capture.sections.into_iter().map(MemorySection::from).collect(),
            &layout,
        )?;
        let types = TypeCatalog::new(capture.types, &layout)?;
        let gc_handles = capture.gc_handles;

        let parts = GraphBuilder::new(&layout, &sections, &types, config).build(&gc_handles, cancel)?;

        info!(
            "Snapshot built: {} objects, {} types, {} unresolved addresses",
            parts.objects.len(),
            types.len(),
            parts.unresolved.len()
        );

        Ok(Self {
            layout,
            sections,
            types,
            gc_handles,
            objects: parts.objects,
            by_address: parts.by_address,
            unresolved: parts.unresolved,
        })
    }

    /// Object starting at `address`
    pub fn object(&self, address: u64) -> Option<&ManagedObject> {
        self.object_id(address).map(|id| &self.objects[id.0])
    }

    pub fn object_id(&self, address: u64) -> Option<ObjectId> {
        self.by_address.get(&address).copied()
    }

    pub fn object_by_id(&self, id: ObjectId) -> Option<&ManagedObject> {
        self.objects.get(id.0)
    }

    /// Object behind an id handed out by this snapshot
    pub(crate) fn get(&self, id: ObjectId) -> &ManagedObject {
        &self.objects[id.0]
    }

    pub fn contains(&self, address: u64) -> bool {
        self.by_address.contains_key(&address)
    }

    /// All objects in discovery order
    pub fn objects(&self) -> impl Iterator<Item = &ManagedObject> {
        self.objects.iter()
    }

    pub fn object_ids(&self) -> impl Iterator<Item = ObjectId> + use<> {
        (0..self.objects.len()).map(ObjectId)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.objects.iter().map(|o| o.size).sum()
    }

    /// Why `address` was not resolved, if it was reached and failed
    pub fn unresolved(&self, address: u64) -> Option<UnresolvedReason> {
        self.unresolved.get(&address).copied()
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    /// Unresolved addresses, sorted
    pub fn unresolved_addresses(&self) -> Vec<(u64, UnresolvedReason)> {
        let mut entries: Vec<_> = self.unresolved.iter().map(|(&a, &r)| (a, r)).collect();
        entries.sort_unstable_by_key(|&(address, _)| address);
        entries
    }

    pub fn layout(&self) -> &VmLayout {
        &self.layout
    }

    pub fn sections(&self) -> &SectionIndex {
        &self.sections
    }

    pub fn types(&self) -> &TypeCatalog {
        &self.types
    }

    pub fn gc_handles(&self) -> &[u64] {
        &self.gc_handles
    }

    /// Type of an object belonging to this snapshot
    pub fn type_of(&self, object: &ManagedObject) -> Option<&TypeDescriptor> {
        self.types.get(object.type_index)
    }

    pub fn type_name(&self, object: &ManagedObject) -> &str {
        self.type_of(object).map_or("<unknown>", |ty| ty.name())
    }
}
