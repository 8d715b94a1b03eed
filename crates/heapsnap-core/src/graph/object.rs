use serde::Serialize;
use strum::{Display, IntoStaticStr};

/// Position of an object in its snapshot's object table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId(pub(crate) usize);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where an incoming reference comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferenceFrom {
    /// Slot `index` of the GC handle table
    GcRoot { index: usize },
    /// A static field; `path` starts with the declaring type's name
    Static { path: String },
    /// A field (or array element) of another object
    Object { address: u64, path: String },
}

impl ReferenceFrom {
    /// Address of the referencing object; 0 for statics and roots
    pub fn source_address(&self) -> u64 {
        match self {
            ReferenceFrom::Object { address, .. } => *address,
            ReferenceFrom::GcRoot { .. } | ReferenceFrom::Static { .. } => 0,
        }
    }

    pub fn is_root(&self) -> bool {
        !matches!(self, ReferenceFrom::Object { .. })
    }
}

/// An outgoing reference held in a field; `address == 0` is a null reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceTo {
    pub path: String,
    pub address: u64,
}

impl ReferenceTo {
    pub fn is_null(&self) -> bool {
        self.address == 0
    }
}

/// Why an address could not be turned into an object
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr, Display,
)]
#[repr(u8)]
pub enum UnresolvedReason {
    #[strum(serialize = "section not found")]
    SectionNotFound = 0,
    #[strum(serialize = "vtable section not found")]
    VtableSectionNotFound = 1,
    #[strum(serialize = "type not found")]
    TypeNotFound = 2,
}

impl UnresolvedReason {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// One live object of a snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ManagedObject {
    pub(crate) address: u64,
    pub(crate) type_index: usize,
    pub(crate) size: u64,
    pub(crate) value: Option<String>,
    pub(crate) references_from: Vec<ReferenceFrom>,
    pub(crate) references_to: Vec<ReferenceTo>,
}

impl ManagedObject {
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Index of the owning type in the snapshot's type catalog
    pub fn type_index(&self) -> usize {
        self.type_index
    }

    /// Total bytes occupied, including header and array/string payload
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Decoded preview for string-like objects
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn references_from(&self) -> &[ReferenceFrom] {
        &self.references_from
    }

    pub fn references_to(&self) -> &[ReferenceTo] {
        &self.references_to
    }

    pub fn is_rooted_directly(&self) -> bool {
        self.references_from.iter().any(ReferenceFrom::is_root)
    }
}
