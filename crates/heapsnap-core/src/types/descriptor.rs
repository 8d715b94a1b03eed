use serde::Serialize;

/// One field of a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Index of the type that declares the field
    pub owner: usize,
    pub name: String,
    /// Instance fields: offset within a boxed instance (includes the object header).
    /// Static fields: offset within the owner's static blob.
    pub offset: u64,
    /// Declared type of the field
    pub type_index: usize,
    pub is_static: bool,
}

/// Parsed metadata of one managed type
#[derive(Debug, Clone, Serialize)]
pub struct TypeDescriptor {
    pub(super) index: usize,
    pub(super) type_info_address: u64,
    pub(super) name: String,
    pub(super) assembly: String,
    pub(super) base_or_element: Option<usize>,
    pub(super) is_value_type: bool,
    pub(super) is_array: bool,
    pub(super) is_atomic: bool,
    pub(super) array_rank: u32,
    pub(super) size: u64,
    pub(super) fields: Vec<FieldDescriptor>,
    pub(super) full_fields: Vec<FieldDescriptor>,
    #[serde(skip)]
    pub(super) static_bytes: Vec<u8>,
}

impl TypeDescriptor {
    /// Position of the type in the capture's type list
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn type_info_address(&self) -> u64 {
        self.type_info_address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    /// Element type for arrays, base type otherwise
    pub fn base_or_element(&self) -> Option<usize> {
        self.base_or_element
    }

    pub fn is_value_type(&self) -> bool {
        self.is_value_type
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    /// A value type wrapping a primitive: nothing inside it can hold a reference
    pub fn is_atomic(&self) -> bool {
        self.is_atomic
    }

    pub fn array_rank(&self) -> u32 {
        self.array_rank
    }

    /// Boxed instance size for classes, unboxed size for value types,
    /// element size for arrays
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Fields declared by this type, static and instance
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Own fields followed by all inherited instance fields
    pub fn full_fields(&self) -> &[FieldDescriptor] {
        &self.full_fields
    }

    /// Instance fields of the full field list
    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.full_fields.iter().filter(|f| !f.is_static)
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_static)
    }

    pub fn static_bytes(&self) -> &[u8] {
        &self.static_bytes
    }
}
