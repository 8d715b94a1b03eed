use std::collections::HashMap;

use tracing::{debug, warn};

use super::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::capture::RawType;
use crate::error::{Error, Result};
use crate::memory::VmLayout;
use crate::memory::layout::type_flags;

/// All types of one capture, indexed by position and by type-info address
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: Vec<TypeDescriptor>,
    by_address: HashMap<u64, usize>,
}

impl TypeCatalog {
    /// Parse every type once in index order, then flatten inherited fields.
    ///
    /// Field or base indices pointing outside the type list are rejected, as
    /// are value types that embed themselves by value.
    pub fn new(raw_types: Vec<RawType>, layout: &VmLayout) -> Result<Self> {
        let count = raw_types.len();
        let mut types = Vec::with_capacity(count);
        let mut by_address = HashMap::with_capacity(count);

        for (index, raw) in raw_types.into_iter().enumerate() {
            let descriptor = parse_type(index, raw, count, layout)?;
            if let Some(previous) = by_address.insert(descriptor.type_info_address, index) {
                warn!(
                    "Types {} and {} share type-info address 0x{:X}, keeping {}",
                    previous, index, descriptor.type_info_address, previous
                );
                by_address.insert(descriptor.type_info_address, previous);
            }
            types.push(descriptor);
        }
        reject_embedding_cycles(&types)?;

        let mut catalog = Self { types, by_address };
        catalog.build_full_fields();

        debug!("Parsed {} types", catalog.types.len());
        Ok(catalog)
    }

    /// Append each ancestor's instance fields to every reference type.
    ///
    /// The walk stops at value-type or array ancestors (they cannot act as base
    /// classes), at the end of the chain, or when an index repeats.
    fn build_full_fields(&mut self) {
        for index in 0..self.types.len() {
            let ty = &self.types[index];
            if ty.is_array || ty.is_value_type {
                continue;
            }

            let mut full = ty.fields.clone();
            let mut visited = vec![index];
            let mut current = ty.base_or_element;

            while let Some(base_index) = current {
                if visited.contains(&base_index) {
                    warn!(
                        "Inheritance cycle through {} while flattening {}",
                        self.types[base_index].name, self.types[index].name
                    );
                    break;
                }
                visited.push(base_index);

                let base = &self.types[base_index];
                if base.is_value_type || base.is_array {
                    break;
                }
                full.extend(base.fields.iter().filter(|f| !f.is_static).cloned());
                current = base.base_or_element;
            }

            self.types[index].full_fields = full;
        }
    }

    pub fn get(&self, index: usize) -> Option<&TypeDescriptor> {
        self.types.get(index)
    }

    /// Resolve a type from the address of its runtime type info
    pub fn type_by_address(&self, address: u64) -> Option<&TypeDescriptor> {
        self.by_address.get(&address).map(|&index| &self.types[index])
    }

    /// First type with the given full name
    pub fn find_by_name(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|ty| ty.name == name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.iter()
    }
}

fn parse_type(index: usize, raw: RawType, count: usize, layout: &VmLayout) -> Result<TypeDescriptor> {
    let check_index = |value: i32, what: &str| -> Result<usize> {
        usize::try_from(value)
            .ok()
            .filter(|&i| i < count)
            .ok_or_else(|| {
                Error::InvalidCapture(format!(
                    "Type {} ({}): {} index {} out of range",
                    index, raw.name, what, value
                ))
            })
    };

    let base_or_element = if raw.base_or_element_type_index < 0 {
        None
    } else {
        Some(check_index(raw.base_or_element_type_index, "base/element")?)
    };

    let mut fields = Vec::with_capacity(raw.fields.len());
    for field in &raw.fields {
        let offset = u64::try_from(field.offset).map_err(|_| {
            Error::InvalidCapture(format!(
                "Type {} ({}): field {} has negative offset {}",
                index, raw.name, field.name, field.offset
            ))
        })?;
        fields.push(FieldDescriptor {
            owner: index,
            name: field.name.clone(),
            offset,
            type_index: check_index(field.type_index, "field type")?,
            is_static: field.is_static,
        });
    }

    let is_value_type = raw.flags & type_flags::VALUE_TYPE != 0;
    let is_array = raw.flags & type_flags::ARRAY != 0;
    let array_rank = (raw.flags & type_flags::ARRAY_RANK_MASK) >> type_flags::ARRAY_RANK_SHIFT;

    let mut instance_fields = fields.iter().filter(|f| !f.is_static);
    let is_atomic = is_value_type
        && match (instance_fields.next(), instance_fields.next()) {
            (Some(only), None) => only.type_index == index,
            _ => false,
        };

    // Value types and arrays never inherit fields
    let full_fields = fields.clone();

    Ok(TypeDescriptor {
        index,
        type_info_address: layout.mask_address(raw.type_info_address),
        name: raw.name,
        assembly: raw.assembly,
        base_or_element,
        is_value_type,
        is_array,
        is_atomic,
        array_rank,
        size: u64::try_from(raw.size).unwrap_or(0),
        fields,
        full_fields,
        static_bytes: raw.static_bytes,
    })
}

/// A non-atomic value type stores its instance fields inline, so a chain of
/// such fields leading back to the same type has no finite layout.
fn reject_embedding_cycles(types: &[TypeDescriptor]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Unvisited,
        OnChain,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; types.len()];
    for start in 0..types.len() {
        if marks[start] != Mark::Unvisited || !is_inline(&types[start]) {
            continue;
        }

        // (type, next field to follow)
        let mut chain = vec![(start, 0usize)];
        marks[start] = Mark::OnChain;
        while let Some((node, next)) = chain.last_mut() {
            let node = *node;
            let Some(child) = embedded_types(types, node).nth(*next) else {
                marks[node] = Mark::Done;
                chain.pop();
                continue;
            };
            *next += 1;

            match marks[child] {
                Mark::OnChain => {
                    return Err(Error::InvalidCapture(format!(
                        "Value type {} ({}) embeds itself through {}",
                        child, types[child].name, types[node].name
                    )));
                }
                Mark::Unvisited => {
                    marks[child] = Mark::OnChain;
                    chain.push((child, 0));
                }
                Mark::Done => {}
            }
        }
    }

    Ok(())
}

fn is_inline(ty: &TypeDescriptor) -> bool {
    ty.is_value_type && !ty.is_atomic
}

/// Non-atomic value types stored inline in instances of `types[index]`
fn embedded_types(types: &[TypeDescriptor], index: usize) -> impl Iterator<Item = usize> + '_ {
    types[index]
        .fields
        .iter()
        .filter(|f| !f.is_static)
        .map(|f| f.type_index)
        .filter(move |&t| is_inline(&types[t]))
}
