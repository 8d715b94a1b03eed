//! Type catalog
//!
//! Parsed type metadata for one capture:
//!
//! - **Descriptors**: name, assembly, flags, sizes and field lists per type
//! - **Full field lists**: own fields plus every inherited instance field
//! - **Address lookup**: a type's identity is the address of its runtime type info

mod catalog;
mod descriptor;

pub use catalog::TypeCatalog;
pub use descriptor::{FieldDescriptor, TypeDescriptor};
