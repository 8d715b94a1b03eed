//! # heapsnap-core
//!
//! Core library for analyzing managed-heap snapshots.
//!
//! This crate provides:
//! - Capture records and a JSON container for them
//! - Heap section indexing and little-endian memory reads
//! - Type catalog with inheritance-flattened field lists
//! - Object graph reconstruction from GC roots and static fields
//! - Snapshot diffing with value-based pairing of reallocated objects
//!
//! ## Feature Flags
//!
//! - `test-support`: Enables `CaptureBuilder` for assembling synthetic captures.
//!   Meant for tests and demos, not for decoding real captures.
//!
//! ## Example
//!
//! ```ignore
//! use heapsnap_core::{AnalyzerConfig, Snapshot, compare, load_capture};
//!
//! let config = AnalyzerConfig::default();
//! let before = Snapshot::build(load_capture("before.json")?, &config)?;
//! let after = Snapshot::build(load_capture("after.json")?, &config)?;
//!
//! let diff = compare(&before, &after, None);
//! for delta in diff.deltas() {
//!     println!("{:+} {}", delta.delta, delta.type_name);
//! }
//! ```

pub mod capture;
pub mod config;
pub mod diff;
pub mod error;
pub mod graph;
pub mod memory;
pub mod report;
pub mod snapshot;
pub mod types;

#[cfg(any(test, feature = "test-support"))]
pub use capture::CaptureBuilder;
pub use capture::{
    RawCapture, RawField, RawLayout, RawSection, RawType, load_capture, save_capture,
};
pub use config::AnalyzerConfig;
pub use diff::{AssemblyFilter, DiffResult, TypeDelta, TypeFilter, compare};
pub use error::{Error, Result};
pub use graph::{
    GraphBuilder, ManagedObject, ObjectId, ReferenceFrom, ReferenceTo, UnresolvedReason,
};
pub use memory::{MemorySection, ReadMemory, SectionIndex, StaticBlob, VmLayout};
pub use report::{DiffReport, ObjectInfo, SummaryReport, format_address, format_size};
pub use snapshot::{PathStep, Snapshot, TypeSummary};
pub use types::{FieldDescriptor, TypeCatalog, TypeDescriptor};
