//! Capture records
//!
//! The four input records produced by an external capture tool: the VM layout,
//! the heap sections, the type descriptions and the GC handle table. A JSON
//! container is provided so captures can be stored and fed to the CLI.

#[cfg(any(test, feature = "test-support"))]
mod builder;
mod hex;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::memory::{MemorySection, VmLayout};

#[cfg(any(test, feature = "test-support"))]
pub use builder::CaptureBuilder;

/// Type index value meaning "no base / element type"
pub const NO_TYPE_INDEX: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLayout {
    pub pointer_size: u32,
    pub object_header_size: u32,
    pub array_header_size: u32,
    pub array_bounds_offset: u32,
    pub array_size_offset: u32,
    #[serde(default)]
    pub heap_format_version: u32,
}

impl RawLayout {
    pub fn to_layout(&self) -> Result<VmLayout> {
        VmLayout::new(
            self.pointer_size,
            self.object_header_size,
            self.array_header_size,
            self.array_bounds_offset,
            self.array_size_offset,
            self.heap_format_version,
        )
    }
}

impl From<&VmLayout> for RawLayout {
    fn from(layout: &VmLayout) -> Self {
        Self {
            pointer_size: layout.pointer_size() as u32,
            object_header_size: layout.object_header_size() as u32,
            array_header_size: layout.array_header_size() as u32,
            array_bounds_offset: layout.array_bounds_offset() as u32,
            array_size_offset: layout.array_size_offset() as u32,
            heap_format_version: layout.heap_format_version(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSection {
    pub start: u64,
    #[serde(with = "hex")]
    pub bytes: Vec<u8>,
}

impl From<RawSection> for MemorySection {
    fn from(raw: RawSection) -> Self {
        MemorySection::new(raw.start, raw.bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    pub name: String,
    pub offset: i32,
    pub type_index: i32,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawType {
    pub name: String,
    #[serde(default)]
    pub assembly: String,
    pub type_info_address: u64,
    #[serde(default = "no_type_index")]
    pub base_or_element_type_index: i32,
    /// See [`crate::memory::layout::type_flags`]
    #[serde(default)]
    pub flags: u32,
    pub size: i32,
    #[serde(default)]
    pub fields: Vec<RawField>,
    #[serde(default, with = "hex")]
    pub static_bytes: Vec<u8>,
}

fn no_type_index() -> i32 {
    NO_TYPE_INDEX
}

/// One complete heap capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCapture {
    pub layout: RawLayout,
    pub sections: Vec<RawSection>,
    pub types: Vec<RawType>,
    #[serde(default)]
    pub gc_handles: Vec<u64>,
}

/// Load a capture from a JSON file
pub fn load_capture<P: AsRef<Path>>(path: P) -> Result<RawCapture> {
    let content = fs::read_to_string(&path)?;
    let capture: RawCapture = serde_json::from_str(&content)?;
    info!(
        "Loaded capture {}: {} sections, {} types, {} GC handles",
        path.as_ref().display(),
        capture.sections.len(),
        capture.types.len(),
        capture.gc_handles.len()
    );
    Ok(capture)
}

/// Save a capture to a JSON file
pub fn save_capture<P: AsRef<Path>>(path: P, capture: &RawCapture) -> Result<()> {
    let content = serde_json::to_string_pretty(capture)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_capture_file_roundtrip() {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let node = builder.add_class("Node", "Game", None);
        builder.add_field(node, "next", node);
        let a = builder.alloc_object(node);
        builder.add_root(a);
        let capture = builder.build();

        let temp_file = NamedTempFile::new().unwrap();
        save_capture(temp_file.path(), &capture).unwrap();
        let loaded = load_capture(temp_file.path()).unwrap();

        assert_eq!(loaded, capture);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let json = r#"{
            "layout": {
                "pointer_size": 8,
                "object_header_size": 16,
                "array_header_size": 32,
                "array_bounds_offset": 16,
                "array_size_offset": 24
            },
            "sections": [{ "start": 4096, "bytes": "00ff10" }],
            "types": [{ "name": "Empty", "type_info_address": 256, "size": 16 }]
        }"#;

        let capture: RawCapture = serde_json::from_str(json).unwrap();
        assert_eq!(capture.layout.heap_format_version, 0);
        assert_eq!(capture.sections[0].bytes, vec![0x00, 0xFF, 0x10]);
        assert_eq!(capture.types[0].base_or_element_type_index, NO_TYPE_INDEX);
        assert!(capture.types[0].static_bytes.is_empty());
        assert!(capture.gc_handles.is_empty());
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let err = load_capture("does-not-exist.json").unwrap_err();
        assert!(err.is_not_found());
    }
}
