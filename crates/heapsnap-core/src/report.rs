//! Serializable views for presentation layers
//!
//! - **ObjectInfo**: one object with its type name, size, preview and edges
//! - **DiffReport**: added/removed objects and per-type deltas of a diff
//! - **SummaryReport**: per-type totals of one snapshot

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::diff::{DiffResult, TypeDelta};
use crate::error::Result;
use crate::graph::{ManagedObject, ReferenceFrom, ReferenceTo};
use crate::snapshot::{Snapshot, TypeSummary};

/// Everything a viewer needs to display and traverse one object
#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub address: String,
    pub type_name: String,
    pub assembly: String,
    pub size: u64,
    pub value: Option<String>,
    pub references_from: Vec<ReferenceFrom>,
    pub references_to: Vec<ReferenceTo>,
}

impl ObjectInfo {
    pub fn new(snapshot: &Snapshot, object: &ManagedObject) -> Self {
        let assembly = snapshot
            .type_of(object)
            .map(|ty| ty.assembly().to_string())
            .unwrap_or_default();

        Self {
            address: format_address(object.address()),
            type_name: snapshot.type_name(object).to_string(),
            assembly,
            size: object.size(),
            value: object.value().map(str::to_string),
            references_from: object.references_from().to_vec(),
            references_to: object.references_to().to_vec(),
        }
    }

    /// Look up an address, `None` if it is not an object of `snapshot`
    pub fn from_address(snapshot: &Snapshot, address: u64) -> Option<Self> {
        snapshot.object(address).map(|object| Self::new(snapshot, object))
    }
}

/// Compact object row for diff listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectRow {
    pub address: String,
    pub type_name: String,
    pub size: u64,
    pub value: Option<String>,
}

impl ObjectRow {
    fn new(snapshot: &Snapshot, object: &ManagedObject) -> Self {
        Self {
            address: format_address(object.address()),
            type_name: snapshot.type_name(object).to_string(),
            size: object.size(),
            value: object.value().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub added_count: usize,
    pub removed_count: usize,
    pub added_bytes: u64,
    pub removed_bytes: u64,
    pub deltas: Vec<TypeDelta>,
    pub added: Vec<ObjectRow>,
    pub removed: Vec<ObjectRow>,
}

impl DiffReport {
    pub fn new(diff: &DiffResult<'_>) -> Self {
        let added: Vec<ObjectRow> = diff
            .added()
            .map(|object| ObjectRow::new(diff.after(), object))
            .collect();
        let removed: Vec<ObjectRow> = diff
            .removed()
            .map(|object| ObjectRow::new(diff.before(), object))
            .collect();

        Self {
            added_count: added.len(),
            removed_count: removed.len(),
            added_bytes: added.iter().map(|row| row.size).sum(),
            removed_bytes: removed.iter().map(|row| row.size).sum(),
            deltas: diff.deltas().to_vec(),
            added,
            removed,
        }
    }

    /// Save report to JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub object_count: usize,
    pub total_bytes: u64,
    pub type_count: usize,
    pub section_count: usize,
    pub section_bytes: u64,
    pub unresolved_count: usize,
    pub types: Vec<TypeSummary>,
}

impl SummaryReport {
    pub fn new(snapshot: &Snapshot) -> Self {
        Self {
            object_count: snapshot.len(),
            total_bytes: snapshot.total_size(),
            type_count: snapshot.types().len(),
            section_count: snapshot.sections().len(),
            section_bytes: snapshot.sections().total_bytes(),
            unresolved_count: snapshot.unresolved_count(),
            types: snapshot.type_summary(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn format_address(address: u64) -> String {
    format!("0x{:X}", address)
}

/// Human-readable byte count (B, KB, MB, GB; base 1024)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureBuilder;
    use crate::config::AnalyzerConfig;
    use crate::diff::compare;
    use crate::memory::VmLayout;
    use tempfile::NamedTempFile;

    fn string_snapshot(texts: &[&str]) -> Snapshot {
        let mut builder = CaptureBuilder::new(VmLayout::mono_64());
        let string = builder.add_string_type("System.String");
        for text in texts {
            let s = builder.alloc_string(string, text);
            builder.add_root(s);
        }
        Snapshot::build(builder.build(), &AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_object_info() {
        let snapshot = string_snapshot(&["AB"]);
        let address = snapshot.gc_handles()[0];
        let info = ObjectInfo::from_address(&snapshot, address).unwrap();

        assert_eq!(info.type_name, "System.String");
        assert_eq!(info.assembly, "mscorlib");
        assert_eq!(info.size, 26);
        assert_eq!(info.value.as_deref(), Some("AB"));
        assert_eq!(info.references_from, vec![ReferenceFrom::GcRoot { index: 0 }]);
        assert!(ObjectInfo::from_address(&snapshot, 0xDEAD).is_none());
    }

    #[test]
    fn test_diff_report_save() {
        let before = string_snapshot(&["old"]);
        let after = string_snapshot(&["new", "newer"]);
        // Same builder layout: "new" lands on the address "old" had
        let diff = compare(&before, &after, None);
        let report = DiffReport::new(&diff);

        assert_eq!(report.added_count, 1);
        assert_eq!(report.removed_count, 0);
        assert_eq!(report.added[0].value.as_deref(), Some("newer"));

        let file = NamedTempFile::new().unwrap();
        report.save(file.path()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(json["added_count"], 1);
        assert_eq!(json["deltas"][0]["type_name"], "System.String");
        assert_eq!(json["deltas"][0]["delta"], 1);
    }

    #[test]
    fn test_summary_report() {
        let snapshot = string_snapshot(&["a", "b"]);
        let report = SummaryReport::new(&snapshot);
        assert_eq!(report.object_count, 2);
        assert_eq!(report.types.len(), 1);
        assert_eq!(report.unresolved_count, 0);
        assert_eq!(report.section_count, 2);
    }
}
