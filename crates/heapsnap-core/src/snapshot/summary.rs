use std::collections::HashMap;

use serde::Serialize;

use super::Snapshot;

/// Object count and byte total for one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub type_index: usize,
    pub type_name: String,
    pub assembly: String,
    pub count: usize,
    pub total_size: u64,
}

impl Snapshot {
    /// Per-type totals, largest byte total first
    pub fn type_summary(&self) -> Vec<TypeSummary> {
        let mut totals: HashMap<usize, (usize, u64)> = HashMap::new();
        for object in &self.objects {
            let entry = totals.entry(object.type_index).or_default();
            entry.0 += 1;
            entry.1 += object.size;
        }

        let mut rows: Vec<TypeSummary> = totals
            .into_iter()
            .filter_map(|(type_index, (count, total_size))| {
                let ty = self.types.get(type_index)?;
                Some(TypeSummary {
                    type_index,
                    type_name: ty.name().to_string(),
                    assembly: ty.assembly().to_string(),
                    count,
                    total_size,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_size
                .cmp(&a.total_size)
                .then_with(|| a.type_name.cmp(&b.type_name))
        });
        rows
    }
}
